// SPDX-License-Identifier: MIT

//! Resolves the textual position of a `spawn!` invocation (spec.md §4.A).

use ispawn_core::CallSite;

/// Reads `proc_macro::Span::call_site()` and turns it into a `CallSite`.
///
/// Only callable from within an active macro expansion — `Span::call_site()` panics otherwise,
/// which is why this isn't unit-tested directly; `expand::expand_spawn` is tested by feeding it
/// a `CallSite` built by hand instead.
pub fn resolve() -> Result<CallSite, String> {
    let span = proc_macro::Span::call_site();
    let file = span
        .source_file()
        .path()
        .to_str()
        .map(str::to_owned)
        .ok_or_else(|| "call site source file path is not valid UTF-8".to_string())?;
    let start = span.start();
    Ok(CallSite::new(file, start.line as u32, start.column as u32))
}
