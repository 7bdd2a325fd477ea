// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Procedural macros for `ispawn`: `spawn!` turns an inline closure into a call that runs in a
//! freshly provisioned worker process, and `#[derive(Transferable)]` threads move-only resource
//! handles through a captured struct.

mod callsite;
mod expand;
mod transferable;

use proc_macro::TokenStream;

/// `spawn!(move || { ... })` — see the crate root of `ispawn` for user-facing docs.
#[proc_macro]
pub fn spawn(input: TokenStream) -> TokenStream {
    expand::expand_spawn(input.into())
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// `#[derive(Transferable)]` — concatenates every field's `Transferable::take()` output.
#[proc_macro_derive(Transferable)]
pub fn derive_transferable(input: TokenStream) -> TokenStream {
    let item = syn::parse_macro_input!(input as syn::DeriveInput);
    transferable::expand_derive(&item)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
