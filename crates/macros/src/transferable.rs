// SPDX-License-Identifier: MIT

//! `#[derive(Transferable)]` (spec.md §4.K): concatenate every field's handed-off file
//! descriptors so a captured struct containing a `TransferFile`/`TransferSocket` anywhere
//! inside it can be drained with a single `.take()` call.

use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields};

pub fn expand_derive(input: &DeriveInput) -> syn::Result<TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => &data.fields,
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                "Transferable can only be derived for structs",
            ))
        }
    };

    let (take_accesses, restore_accesses): (Vec<TokenStream>, Vec<TokenStream>) = match fields {
        Fields::Named(named) => named
            .named
            .iter()
            .filter_map(|f| f.ident.as_ref())
            .map(|ident| {
                (
                    quote!(::ispawn_runtime::transfer::Transferable::take(&mut self.#ident)),
                    quote!(::ispawn_runtime::transfer::Transferable::restore(&mut self.#ident, __fds);),
                )
            })
            .unzip(),
        Fields::Unnamed(unnamed) => (0..unnamed.unnamed.len())
            .map(|i| {
                let index = syn::Index::from(i);
                (
                    quote!(::ispawn_runtime::transfer::Transferable::take(&mut self.#index)),
                    quote!(::ispawn_runtime::transfer::Transferable::restore(&mut self.#index, __fds);),
                )
            })
            .unzip(),
        Fields::Unit => (Vec::new(), Vec::new()),
    };

    Ok(quote! {
        impl #impl_generics ::ispawn_runtime::transfer::Transferable for #name #ty_generics #where_clause {
            fn take(&mut self) -> ::std::vec::Vec<::std::os::fd::OwnedFd> {
                let mut __fds = ::std::vec::Vec::new();
                #( __fds.extend(#take_accesses); )*
                __fds
            }

            fn restore(&mut self, __fds: &mut ::std::vec::IntoIter<::std::os::fd::OwnedFd>) {
                #( #restore_accesses )*
            }
        }
    })
}

#[cfg(test)]
#[path = "transferable_tests.rs"]
mod tests;
