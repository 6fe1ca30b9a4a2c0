mod attrs;
mod derive;
mod impls;

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use syn::{DeriveInput, Error as SynError, Result as SynResult};

/// Describes a struct to the container.
///
/// Fields marked with `#[inject]` are filled by the container, and a field
/// marked with `#[inject(parent)]` is treated as the superclass. Put
/// `#[injectable(lifecycle)]` on the struct when a `#[lifecycle]` block
/// declares its callbacks, and `#[injectable(no_default)]` when the struct
/// doesn't implement `Default` and is only created by a custom instance
/// supplier.
#[proc_macro_derive(Injectable, attributes(inject, injectable))]
pub fn derive_injectable(item: TokenStream) -> TokenStream {
    match derive_injectable_impl(item) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.into_compile_error().into(),
    }
}

fn derive_injectable_impl(item: TokenStream) -> SynResult<TokenStream2> {
    let input = syn::parse::<DeriveInput>(item)?;
    derive::expand_injectable(input)
}

/// Collects the `#[post_construct]` and `#[pre_destroy]` methods of an
/// inherent `impl` block.
#[proc_macro_attribute]
pub fn lifecycle(attr: TokenStream, item: TokenStream) -> TokenStream {
    match lifecycle_impl(attr, item) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.into_compile_error().into(),
    }
}

fn lifecycle_impl(attr: TokenStream, item: TokenStream) -> SynResult<TokenStream2> {
    let attr = TokenStream2::from(attr);
    if !attr.is_empty() {
        return Err(SynError::new_spanned(
            attr,
            "`#[lifecycle]` doesn't take any argument",
        ));
    }
    impls::expand_lifecycle(item)
}
