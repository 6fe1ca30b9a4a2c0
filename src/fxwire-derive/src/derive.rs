use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::ext::IdentExt;
use syn::spanned::Spanned;
use syn::{Data, DeriveInput, Error as SynError, Field, Fields, Ident, LitStr, Result as SynResult, Type};

use crate::attrs::{self, ContainerOptions, FieldRole};

#[derive(Debug)]
struct FieldData {
    ident: Ident,
    name: LitStr,
    ty: Type,
    role: FieldRole,
}

pub fn expand_injectable(input: DeriveInput) -> SynResult<TokenStream2> {
    if !input.generics.params.is_empty() {
        return Err(SynError::new(
            input.generics.span(),
            "`#[derive(Injectable)]` doesn't support generic types",
        ));
    }

    let Data::Struct(data) = &input.data else {
        return Err(SynError::new(
            input.ident.span(),
            "`#[derive(Injectable)]` only supports structs",
        ));
    };

    let fields = match &data.fields {
        Fields::Named(fields) => fields
            .named
            .iter()
            .map(parse_field)
            .collect::<SynResult<Vec<_>>>()?,
        Fields::Unit => Vec::new(),
        Fields::Unnamed(fields) => {
            return Err(SynError::new(
                fields.span(),
                "`#[derive(Injectable)]` only supports structs with named fields",
            ))
        }
    };

    let options = attrs::parse_container_attributes(&input.attrs)?;
    let parent = find_parent(&fields)?;

    let typed_impl = expand_typed_injectable(&input.ident, &options);
    let injectable_impl = expand_injectable_impl(&input.ident, &fields, parent);
    let lifecycle_impl = if options.lifecycle {
        quote! {}
    } else {
        let ident = &input.ident;
        quote! { impl fxwire::probe::Lifecycle for #ident {} }
    };

    Ok(quote! {
        #typed_impl
        #injectable_impl
        #lifecycle_impl
    })
}

fn parse_field(field: &Field) -> SynResult<FieldData> {
    let Some(ident) = field.ident.clone() else {
        return Err(SynError::new(field.span(), "expects a named field"));
    };
    let name = LitStr::new(&ident.unraw().to_string(), ident.span());
    let role = attrs::parse_field_attributes(&field.attrs)?;

    Ok(FieldData {
        ident,
        name,
        ty: field.ty.clone(),
        role,
    })
}

fn find_parent(fields: &[FieldData]) -> SynResult<Option<&FieldData>> {
    let mut parents = fields.iter().filter(|field| field.role == FieldRole::Parent);
    let parent = parents.next();

    if let Some(duplicated) = parents.next() {
        return Err(SynError::new(
            duplicated.ident.span(),
            "only one field can be annotated with `#[inject(parent)]`",
        ));
    }
    Ok(parent)
}

fn expand_typed_injectable(ident: &Ident, options: &ContainerOptions) -> TokenStream2 {
    let name = LitStr::new(&ident.unraw().to_string(), ident.span());

    let descriptor = if options.no_default {
        quote! {
            fxwire::probe::TypeDescriptor::without_constructor(
                concat!(module_path!(), "::", #name),
                std::any::TypeId::of::<#ident>,
            )
        }
    } else {
        quote! {
            fxwire::probe::TypeDescriptor::new(
                concat!(module_path!(), "::", #name),
                std::any::TypeId::of::<#ident>,
                construct,
            )
        }
    };

    let constructor = if options.no_default {
        quote! {}
    } else {
        quote! {
            fn construct() -> std::boxed::Box<dyn fxwire::probe::Injectable> {
                std::boxed::Box::new(<#ident as std::default::Default>::default())
            }
        }
    };

    quote! {
        impl fxwire::probe::TypedInjectable for #ident {
            fn descriptor() -> &'static fxwire::probe::TypeDescriptor {
                #constructor
                static DESCRIPTOR: fxwire::probe::TypeDescriptor = #descriptor;
                &DESCRIPTOR
            }
        }
    }
}

fn expand_injectable_impl(
    ident: &Ident,
    fields: &[FieldData],
    parent: Option<&FieldData>,
) -> TokenStream2 {
    let declared: Vec<_> = fields
        .iter()
        .filter(|field| field.role != FieldRole::Parent)
        .collect();
    let field_count = declared.len();

    let field_descriptors = declared.iter().map(|field| {
        let name = &field.name;
        let ty = &field.ty;
        if field.role == FieldRole::Inject {
            quote! {
                fxwire::probe::FieldDescriptor::injectable(
                    #name,
                    <#ty as fxwire::probe::InjectTarget>::dependency,
                )
            }
        } else {
            quote! { fxwire::probe::FieldDescriptor::plain(#name) }
        }
    });

    let injected: Vec<_> = declared
        .iter()
        .filter(|field| field.role == FieldRole::Inject)
        .collect();
    let value_param = if injected.is_empty() {
        quote! { _value }
    } else {
        quote! { value }
    };

    let set_field_arms = injected
        .iter()
        .map(|field| {
            let name = &field.name;
            let member = &field.ident;
            let ty = &field.ty;
            quote! {
                #name => {
                    self.#member = <#ty as fxwire::probe::InjectTarget>::accept(value).map_err(|value| {
                        fxwire::probe::ProbeError::incompatible_value(field.name(), &*value)
                    })?;
                    std::result::Result::Ok(())
                }
            }
        });

    let superclass = parent.map(|parent| {
        let member = &parent.ident;
        quote! {
            fn superclass(&self) -> std::option::Option<&dyn fxwire::probe::Injectable> {
                std::option::Option::Some(&self.#member)
            }

            fn superclass_mut(&mut self) -> std::option::Option<&mut dyn fxwire::probe::Injectable> {
                std::option::Option::Some(&mut self.#member)
            }
        }
    });

    quote! {
        impl fxwire::probe::Injectable for #ident {
            fn dyn_descriptor(&self) -> &'static fxwire::probe::TypeDescriptor {
                <Self as fxwire::probe::TypedInjectable>::descriptor()
            }

            fn declared_fields(&self) -> &'static [fxwire::probe::FieldDescriptor] {
                static FIELDS: [fxwire::probe::FieldDescriptor; #field_count] = [
                    #(#field_descriptors),*
                ];
                &FIELDS
            }

            #superclass

            fn set_field(
                &mut self,
                field: &fxwire::probe::FieldDescriptor,
                #value_param: std::boxed::Box<dyn fxwire::container::Managed>,
            ) -> std::result::Result<(), fxwire::probe::ProbeError> {
                match field.name() {
                    #(#set_field_arms)*
                    _ => std::result::Result::Err(
                        fxwire::probe::ProbeError::field_not_injectable(field.name())
                    ),
                }
            }
        }
    }
}
