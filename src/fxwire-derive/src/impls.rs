use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::ext::IdentExt;
use syn::spanned::Spanned;
use syn::visit_mut::{self, VisitMut};
use syn::{
    Attribute, Error as SynError, FnArg, Ident, ImplItem, ImplItemFn, ItemImpl, LitStr,
    Result as SynResult, Type, TypePath,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MarkerData {
    PostConstruct,
    PreDestroy,
}

impl MarkerData {
    fn from_attribute(attr: &Attribute) -> Option<Self> {
        if attr.path().is_ident("post_construct") {
            Some(Self::PostConstruct)
        } else if attr.path().is_ident("pre_destroy") {
            Some(Self::PreDestroy)
        } else {
            None
        }
    }

    fn expand(self) -> TokenStream2 {
        match self {
            Self::PostConstruct => quote! { fxwire::probe::Marker::PostConstruct },
            Self::PreDestroy => quote! { fxwire::probe::Marker::PreDestroy },
        }
    }
}

#[derive(Debug)]
struct MethodData {
    identifier: Ident,
    name: LitStr,
    markers: Vec<MarkerData>,
    mutable: bool,
}

struct AttributeRemovalVisitor;

impl AttributeRemovalVisitor {
    fn is_custom_attribute(attr: &Attribute) -> bool {
        MarkerData::from_attribute(attr).is_some()
    }
}

impl VisitMut for AttributeRemovalVisitor {
    fn visit_attributes_mut(&mut self, attrs: &mut Vec<Attribute>) {
        attrs.retain(|attr| !Self::is_custom_attribute(attr));
        attrs
            .iter_mut()
            .for_each(|attr| visit_mut::visit_attribute_mut(self, attr));
    }
}

pub fn expand_lifecycle(impls: TokenStream) -> SynResult<TokenStream2> {
    let mut impls = match syn::parse::<ItemImpl>(impls) {
        Ok(impls) => impls,
        Err(err) => {
            return Err(SynError::new(
                err.span(),
                "`#[lifecycle]` should be annotated on the `impl` block",
            ))
        }
    };

    if let Some((_, path, _)) = &impls.trait_ {
        return Err(SynError::new(
            path.span(),
            "`#[lifecycle]` should be annotated on an inherent `impl` block",
        ));
    }
    if !impls.generics.params.is_empty() {
        return Err(SynError::new(
            impls.generics.span(),
            "`#[lifecycle]` doesn't support generic types",
        ));
    }

    let self_type = get_self_type(&impls)?;
    let methods = impls
        .items
        .iter()
        .filter_map(filter_and_map_item_fn)
        .filter_map(|item_fn| parse_method(item_fn).transpose())
        .collect::<SynResult<Vec<_>>>()?;

    let expanded = expand_lifecycle_implementation(&self_type, &methods);

    let mut visitor = AttributeRemovalVisitor;
    visitor.visit_item_impl_mut(&mut impls);

    Ok(quote! {
        #impls
        #expanded
    })
}

fn get_self_type(impls: &ItemImpl) -> SynResult<TypePath> {
    if let Type::Path(ty) = impls.self_ty.as_ref() {
        Ok(ty.clone())
    } else {
        Err(SynError::new(impls.self_ty.span(), "invalid self type"))
    }
}

fn filter_and_map_item_fn(item: &ImplItem) -> Option<&ImplItemFn> {
    if let ImplItem::Fn(impl_fn) = item {
        Some(impl_fn)
    } else {
        None
    }
}

fn parse_method(item_fn: &ImplItemFn) -> SynResult<Option<MethodData>> {
    let mut markers = Vec::new();
    for marker in item_fn.attrs.iter().filter_map(MarkerData::from_attribute) {
        if !markers.contains(&marker) {
            markers.push(marker);
        }
    }
    if markers.is_empty() {
        return Ok(None);
    }

    let signature = &item_fn.sig;
    if let Some(asyncness) = &signature.asyncness {
        return Err(SynError::new(
            asyncness.span(),
            "lifecycle methods can't be `async`",
        ));
    }
    if !signature.generics.params.is_empty() {
        return Err(SynError::new(
            signature.generics.span(),
            "lifecycle methods can't be generic",
        ));
    }

    let Some(FnArg::Receiver(receiver)) = signature.inputs.first() else {
        return Err(SynError::new(
            signature.span(),
            "lifecycle methods should take `&self` or `&mut self`",
        ));
    };
    if receiver.reference.is_none() {
        return Err(SynError::new(
            receiver.span(),
            "lifecycle methods should take `&self` or `&mut self`, not `self`",
        ));
    }
    if signature.inputs.len() > 1 {
        return Err(SynError::new(
            signature.inputs.span(),
            "lifecycle methods can't take any argument besides the receiver",
        ));
    }

    let mutable = receiver.mutability.is_some();
    if mutable && markers.contains(&MarkerData::PreDestroy) {
        return Err(SynError::new(
            receiver.span(),
            "`#[pre_destroy]` methods should take `&self`",
        ));
    }

    let identifier = signature.ident.clone();
    let name = LitStr::new(&identifier.unraw().to_string(), identifier.span());

    Ok(Some(MethodData {
        identifier,
        name,
        markers,
        mutable,
    }))
}

fn expand_lifecycle_implementation(self_type: &TypePath, methods: &[MethodData]) -> TokenStream2 {
    let method_count = methods.len();

    let method_descriptors = methods.iter().map(|method| {
        let name = &method.name;
        let markers = method.markers.iter().map(|marker| marker.expand());
        quote! {
            fxwire::probe::MethodDescriptor::new(#name, &[#(#markers),*])
        }
    });

    let invoke_mut_arms = methods.iter().map(expand_invocation);

    let invoke_arms = methods.iter().map(|method| {
        if method.mutable {
            let name = &method.name;
            quote! {
                #name => std::result::Result::Err(
                    fxwire::probe::ProbeError::exclusive_access(method.name())
                ),
            }
        } else {
            expand_invocation(method)
        }
    });

    quote! {
        impl fxwire::probe::Lifecycle for #self_type {
            fn declared_methods(&self) -> &'static [fxwire::probe::MethodDescriptor] {
                static METHODS: [fxwire::probe::MethodDescriptor; #method_count] = [
                    #(#method_descriptors),*
                ];
                &METHODS
            }

            fn invoke_mut(
                &mut self,
                method: &fxwire::probe::MethodDescriptor,
            ) -> std::result::Result<(), fxwire::probe::ProbeError> {
                match method.name() {
                    #(#invoke_mut_arms)*
                    _ => std::result::Result::Err(
                        fxwire::probe::ProbeError::no_such_method(method.name())
                    ),
                }
            }

            fn invoke(
                &self,
                method: &fxwire::probe::MethodDescriptor,
            ) -> std::result::Result<(), fxwire::probe::ProbeError> {
                match method.name() {
                    #(#invoke_arms)*
                    _ => std::result::Result::Err(
                        fxwire::probe::ProbeError::no_such_method(method.name())
                    ),
                }
            }
        }
    }
}

fn expand_invocation(method: &MethodData) -> TokenStream2 {
    let name = &method.name;
    let identifier = &method.identifier;
    quote! {
        #name => fxwire::probe::LifecycleOutcome::into_outcome(self.#identifier())
            .map_err(|source| fxwire::probe::ProbeError::invocation(method.name(), source)),
    }
}
