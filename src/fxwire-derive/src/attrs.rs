use syn::spanned::Spanned;
use syn::{Attribute, Error as SynError, Meta, Result as SynResult};

#[derive(Debug, Default)]
pub struct ContainerOptions {
    pub lifecycle: bool,
    pub no_default: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRole {
    Plain,
    Inject,
    Parent,
}

pub fn parse_container_attributes(attrs: &[Attribute]) -> SynResult<ContainerOptions> {
    let mut options = ContainerOptions::default();

    for attr in attrs.iter().filter(|attr| attr.path().is_ident("injectable")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("lifecycle") {
                options.lifecycle = true;
                Ok(())
            } else if meta.path.is_ident("no_default") {
                options.no_default = true;
                Ok(())
            } else {
                Err(meta.error("expects `#[injectable(lifecycle)]` or `#[injectable(no_default)]`"))
            }
        })?;
    }

    Ok(options)
}

pub fn parse_field_attributes(attrs: &[Attribute]) -> SynResult<FieldRole> {
    let mut role = FieldRole::Plain;

    for attr in attrs.iter().filter(|attr| attr.path().is_ident("inject")) {
        if role != FieldRole::Plain {
            return Err(SynError::new(
                attr.span(),
                "only one `#[inject]` attribute is allowed on a field",
            ));
        }

        role = match &attr.meta {
            Meta::Path(_) => FieldRole::Inject,
            Meta::List(_) => {
                let mut parent = false;
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("parent") {
                        parent = true;
                        Ok(())
                    } else {
                        Err(meta.error("expects `#[inject]` or `#[inject(parent)]`"))
                    }
                })?;
                if parent {
                    FieldRole::Parent
                } else {
                    FieldRole::Inject
                }
            }
            Meta::NameValue(nv) => {
                return Err(SynError::new(
                    nv.span(),
                    "expects `#[inject]` or `#[inject(parent)]`",
                ))
            }
        };
    }

    Ok(role)
}
