#![deny(unused_variables)]

use std::sync::Arc;

use fxwire::prelude::*;

#[derive(Default, Injectable)]
pub struct Unit;

#[derive(Default, Injectable)]
pub struct Values {
    #[inject]
    pub count: i64,
    #[inject]
    pub ratio: f32,
    #[inject]
    pub enabled: bool,
    #[inject]
    pub initial: char,
    #[inject]
    pub name: String,
    #[inject]
    pub label: &'static str,
    pub untouched: Vec<u8>,
}

#[derive(Default, Injectable)]
pub struct Services {
    #[inject]
    pub unit: Option<Arc<Unit>>,
    #[inject(parent)]
    pub values: Values,
}

#[derive(Injectable)]
#[injectable(no_default)]
pub struct External {
    #[inject]
    pub r#type: String,
}

fn main() {
    let services = Services::default();
    assert_eq!(services.declared_fields().len(), 1);
    assert_eq!(services.superclass().map(|base| base.declared_fields().len()), Some(7));
    assert!(!External::descriptor().has_constructor());
    assert_eq!(External::descriptor().short_name(), "External");
}
