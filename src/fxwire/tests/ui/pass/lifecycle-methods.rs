use std::error::Error;

use fxwire::prelude::*;

#[derive(Default, Injectable)]
#[injectable(lifecycle)]
pub struct Window {
    pub opened: bool,
}

#[lifecycle]
impl Window {
    pub fn new() -> Self {
        Self::default()
    }

    #[post_construct]
    fn open(&mut self) {
        self.opened = true;
    }

    #[post_construct]
    fn validate(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        Ok(())
    }

    #[pre_destroy]
    fn close(&self) -> Result<(), String> {
        Ok(())
    }

    #[post_construct]
    #[pre_destroy]
    fn log(&self) {}
}

fn main() {
    let window = Window::new();
    assert_eq!(window.declared_methods().len(), 4);

    let container = Container::new();
    let window = container.instantiate_presenter::<Window>().unwrap();
    assert!(window.opened);
    container.forget_all().unwrap();
}
