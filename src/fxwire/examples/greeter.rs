use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use fxwire::prelude::*;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let configuration = FileConfiguration::from_toml_str(
        r#"
        [ConsoleLogger]
        app_name = "greeter"

        [ChineseGreeter]
        greeting = "你好世界!"
        "#,
    )
    .unwrap()
    .with_env_prefix("GREETER_");
    global::set_configuration_source(configuration);

    let context = ContextMap::new().with("greeting", String::from("Hello World!"));
    let app = global::instantiate_presenter_with::<App, _>(&context).unwrap();
    app.run();

    global::forget_all().unwrap();
}

#[derive(Default, Injectable)]
#[injectable(lifecycle)]
struct ConsoleLogger {
    #[inject]
    app_name: String,
    lines: AtomicUsize,
}

#[lifecycle]
impl ConsoleLogger {
    #[post_construct]
    fn open(&mut self) {
        eprintln!("[{}] logger ready", self.app_name);
    }

    #[pre_destroy]
    fn close(&self) {
        eprintln!(
            "[{}] logger closed after {} lines",
            self.app_name,
            self.lines.load(Ordering::SeqCst)
        );
    }
}

impl ConsoleLogger {
    fn log(&self, message: &str) {
        self.lines.fetch_add(1, Ordering::SeqCst);
        eprintln!("[{}] {}", self.app_name, message);
    }
}

#[derive(Default, Injectable)]
struct EnglishGreeter {
    #[inject]
    logger: Option<Arc<ConsoleLogger>>,
    #[inject]
    greeting: String,
}

impl EnglishGreeter {
    fn greet(&self) {
        if let Some(logger) = &self.logger {
            logger.log(&self.greeting);
        }
    }
}

#[derive(Default, Injectable)]
struct ChineseGreeter {
    #[inject]
    logger: Option<Arc<ConsoleLogger>>,
    #[inject]
    greeting: String,
}

impl ChineseGreeter {
    fn greet(&self) {
        if let Some(logger) = &self.logger {
            logger.log(&self.greeting);
        }
    }
}

#[derive(Default, Injectable)]
struct App {
    #[inject]
    logger: Option<Arc<ConsoleLogger>>,
    #[inject]
    english: Option<Arc<EnglishGreeter>>,
    #[inject]
    chinese: Option<Arc<ChineseGreeter>>,
}

impl App {
    fn run(&self) {
        if let Some(logger) = &self.logger {
            logger.log("Greeting from fxwire managed objects:");
        }
        if let Some(english) = &self.english {
            english.greet();
        }
        if let Some(chinese) = &self.chinese {
            chinese.greet();
        }
    }
}
