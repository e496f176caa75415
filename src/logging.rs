use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use std::path::Path;

pub const LOG_CONFIG_FILE: &str = "log4rs.yml";
const CONSOLE_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S)} - {l} - {m}{n}";

/// Initialise log4rs from `log4rs.yml`, or a plain console logger when the file is absent
pub fn init() {
    if Path::new(LOG_CONFIG_FILE).exists() {
        match log4rs::init_file(LOG_CONFIG_FILE, Default::default()) {
            Ok(()) => return,
            Err(e) => eprintln!("Could not load {}: {}; logging to console", LOG_CONFIG_FILE, e),
        }
    }

    let console = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(CONSOLE_PATTERN)))
        .build();
    let config = Config::builder()
        .appender(Appender::builder().build("console", Box::new(console)))
        .build(Root::builder().appender("console").build(LevelFilter::Info));

    match config {
        Ok(config) => {
            if let Err(e) = log4rs::init_config(config) {
                eprintln!("Logger already initialised: {}", e);
            }
        }
        Err(e) => eprintln!("Invalid console logging configuration: {}", e),
    }
}
