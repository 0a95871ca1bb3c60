use log::LevelFilter;
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::config::{Appender, Root};
use log4rs::encode::pattern::PatternEncoder;
use log4rs::{Config, Handle};

use crate::config::ConfigError;

const LOG_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S%.6f)} {T:>15.15} {h({l:>5.5})} {t}:{L} - {m}{n}";

/// Routes all records to stderr so stdout carries only the result.
pub fn init_logging(level: LevelFilter) -> Result<Handle, ConfigError> {
    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
        .build();

    let config = Config::builder()
        .appender(Appender::builder().build("stderr", Box::new(stderr)))
        .build(Root::builder().appender("stderr").build(level))
        .map_err(|err| ConfigError::Logging(err.to_string()))?;

    log4rs::init_config(config).map_err(|err| ConfigError::Logging(err.to_string()))
}
