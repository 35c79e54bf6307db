use std::sync::{Arc, Mutex, PoisonError};

use class_logger::{PartialLoggerConfig, Sink};
use log::{LevelFilter, Record};

/// Collects every message a sink receives, in emission order.
#[derive(Debug, Clone, Default)]
pub struct Recorder(Arc<Mutex<Vec<String>>>);

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sink(&self) -> Sink {
        let messages = Arc::clone(&self.0);
        Sink::new(move |message| {
            messages
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(message.to_owned());
        })
    }

    pub fn messages(&self) -> Vec<String> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// A `log` and a `log_error` recorder installed as a class override.
#[derive(Debug, Clone, Default)]
pub struct Recorders {
    pub log: Recorder,
    pub log_error: Recorder,
}

impl Recorders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(&self) -> PartialLoggerConfig {
        PartialLoggerConfig::new()
            .log(self.log.sink())
            .log_error(self.log_error.sink())
    }
}

/// Installs an `env_logger` whose formatter hands every record to `check`.
pub fn check_logger_once<F>(check: F)
where
    F: Fn(&Record) -> std::io::Result<()> + Send + Sync + 'static,
{
    env_logger::Builder::new()
        .filter_level(LevelFilter::Trace)
        .format(move |_fmt, record| check(record))
        .init();
}
