//! Layered logger configuration.
//!
//! A call is logged with `merge(global default, class override, member override)`.
//! Sinks and the formatter are replaced wholesale by the rightmost layer that
//! sets them, while [`IncludeConfig`] and [`Extensions`] are merged key by key.

use std::{
    fmt,
    sync::{Arc, OnceLock, PoisonError, RwLock},
};

use serde::{Deserialize, Serialize};

use crate::{
    extensions::Extensions,
    formatter::{DefaultFormatter, Formatter, Phase},
};

/// Target used by the [`log`] facade sinks.
pub const LOG_TARGET: &str = "class_logger";

/// Whether a part of the message is included, for both phases or per phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IncludeFlag {
    Both(bool),
    Split { start: bool, end: bool },
}

impl IncludeFlag {
    #[must_use]
    pub const fn enabled(self, phase: Phase) -> bool {
        match (self, phase) {
            (Self::Both(enabled), _) => enabled,
            (Self::Split { start, .. }, Phase::Start) => start,
            (Self::Split { end, .. }, Phase::End) => end,
        }
    }
}

impl From<bool> for IncludeFlag {
    fn from(value: bool) -> Self {
        Self::Both(value)
    }
}

/// Selects which parts of a call end up in the log message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncludeConfig {
    pub args: IncludeFlag,
    pub construct: bool,
    pub result: bool,
    pub class_instance: IncludeFlag,
}

impl Default for IncludeConfig {
    fn default() -> Self {
        Self {
            args: IncludeFlag::Both(true),
            construct: true,
            result: true,
            class_instance: IncludeFlag::Both(false),
        }
    }
}

impl IncludeConfig {
    #[must_use]
    pub fn merge(self, partial: &PartialIncludeConfig) -> Self {
        Self {
            args: partial.args.unwrap_or(self.args),
            construct: partial.construct.unwrap_or(self.construct),
            result: partial.result.unwrap_or(self.result),
            class_instance: partial.class_instance.unwrap_or(self.class_instance),
        }
    }
}

/// An [`IncludeConfig`] override layer; absent keys inherit.
///
/// Deserializes from the same JSON shape as the include section of the
/// configuration, e.g. `{"args": {"start": true, "end": false}, "classInstance": true}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PartialIncludeConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub args: Option<IncludeFlag>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub construct: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_instance: Option<IncludeFlag>,
}

impl PartialIncludeConfig {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            args: None,
            construct: None,
            result: None,
            class_instance: None,
        }
    }

    /// Parses an include layer from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not valid JSON or has the wrong shape.
    pub fn from_json(input: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(input)
    }

    #[must_use]
    pub fn args(mut self, args: impl Into<IncludeFlag>) -> Self {
        self.args = Some(args.into());
        self
    }

    #[must_use]
    pub const fn construct(mut self, construct: bool) -> Self {
        self.construct = Some(construct);
        self
    }

    #[must_use]
    pub const fn result(mut self, result: bool) -> Self {
        self.result = Some(result);
        self
    }

    #[must_use]
    pub fn class_instance(mut self, class_instance: impl Into<IncludeFlag>) -> Self {
        self.class_instance = Some(class_instance.into());
        self
    }

    /// Layers `other` on top of `self`.
    #[must_use]
    pub fn merge(self, other: &Self) -> Self {
        Self {
            args: other.args.or(self.args),
            construct: other.construct.or(self.construct),
            result: other.result.or(self.result),
            class_instance: other.class_instance.or(self.class_instance),
        }
    }
}

/// A message consumer.
///
/// Sinks are fire-and-forget; a panicking sink propagates to the caller of the
/// intercepted method.
#[derive(Clone)]
pub struct Sink(Arc<dyn Fn(&str) + Send + Sync>);

impl Sink {
    pub fn new<F>(sink: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        Self(Arc::new(sink))
    }

    /// A sink forwarding every message to the [`log`] facade at the given level.
    #[must_use]
    pub fn level(level: log::Level) -> Self {
        Self::new(move |message| log::log!(target: LOG_TARGET, level, "{message}"))
    }

    pub fn emit(&self, message: &str) {
        (self.0)(message);
    }
}

impl fmt::Debug for Sink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sink").finish_non_exhaustive()
    }
}

/// A complete configuration, ready to log a call.
#[derive(Clone)]
pub struct LoggerConfig {
    pub log: Sink,
    pub log_error: Sink,
    pub formatter: Arc<dyn Formatter>,
    pub include: IncludeConfig,
    pub extensions: Extensions,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            log: Sink::level(log::Level::Info),
            log_error: Sink::level(log::Level::Error),
            formatter: Arc::new(DefaultFormatter),
            include: IncludeConfig::default(),
            extensions: Extensions::new(),
        }
    }
}

impl LoggerConfig {
    /// Applies the override layers from left to right.
    #[must_use]
    pub fn merge<'a>(self, overrides: impl IntoIterator<Item = &'a PartialLoggerConfig>) -> Self {
        overrides.into_iter().fold(self, Self::apply)
    }

    /// Applies a single override layer.
    #[must_use]
    pub fn apply(mut self, partial: &PartialLoggerConfig) -> Self {
        if let Some(log) = &partial.log {
            self.log = log.clone();
        }
        if let Some(log_error) = &partial.log_error {
            self.log_error = log_error.clone();
        }
        if let Some(formatter) = &partial.formatter {
            self.formatter = Arc::clone(formatter);
        }
        self.include = self.include.merge(&partial.include);
        self.extensions.extend(&partial.extensions);
        self
    }
}

impl fmt::Debug for LoggerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggerConfig")
            .field("include", &self.include)
            .field("extensions", &self.extensions)
            .finish_non_exhaustive()
    }
}

/// An override layer attached to a class or a member.
///
/// # Examples
///
/// ```
/// use class_logger::{IncludeFlag, PartialIncludeConfig, PartialLoggerConfig, Sink};
///
/// let member = PartialLoggerConfig::new()
///     .log(Sink::level(log::Level::Debug))
///     .include(PartialIncludeConfig::new().args(false));
/// assert_eq!(member.include.args, Some(IncludeFlag::Both(false)));
/// ```
#[derive(Clone, Default)]
pub struct PartialLoggerConfig {
    pub log: Option<Sink>,
    pub log_error: Option<Sink>,
    pub formatter: Option<Arc<dyn Formatter>>,
    pub include: PartialIncludeConfig,
    pub extensions: Extensions,
}

impl PartialLoggerConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn log(mut self, sink: Sink) -> Self {
        self.log = Some(sink);
        self
    }

    #[must_use]
    pub fn log_error(mut self, sink: Sink) -> Self {
        self.log_error = Some(sink);
        self
    }

    #[must_use]
    pub fn formatter<F>(mut self, formatter: F) -> Self
    where
        F: Formatter + 'static,
    {
        self.formatter = Some(Arc::new(formatter));
        self
    }

    #[must_use]
    pub const fn include(mut self, include: PartialIncludeConfig) -> Self {
        self.include = include;
        self
    }

    #[must_use]
    pub fn extension<T>(mut self, value: T) -> Self
    where
        T: Send + Sync + 'static,
    {
        self.extensions.insert(value);
        self
    }
}

impl fmt::Debug for PartialLoggerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartialLoggerConfig")
            .field("log", &self.log.is_some())
            .field("log_error", &self.log_error.is_some())
            .field("formatter", &self.formatter.is_some())
            .field("include", &self.include)
            .field("extensions", &self.extensions)
            .finish()
    }
}

static GLOBAL_DEFAULT: OnceLock<RwLock<Arc<LoggerConfig>>> = OnceLock::new();

fn global_cell() -> &'static RwLock<Arc<LoggerConfig>> {
    GLOBAL_DEFAULT.get_or_init(|| RwLock::new(Arc::new(LoggerConfig::default())))
}

/// Returns the current process-wide default configuration.
///
/// The returned configuration is a snapshot: later calls to
/// [`set_global_default`] swap in a new value and never mutate this one.
#[must_use]
pub fn global_default() -> Arc<LoggerConfig> {
    let current = global_cell().read().unwrap_or_else(PoisonError::into_inner);
    Arc::clone(&current)
}

/// Layers `config` on top of the current process-wide default.
///
/// # Examples
///
/// ```
/// use class_logger::{
///     IncludeFlag, PartialIncludeConfig, PartialLoggerConfig, global_default, set_global_default,
/// };
///
/// set_global_default(
///     &PartialLoggerConfig::new().include(PartialIncludeConfig::new().class_instance(true)),
/// );
/// assert_eq!(global_default().include.class_instance, IncludeFlag::Both(true));
/// ```
pub fn set_global_default(config: &PartialLoggerConfig) {
    let mut current = global_cell().write().unwrap_or_else(PoisonError::into_inner);
    let next = LoggerConfig::clone(&current).apply(config);
    *current = Arc::new(next);
    drop(current);

    log::debug!("Replaced global logger configuration: {config:?}");
}

/// Restores the built-in default configuration.
pub fn reset_global_default() {
    let mut current = global_cell().write().unwrap_or_else(PoisonError::into_inner);
    *current = Arc::new(LoggerConfig::default());
}
