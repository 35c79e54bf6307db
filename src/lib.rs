//! # Overview
//!
#![doc = include_utils::include_md!("README.md:description")]
//!
//! Interception is explicit: a type is registered once with [`metadata`], and
//! calls are routed through [`ClassLogger`] or [`Logged`]. For each call the
//! library:
//!
//! - Resolves the configuration from the global default, the class override and
//!   the member override.
//! - Emits a start message before the original body runs.
//! - Emits an end message once the outcome is known, including for futures.
//!
//! Messages are handed to [`Sink`]s. The default sinks forward to the [`log`]
//! facade under the [`LOG_TARGET`] target, so any logger implementing
//! [`Log`](log::Log) can consume them, for example [`env_logger`].
//!
//! ## Basic example
//!
#![doc = include_utils::include_md!("README.md:basic_example")]
//!
//! ## Asynchronous members
//!
#![doc = include_utils::include_md!("README.md:async_example")]
//!
//! [`env_logger`]: https://docs.rs/env_logger/latest/env_logger

use std::borrow::Cow;

pub use self::{
    config::{
        IncludeConfig, IncludeFlag, LOG_TARGET, LoggerConfig, PartialIncludeConfig,
        PartialLoggerConfig, Sink, global_default, reset_global_default, set_global_default,
    },
    extensions::Extensions,
    formatter::{CallRecord, CallResult, DefaultFormatter, Formatter, Phase},
    future::Intercepted,
    inspect::{Fields, Inspect},
    render::{render, render_instance, render_sequence},
    value::{Args, ErrorValue, ToValue, Value},
    wrapper::{CONSTRUCT, ClassLogger, Logged, wrap_class},
};

mod config;
mod extensions;
mod formatter;
pub mod future;
mod inspect;
pub mod metadata;
pub mod render;
mod value;
mod wrapper;

type StaticCowStr = Cow<'static, str>;
