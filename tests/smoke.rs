use std::sync::{Arc, Mutex, PoisonError};

use class_logger::{ErrorValue, Inspect, LOG_TARGET, PartialLoggerConfig, metadata, wrap_class};
use log::Level;
use pretty_assertions::assert_eq;

use crate::common::check_logger_once;

pub mod common;

struct Lamp {
    on: bool,
}

impl Inspect for Lamp {}

#[test]
fn test_default_sinks_use_log_facade() {
    let records = Arc::new(Mutex::new(Vec::new()));
    let captured = Arc::clone(&records);
    check_logger_once(move |record| {
        if record.target() == LOG_TARGET {
            captured
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push((record.level(), record.args().to_string()));
        }
        Ok(())
    });

    metadata::attach_member::<Lamp>("toggle", PartialLoggerConfig::new());
    metadata::attach_member::<Lamp>("fail", PartialLoggerConfig::new());

    let mut lamp = wrap_class::<Lamp>().construct((false,), |(on,)| Lamp { on });
    let on = lamp.call_mut("toggle", (), |lamp, ()| {
        lamp.on = !lamp.on;
        lamp.on
    });
    assert!(on);
    let error = lamp
        .try_call("fail", (), |_, ()| {
            Err::<(), _>(ErrorValue::new("LampError", "burnt out"))
        })
        .unwrap_err();
    assert_eq!(error.message, "burnt out");

    let records = records.lock().unwrap().clone();
    assert_eq!(
        records,
        [
            (Level::Info, "Lamp.construct. Args: [false].".to_owned()),
            (Level::Info, "Lamp.toggle. Args: [].".to_owned()),
            (Level::Info, "Lamp.toggle -> done. Args: []. Res: true.".to_owned()),
            (Level::Info, "Lamp.fail. Args: [].".to_owned()),
            (
                Level::Error,
                r#"Lamp.fail -> error. Args: []. Res: LampError {"message":"burnt out","name":"Error"}."#
                    .to_owned()
            ),
        ]
    );
}
