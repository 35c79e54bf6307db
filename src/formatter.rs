//! Start and end messages for an intercepted call.

use std::{fmt, ops::Deref};

use crate::{
    config::IncludeConfig,
    inspect::Inspect,
    render::{render, render_instance, render_sequence},
    value::Value,
};

/// The message being built: before the call or after it settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Start,
    End,
}

/// Everything known about a call before it runs.
#[derive(Clone, Copy)]
pub struct CallRecord<'a> {
    pub class_name: &'a str,
    pub member_name: &'a str,
    pub args: &'a [Value],
    /// The receiver, absent for static members and construction.
    pub class_instance: Option<&'a dyn Inspect>,
    pub include: &'a IncludeConfig,
}

impl fmt::Debug for CallRecord<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallRecord")
            .field("class_name", &self.class_name)
            .field("member_name", &self.member_name)
            .field("args", &self.args)
            .field(
                "class_instance",
                &self.class_instance.map(Inspect::class_name),
            )
            .field("include", &self.include)
            .finish()
    }
}

/// A settled call: the record plus its outcome.
///
/// `result` holds the returned value, or the error when `error` is set.
#[derive(Debug, Clone, Copy)]
pub struct CallResult<'a> {
    pub record: CallRecord<'a>,
    pub error: bool,
    pub result: &'a Value,
}

impl<'a> Deref for CallResult<'a> {
    type Target = CallRecord<'a>;

    fn deref(&self) -> &Self::Target {
        &self.record
    }
}

/// Builds the log lines for a call.
pub trait Formatter: Send + Sync {
    fn start(&self, record: &CallRecord<'_>) -> String;

    fn end(&self, result: &CallResult<'_>) -> String;
}

/// The stock message layout:
///
/// ```text
/// Test.method. Args: [1, a].
/// Test.method -> done. Args: [1, a]. Res: 42.
/// Test.method -> error. Args: [1, a]. Class instance: Test {"prop1":123}. Res: TestError {..}.
/// ```
///
/// The individual segments are public so that custom formatters can reuse them.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultFormatter;

impl DefaultFormatter {
    /// Printed in place of the instance when there is none.
    pub const PLACEHOLDER_NOT_AVAILABLE: &'static str = "N/A";

    #[must_use]
    pub fn base(record: &CallRecord<'_>) -> String {
        format!("{}.{}", record.class_name, record.member_name)
    }

    #[must_use]
    pub const fn operation(result: &CallResult<'_>) -> &'static str {
        if result.error { " -> error" } else { " -> done" }
    }

    #[must_use]
    pub fn args(record: &CallRecord<'_>) -> String {
        format!(". Args: {}", render_sequence(record.args))
    }

    #[must_use]
    pub fn class_instance(record: &CallRecord<'_>) -> String {
        let instance = record.class_instance.map_or_else(
            || Self::PLACEHOLDER_NOT_AVAILABLE.to_owned(),
            render_instance,
        );
        format!(". Class instance: {instance}")
    }

    #[must_use]
    pub fn result(result: &CallResult<'_>) -> String {
        format!(". Res: {}", render(result.result))
    }

    #[must_use]
    pub const fn terminator() -> &'static str {
        "."
    }
}

impl Formatter for DefaultFormatter {
    fn start(&self, record: &CallRecord<'_>) -> String {
        let mut message = Self::base(record);
        if record.include.args.enabled(Phase::Start) {
            message += &Self::args(record);
        }
        if record.include.class_instance.enabled(Phase::Start) {
            message += &Self::class_instance(record);
        }
        message += Self::terminator();
        message
    }

    fn end(&self, result: &CallResult<'_>) -> String {
        let mut message = Self::base(result);
        message += Self::operation(result);
        if result.include.args.enabled(Phase::End) {
            message += &Self::args(result);
        }
        if result.include.class_instance.enabled(Phase::End) {
            message += &Self::class_instance(result);
        }
        if result.include.result {
            message += &Self::result(result);
        }
        message += Self::terminator();
        message
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        config::IncludeFlag,
        inspect::Fields,
        value::{ErrorValue, ToValue},
    };

    struct TestClass {
        prop1: i32,
    }

    impl Inspect for TestClass {
        fn fields(&self) -> Fields {
            Fields::new().record("prop1", self.prop1)
        }
    }

    fn args() -> Vec<Value> {
        vec![
            "test".to_value(),
            Value::symbol(None),
            Value::object([("test", "123".to_value())]),
            Value::undefined(),
        ]
    }

    fn record<'a>(
        args: &'a [Value],
        instance: Option<&'a dyn Inspect>,
        include: &'a IncludeConfig,
    ) -> CallRecord<'a> {
        CallRecord {
            class_name: "ClassNameTest",
            member_name: "propertyNameTest",
            args,
            class_instance: instance,
            include,
        }
    }

    #[test]
    fn test_start_default_include() {
        let args = args();
        let include = IncludeConfig::default();
        let message = DefaultFormatter.start(&record(&args, None, &include));
        assert_eq!(
            message,
            r#"ClassNameTest.propertyNameTest. Args: [test, Symbol(), {"test":"123"}, undefined]."#
        );
    }

    #[test]
    fn test_start_without_args_with_instance() {
        let instance = TestClass { prop1: 123 };
        let include = IncludeConfig {
            args: IncludeFlag::Both(false),
            class_instance: IncludeFlag::Both(true),
            ..IncludeConfig::default()
        };
        let message = DefaultFormatter.start(&record(&[], Some(&instance), &include));
        assert_eq!(
            message,
            r#"ClassNameTest.propertyNameTest. Class instance: TestClass {"prop1":123}."#
        );
    }

    #[test]
    fn test_instance_placeholder() {
        let include = IncludeConfig {
            class_instance: IncludeFlag::Both(true),
            ..IncludeConfig::default()
        };
        let message = DefaultFormatter.start(&record(&[], None, &include));
        assert_eq!(
            message,
            "ClassNameTest.propertyNameTest. Args: []. Class instance: N/A."
        );
    }

    #[test]
    fn test_end_done_and_error() {
        let include = IncludeConfig::default();
        let result = "resultTest".to_value();
        let done = CallResult {
            record: record(&[], None, &include),
            error: false,
            result: &result,
        };
        assert_eq!(
            DefaultFormatter.end(&done),
            "ClassNameTest.propertyNameTest -> done. Args: []. Res: resultTest."
        );

        let error = Value::error(ErrorValue::new("TestError", "boom"));
        let failed = CallResult {
            error: true,
            result: &error,
            ..done
        };
        assert_eq!(
            DefaultFormatter.end(&failed),
            r#"ClassNameTest.propertyNameTest -> error. Args: []. Res: TestError {"message":"boom","name":"Error"}."#
        );
    }

    #[test]
    fn test_end_without_result() {
        let include = IncludeConfig {
            args: IncludeFlag::Both(false),
            result: false,
            ..IncludeConfig::default()
        };
        let result = Value::undefined();
        let message = DefaultFormatter.end(&CallResult {
            record: record(&[], None, &include),
            error: false,
            result: &result,
        });
        assert_eq!(message, "ClassNameTest.propertyNameTest -> done.");
    }

    #[test]
    fn test_args_are_phase_gated() {
        let args = vec![1.to_value()];
        let include = IncludeConfig {
            args: IncludeFlag::Split {
                start: true,
                end: false,
            },
            ..IncludeConfig::default()
        };
        let result = Value::undefined();
        let record = record(&args, None, &include);

        let start = DefaultFormatter.start(&record);
        let end = DefaultFormatter.end(&CallResult {
            record,
            error: false,
            result: &result,
        });
        assert!(start.contains("Args:"));
        assert!(!end.contains("Args:"));
        assert_eq!(end, "ClassNameTest.propertyNameTest -> done. Res: undefined.");
    }

    #[test]
    fn test_instance_is_phase_gated() {
        let instance = TestClass { prop1: 1 };
        let include = IncludeConfig {
            class_instance: IncludeFlag::Split {
                start: false,
                end: true,
            },
            ..IncludeConfig::default()
        };
        let result = 2.to_value();
        let record = record(&[], Some(&instance), &include);

        assert_eq!(
            DefaultFormatter.start(&record),
            "ClassNameTest.propertyNameTest. Args: []."
        );
        assert_eq!(
            DefaultFormatter.end(&CallResult {
                record,
                error: false,
                result: &result,
            }),
            r#"ClassNameTest.propertyNameTest -> done. Args: []. Class instance: TestClass {"prop1":1}. Res: 2."#
        );
    }
}
