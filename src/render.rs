//! Total, deterministic rendering of [`Value`]s into log text.
//!
//! Plain values render naturally (`undefined`, `42`, string contents without
//! quotes), plain objects become compact JSON, arrays render element by
//! element inside `[...]`, and complex values (errors, instances, maps, sets)
//! are prefixed with their type name:
//!
//! ```text
//! TestError {"code":101,"message":"boom","name":"Error"}
//! Test {"prop1":123,"service":"Service {}"}
//! ```
//!
//! A complex value is expanded into a JSON structure only at the top level.
//! Complex values nested below it collapse to their own rendered string, so a
//! graph of instances always yields finite output. Instances that are already
//! being rendered further up the path show up as `[Circular]`.

use std::ptr;

use serde_json::{Map, Number, Value as Json};

use crate::{
    inspect::Inspect,
    value::{ErrorValue, Value, ValueInner},
};

pub const CIRCULAR: &str = "[Circular]";
pub const TRUNCATED: &str = "[...]";
pub const UNSERIALIZABLE: &str = "[Unserializable]";

const MAX_DEPTH: usize = 10;

/// Renders a value into its log representation.
///
/// Never panics: values that cannot be represented degrade to one of the
/// placeholders exported by this module.
#[must_use]
pub fn render(value: &Value) -> String {
    Renderer::default().render(value)
}

/// Renders a sequence as `[a, b, c]`, each element through [`render`].
#[must_use]
pub fn render_sequence(values: &[Value]) -> String {
    Renderer::default().sequence(values)
}

/// Renders an inspectable instance as `ClassName {fields}`.
#[must_use]
pub fn render_instance(instance: &dyn Inspect) -> String {
    Renderer::default().instance(instance)
}

#[derive(Default)]
struct Renderer {
    path: Vec<*const ()>,
    depth: usize,
}

impl Renderer {
    fn render(&mut self, value: &Value) -> String {
        if self.depth > MAX_DEPTH {
            return TRUNCATED.to_owned();
        }

        match &value.0 {
            ValueInner::Undefined => "undefined".to_owned(),
            ValueInner::Null => "null".to_owned(),
            ValueInner::Bool(value) => value.to_string(),
            ValueInner::Int(value) => value.to_string(),
            ValueInner::UInt(value) => value.to_string(),
            ValueInner::Float(value) => format_float(*value),
            ValueInner::String(value) => value.to_string(),
            ValueInner::Symbol(description) => {
                format!("Symbol({})", description.as_deref().unwrap_or_default())
            }
            ValueInner::Function(name) => format!("[Function: {name}]"),
            ValueInner::Display(value) => value.to_string(),
            ValueInner::Debug(value) => format!("{value:?}"),
            ValueInner::Array(items) => self.sequence(items),
            ValueInner::Object(_) => self
                .json(value)
                .map_or_else(|| "undefined".to_owned(), |json| json.to_string()),
            ValueInner::Serde(value) => serde_json::to_value(&**value)
                .map_or_else(|_| UNSERIALIZABLE.to_owned(), |json| json.to_string()),
            ValueInner::Error(error) => self.error(error),
            ValueInner::Instance(instance) => self.instance(&**instance),
            ValueInner::Map { type_name, entries } => {
                let json = self.nested(|this| {
                    let mut object = Map::new();
                    for (key, value) in entries {
                        let key = this.render(key);
                        object.insert(key, this.json(value).unwrap_or(Json::Null));
                    }
                    Json::Object(object)
                });
                format!("{type_name} {json}")
            }
            ValueInner::Set { type_name, items } => {
                let json = self.nested(|this| this.json_array(items));
                format!("{type_name} {json}")
            }
        }
    }

    fn sequence(&mut self, values: &[Value]) -> String {
        let items = self.nested(|this| {
            values
                .iter()
                .map(|item| this.render(item))
                .collect::<Vec<_>>()
        });
        format!("[{}]", items.join(", "))
    }

    fn error(&mut self, error: &ErrorValue) -> String {
        let json = self.nested(|this| {
            let mut object = Map::new();
            if let Some(code) = error.code.as_ref().and_then(|code| this.json(code)) {
                object.insert("code".to_owned(), code);
            }
            object.insert("message".to_owned(), Json::from(error.message.as_str()));
            object.insert("name".to_owned(), Json::String(error.name.to_string()));
            if let Some(stack) = &error.stack {
                object.insert("stack".to_owned(), Json::from(stack.as_str()));
            }
            Json::Object(object)
        });
        format!("{} {json}", error.class_name)
    }

    fn instance(&mut self, instance: &dyn Inspect) -> String {
        let address = ptr::from_ref(instance).cast::<()>();
        if self.path.contains(&address) {
            return CIRCULAR.to_owned();
        }

        self.path.push(address);
        let json = self.nested(|this| {
            let mut object = Map::new();
            for (key, value) in &instance.fields().0 {
                if matches!(value.0, ValueInner::Function(_)) {
                    continue;
                }
                if let Some(json) = this.json(value) {
                    object.insert(key.to_string(), json);
                }
            }
            Json::Object(object)
        });
        self.path.pop();

        format!("{} {json}", instance.class_name())
    }

    /// JSON form of a value embedded in a JSON fragment.
    ///
    /// `None` means "omit": the key is skipped inside objects and becomes
    /// `null` inside arrays.
    fn json(&mut self, value: &Value) -> Option<Json> {
        if self.depth > MAX_DEPTH {
            return Some(Json::from(TRUNCATED));
        }

        match &value.0 {
            ValueInner::Undefined | ValueInner::Symbol(_) | ValueInner::Function(_) => None,
            ValueInner::Null => Some(Json::Null),
            ValueInner::Bool(value) => Some(Json::Bool(*value)),
            ValueInner::Int(value) => Some(Json::from(*value)),
            ValueInner::UInt(value) => Some(Json::from(*value)),
            ValueInner::Float(value) => Some(json_float(*value)),
            ValueInner::String(value) => Some(Json::String(value.to_string())),
            ValueInner::Display(value) => Some(Json::from(value.to_string())),
            ValueInner::Debug(value) => Some(Json::from(format!("{value:?}"))),
            ValueInner::Array(items) => Some(self.nested(|this| this.json_array(items))),
            ValueInner::Object(entries) => Some(self.nested(|this| {
                let mut object = Map::new();
                for (key, value) in entries {
                    if let Some(json) = this.json(value) {
                        object.insert(key.to_string(), json);
                    }
                }
                Json::Object(object)
            })),
            ValueInner::Serde(value) => Some(
                serde_json::to_value(&**value).unwrap_or_else(|_| Json::from(UNSERIALIZABLE)),
            ),
            ValueInner::Error(_)
            | ValueInner::Instance(_)
            | ValueInner::Map { .. }
            | ValueInner::Set { .. } => Some(Json::from(self.render(value))),
        }
    }

    fn json_array(&mut self, items: &[Value]) -> Json {
        let items = items
            .iter()
            .map(|item| self.json(item).unwrap_or(Json::Null))
            .collect();
        Json::Array(items)
    }

    fn nested<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }
}

#[allow(clippy::float_cmp)]
fn format_float(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_owned()
    } else if value.is_infinite() {
        let sign = if value.is_sign_negative() { "-" } else { "" };
        format!("{sign}Infinity")
    } else if value == 0.0 {
        "0".to_owned()
    } else if value.fract() == 0.0 && value.abs() < 1e21 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}

#[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
fn json_float(value: f64) -> Json {
    const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

    if value.fract() == 0.0 && value.abs() <= MAX_SAFE_INTEGER {
        Json::from(value as i64)
    } else {
        Number::from_f64(value).map_or(Json::Null, Json::Number)
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::BTreeMap,
        sync::{Arc, Mutex, Weak},
    };

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        inspect::Fields,
        value::{ErrorValue, ToValue},
    };

    struct Service;

    impl Inspect for Service {}

    struct Holder {
        name: &'static str,
        tags: Vec<&'static str>,
        nothing: Option<u8>,
        service: Arc<Service>,
        config: Value,
        callback: Value,
    }

    impl Inspect for Holder {
        fn fields(&self) -> Fields {
            Fields::new()
                .record("name", self.name)
                .record("tags", &self.tags)
                .record("nothing", self.nothing)
                .record("service", &self.service)
                .record("config", &self.config)
                .record("callback", &self.callback)
        }
    }

    struct Node {
        id: u32,
        parent: Mutex<Weak<Node>>,
    }

    impl Inspect for Node {
        fn fields(&self) -> Fields {
            let parent = self.parent.lock().unwrap().upgrade();
            Fields::new().record("id", self.id).record("parent", parent)
        }
    }

    #[test]
    fn test_render_primitives() {
        assert_eq!(render(&Value::undefined()), "undefined");
        assert_eq!(render(&Value::null()), "null");
        assert_eq!(render(&true.to_value()), "true");
        assert_eq!(render(&(-3_i32).to_value()), "-3");
        assert_eq!(render(&42.0_f64.to_value()), "42");
        assert_eq!(render(&1.5_f64.to_value()), "1.5");
        assert_eq!(render(&f64::NAN.to_value()), "NaN");
        assert_eq!(render(&f64::NEG_INFINITY.to_value()), "-Infinity");
        assert_eq!(render(&"text".to_value()), "text");
        assert_eq!(render(&Value::symbol(None)), "Symbol()");
        assert_eq!(render(&Value::symbol(Some("id"))), "Symbol(id)");
        assert_eq!(render(&Value::function("handler")), "[Function: handler]");
    }

    #[test]
    fn test_render_plain_object() {
        let object = Value::object([("a", 1.to_value()), ("skip", Value::undefined())]);
        let rendered = render(&object);
        assert_eq!(rendered, r#"{"a":1}"#);
        let parsed: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(parsed, serde_json::json!({ "a": 1 }));
    }

    #[test]
    fn test_render_array_elements_independently() {
        let array = Value::array([
            Value::object([("test", 42.to_value())]),
            34.to_value(),
            "text".to_value(),
            Value::array([1.to_value(), 2.to_value()]),
            Value::undefined(),
        ]);
        assert_eq!(render(&array), r#"[{"test":42}, 34, text, [1, 2], undefined]"#);
    }

    #[test]
    fn test_render_error() {
        let error = ErrorValue::new("TestError", "")
            .code(101)
            .stack("test");
        assert_eq!(
            render(&Value::error(error)),
            r#"TestError {"code":101,"message":"","name":"Error","stack":"test"}"#
        );
    }

    #[test]
    fn test_render_instance_collapses_nested_complex_values() {
        let holder = Arc::new(Holder {
            name: "prop1",
            tags: vec!["a", "b"],
            nothing: None,
            service: Arc::new(Service),
            config: Value::object([("prop3", "prop3".to_value())]),
            callback: Value::function("callback"),
        });
        assert_eq!(
            render(&holder.to_value()),
            r#"Holder {"name":"prop1","tags":["a","b"],"service":"Service {}","config":{"prop3":"prop3"}}"#
        );
    }

    #[test]
    fn test_render_containers() {
        let map = BTreeMap::from([("test", 42)]);
        assert_eq!(render(&map.to_value()), r#"BTreeMap {"test":42}"#);

        let set = std::collections::BTreeSet::from([3, 1]);
        assert_eq!(render(&set.to_value()), "BTreeSet [1,3]");
    }

    #[test]
    fn test_render_serde_value() {
        #[derive(serde::Serialize)]
        struct Point {
            x: i32,
            y: i32,
        }

        assert_eq!(render(&Value::serde(Point { x: 1, y: 2 })), r#"{"x":1,"y":2}"#);
    }

    #[test]
    fn test_render_unserializable_serde_value() {
        // JSON object keys must be strings.
        let points = std::collections::HashMap::from([((1, 2), 3)]);

        assert_eq!(render(&Value::serde(points.clone())), UNSERIALIZABLE);
        assert_eq!(
            render(&Value::object([("points", Value::serde(points))])),
            r#"{"points":"[Unserializable]"}"#
        );
    }

    #[test]
    fn test_render_json_nulls() {
        let object = Value::object([
            (
                "a",
                Value::array([
                    Value::undefined(),
                    Value::symbol(None),
                    Value::function("callback"),
                    f64::NAN.to_value(),
                    f64::INFINITY.to_value(),
                    1.to_value(),
                ]),
            ),
            ("b", f64::NEG_INFINITY.to_value()),
            ("c", Value::undefined()),
        ]);
        assert_eq!(
            render(&object),
            r#"{"a":[null,null,null,null,null,1],"b":null}"#
        );
    }

    #[test]
    fn test_render_depth_limit() {
        let mut array = 1.to_value();
        let mut object = 1.to_value();
        for _ in 0..15 {
            array = Value::array([array]);
            object = Value::object([("k", object)]);
        }

        let levels = MAX_DEPTH + 1;
        assert_eq!(
            render(&array),
            format!("{}{TRUNCATED}{}", "[".repeat(levels), "]".repeat(levels))
        );
        assert_eq!(
            render(&object),
            format!(
                "{}\"{TRUNCATED}\"{}",
                r#"{"k":"#.repeat(levels),
                "}".repeat(levels)
            )
        );
    }

    #[test]
    fn test_render_cycle_is_finite() {
        let parent = Arc::new(Node {
            id: 1,
            parent: Mutex::new(Weak::new()),
        });
        let child = Arc::new(Node {
            id: 2,
            parent: Mutex::new(Arc::downgrade(&parent)),
        });
        *parent.parent.lock().unwrap() = Arc::downgrade(&child);

        assert_eq!(
            render(&parent.to_value()),
            r#"Node {"id":1,"parent":"Node {\"id\":2,\"parent\":\"[Circular]\"}"}"#
        );
    }
}
