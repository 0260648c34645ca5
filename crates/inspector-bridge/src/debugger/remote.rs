//! Host values to protocol remote objects.
//! - remote_object: debugger property (string-typed host view)
//! - remote_value: page script result

use serde_json::{Number, Value};

use crate::host::{HostProperty, HostValue};
use crate::protocol::RemoteObject;

/// Convert a debugger property; the flag reports a thrown error value.
#[must_use]
pub fn remote_object(property: &HostProperty) -> (RemoteObject, bool) {
    let lowered = property.type_name.to_ascii_lowercase();
    // "Object, Array" style names carry the subtype after the comma.
    let (mut object_type, mut subtype) = match lowered.split_once(',') {
        Some((_, sub)) => ("object".to_string(), Some(sub.trim().to_string())),
        None => (lowered.clone(), None),
    };
    if subtype.as_deref() == Some("function") {
        object_type = "function".to_string();
        subtype = None;
    }
    if object_type == "null" {
        object_type = "object".to_string();
        subtype = Some("null".to_string());
    }
    if object_type == "object" && property.value == "undefined" {
        object_type = "undefined".to_string();
        subtype = None;
    }
    let mut thrown = false;
    if object_type == "error" {
        object_type = "object".to_string();
        thrown = true;
    }

    let text = strip_quotes(&property.value).to_string();
    let value = match object_type.as_str() {
        "number" => property
            .value
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number),
        "boolean" => Some(Value::Bool(property.value == "true")),
        "undefined" => None,
        _ if subtype.as_deref() == Some("null") => Some(Value::Null),
        _ => Some(Value::String(text.clone())),
    };
    let is_object = object_type == "object";

    let object = RemoteObject {
        object_type,
        subtype: if is_object { subtype } else { None },
        class_name: is_object.then(|| "Object".to_string()),
        value,
        description: Some(text),
        object_id: property.expandable.then(|| property.id.to_string()),
    };
    (object, thrown)
}

/// Convert a page script result; the flag reports a thrown exception.
#[must_use]
pub fn remote_value(value: &HostValue) -> (RemoteObject, bool) {
    let object = match value {
        HostValue::Undefined => RemoteObject {
            object_type: "undefined".to_string(),
            ..RemoteObject::default()
        },
        HostValue::Null => RemoteObject {
            object_type: "object".to_string(),
            subtype: Some("null".to_string()),
            value: Some(Value::Null),
            ..RemoteObject::default()
        },
        HostValue::Bool(flag) => RemoteObject {
            object_type: "boolean".to_string(),
            value: Some(Value::Bool(*flag)),
            description: Some(flag.to_string()),
            ..RemoteObject::default()
        },
        HostValue::Number(number) => RemoteObject {
            object_type: "number".to_string(),
            value: Number::from_f64(*number).map(Value::Number),
            description: Some(number.to_string()),
            ..RemoteObject::default()
        },
        HostValue::String(text) => RemoteObject {
            object_type: "string".to_string(),
            value: Some(Value::String(text.clone())),
            description: Some(text.clone()),
            ..RemoteObject::default()
        },
        HostValue::Object {
            class_name,
            description,
        } => RemoteObject {
            object_type: "object".to_string(),
            class_name: Some(class_name.clone()),
            description: Some(description.clone()),
            ..RemoteObject::default()
        },
        HostValue::Thrown(message) => {
            let object = RemoteObject {
                object_type: "object".to_string(),
                subtype: Some("error".to_string()),
                class_name: Some("Error".to_string()),
                description: Some(message.clone()),
                ..RemoteObject::default()
            };
            return (object, true);
        }
    };
    (object, false)
}

fn strip_quotes(value: &str) -> &str {
    if value.len() > 2 && value.starts_with('"') && value.ends_with('"') {
        &value[1..value.len() - 1]
    } else {
        value
    }
}
