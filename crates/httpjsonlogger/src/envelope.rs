// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Map, Value};

/// Written as `source` on every record generated by this process.
pub const PROG: &str = "httpjsonlogger";
/// `key` of diagnostic records describing a failure.
pub const ERROR_KEY: &str = "error";
/// `key` of status announcements.
pub const STATUS_KEY: &str = "status";

/// A single envelope field as it appeared on the wire.
///
/// `Absent` and `Null` are kept apart so the decoded envelope mirrors what the
/// producer actually sent. Both serialize as `null`.
#[derive(Debug, Clone, PartialEq)]
pub enum Field<T> {
    Absent,
    Null,
    Present(T),
}

impl<T> Default for Field<T> {
    fn default() -> Self {
        Field::Absent
    }
}

impl<T> Field<T> {
    pub fn is_present(&self) -> bool {
        matches!(self, Field::Present(_))
    }

    pub fn as_present(&self) -> Option<&T> {
        match self {
            Field::Present(value) => Some(value),
            Field::Absent | Field::Null => None,
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Field<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // a missing key never reaches here, `#[serde(default)]` yields `Absent`
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(value) => Field::Present(value),
            None => Field::Null,
        })
    }
}

impl<T: Serialize> Serialize for Field<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Field::Present(value) => value.serialize(serializer),
            Field::Absent | Field::Null => serializer.serialize_none(),
        }
    }
}

/// Value of the `content` field.
///
/// Any JSON value decodes, so a scalar or array in `content` is a validation
/// failure rather than a decode failure.
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    Object(Map<String, Value>),
    NotObject(Value),
}

impl<'de> Deserialize<'de> for Content {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::Object(map) => Content::Object(map),
            other => Content::NotObject(other),
        })
    }
}

impl Serialize for Content {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Content::Object(map) => map.serialize(serializer),
            Content::NotObject(_) => serializer.serialize_none(),
        }
    }
}

/// The `{"source", "key", "content"}` record, possibly incomplete.
///
/// Unknown fields are ignored on decode. On encode all three keys are always
/// written, with `null` standing in for anything that is not a usable value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub source: Field<String>,
    #[serde(default)]
    pub key: Field<String>,
    #[serde(default)]
    pub content: Field<Content>,
}

impl Envelope {
    pub fn new(source: &str, key: &str, content: Map<String, Value>) -> Self {
        Envelope {
            source: Field::Present(source.to_string()),
            key: Field::Present(key.to_string()),
            content: Field::Present(Content::Object(content)),
        }
    }

    /// Diagnostic record with only an `error` description.
    pub fn error(message: impl Into<String>) -> Self {
        let mut content = Map::new();
        content.insert("error".to_string(), Value::String(message.into()));
        Envelope::new(PROG, ERROR_KEY, content)
    }

    /// Diagnostic record carrying the partially decoded envelope under `orig`.
    pub fn error_with_orig(message: impl Into<String>, orig: &Envelope) -> Self {
        let mut content = Map::new();
        content.insert("error".to_string(), Value::String(message.into()));
        content.insert("orig".to_string(), orig.to_value());
        Envelope::new(PROG, ERROR_KEY, content)
    }

    /// Status announcement written once the server is about to listen.
    pub fn listening(port: &str) -> Self {
        let mut content = Map::new();
        content.insert("status".to_string(), json!("listening"));
        content.insert("port".to_string(), json!(port));
        Envelope::new(PROG, STATUS_KEY, content)
    }

    /// Same shape the `Serialize` impl produces, without a fallible round trip.
    pub fn to_value(&self) -> Value {
        let content = match &self.content {
            Field::Present(Content::Object(map)) => Value::Object(map.clone()),
            _ => Value::Null,
        };
        json!({
            "source": self.source.as_present(),
            "key": self.key.as_present(),
            "content": content,
        })
    }

    /// Serialized form of the record, without the trailing newline.
    pub fn to_line(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

/// An envelope that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub source: String,
    pub key: String,
    pub content: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_absent_vs_null() {
        let envelope: Envelope = serde_json::from_str(r#"{"source":null}"#).unwrap();
        assert_eq!(envelope.source, Field::Null);
        assert_eq!(envelope.key, Field::Absent);
        assert_eq!(envelope.content, Field::Absent);
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let envelope: Envelope =
            serde_json::from_str(r#"{"source":"a","key":"b","content":{},"extra":[1,2]}"#)
                .unwrap();
        assert_eq!(envelope.source, Field::Present("a".to_string()));
        assert_eq!(envelope.key, Field::Present("b".to_string()));
        assert_eq!(envelope.content, Field::Present(Content::Object(Map::new())));
    }

    #[test]
    fn test_content_not_object_decodes() {
        let envelope: Envelope = serde_json::from_str(r#"{"content":[1,2,3]}"#).unwrap();
        assert_eq!(
            envelope.content,
            Field::Present(Content::NotObject(json!([1, 2, 3])))
        );
    }

    #[test]
    fn test_wrong_type_fails_decode() {
        assert!(serde_json::from_str::<Envelope>(r#"{"source":5}"#).is_err());
        assert!(serde_json::from_str::<Envelope>(r#"{"key":true}"#).is_err());
    }

    #[test]
    fn test_partial_envelope_serializes_all_keys() {
        let envelope: Envelope = serde_json::from_str(r#"{"key":"login"}"#).unwrap();
        let line = String::from_utf8(envelope.to_line().unwrap()).unwrap();
        assert_eq!(line, r#"{"source":null,"key":"login","content":null}"#);
    }

    #[test]
    fn test_to_value_matches_serialize() {
        let cases = [
            r#"{"source":"a","key":"b","content":{"x":1}}"#,
            r#"{"key":"b","content":"scalar"}"#,
            r#"{}"#,
        ];
        for case in cases {
            let envelope: Envelope = serde_json::from_str(case).unwrap();
            assert_eq!(
                envelope.to_value(),
                serde_json::to_value(&envelope).unwrap(),
                "mismatch for {case}"
            );
        }
    }

    #[test]
    fn test_error_record() {
        let line = Envelope::error("boom").to_line().unwrap();
        assert_eq!(
            String::from_utf8(line).unwrap(),
            r#"{"source":"httpjsonlogger","key":"error","content":{"error":"boom"}}"#
        );
    }

    #[test]
    fn test_error_record_with_orig() {
        let orig: Envelope = serde_json::from_str(r#"{"key":"login","content":{}}"#).unwrap();
        let record = Envelope::error_with_orig("missing 'source' param", &orig).to_value();
        assert_eq!(record["content"]["error"], "missing 'source' param");
        assert_eq!(
            record["content"]["orig"],
            json!({"source": null, "key": "login", "content": {}})
        );
    }

    #[test]
    fn test_listening_record() {
        let record = Envelope::listening("9090").to_value();
        assert_eq!(
            record,
            json!({
                "source": "httpjsonlogger",
                "key": "status",
                "content": {"status": "listening", "port": "9090"}
            })
        );
    }
}
