// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use serde::Deserialize;
use serde_json::Value;

use crate::envelope::{Content, Envelope, Field, Message};

/// Which field name a bad `content` is reported under.
///
/// Earlier deployments of this logger reported a null, absent or non-object
/// `content` as a missing `key`. `Legacy` keeps that label for consumers that
/// match on it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ContentLabel {
    #[default]
    Content,
    Legacy,
}

impl ContentLabel {
    fn field_name(self) -> &'static str {
        match self {
            ContentLabel::Content => "content",
            ContentLabel::Legacy => "key",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    /// The payload is not JSON, not an object, or a field has the wrong type.
    #[error("error reading json: {0}")]
    MalformedJson(String),

    /// The payload decoded but a required field is missing. `orig` is what
    /// was decoded.
    #[error("missing '{name}' param")]
    MissingField { name: &'static str, orig: Envelope },
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Validator {
    content_label: ContentLabel,
}

impl Validator {
    pub fn new(content_label: ContentLabel) -> Self {
        Self { content_label }
    }

    /// Decodes `raw` and checks `source`, `key` and `content`, in that order.
    /// Only the first missing field is reported.
    pub fn validate(&self, raw: &[u8]) -> Result<Message, ValidationError> {
        match decode(raw)? {
            Envelope {
                source: Field::Present(source),
                key: Field::Present(key),
                content: Field::Present(Content::Object(content)),
            } => Ok(Message {
                source,
                key,
                content,
            }),
            orig => Err(ValidationError::MissingField {
                name: self.first_missing(&orig),
                orig,
            }),
        }
    }

    fn first_missing(&self, envelope: &Envelope) -> &'static str {
        if !envelope.source.is_present() {
            "source"
        } else if !envelope.key.is_present() {
            "key"
        } else {
            self.content_label.field_name()
        }
    }
}

/// Strict JSON decode into a possibly incomplete envelope.
///
/// A top-level `null` decodes to an envelope with every field absent.
pub fn decode(raw: &[u8]) -> Result<Envelope, ValidationError> {
    let value: Value = serde_json::from_slice(raw)
        .map_err(|err| ValidationError::MalformedJson(err.to_string()))?;
    match value {
        Value::Null => Ok(Envelope::default()),
        Value::Object(_) => Envelope::deserialize(value)
            .map_err(|err| ValidationError::MalformedJson(err.to_string())),
        other => Err(ValidationError::MalformedJson(format!(
            "invalid type: {}, expected a message envelope object",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
