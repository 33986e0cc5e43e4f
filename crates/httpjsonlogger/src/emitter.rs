// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use serde_json::Value;
use std::fmt::Display;
use std::sync::Arc;
use tracing::error;

use crate::envelope::{Envelope, ERROR_KEY, PROG};
use crate::error::LoggerError;
use crate::sink::Sink;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Messages,
    Errors,
}

/// Owns the messages and errors sinks and writes one line per call.
#[derive(Clone)]
pub struct Emitter {
    messages: Arc<dyn Sink>,
    errors: Arc<dyn Sink>,
}

impl Emitter {
    pub fn new(messages: Arc<dyn Sink>, errors: Arc<dyn Sink>) -> Self {
        Self { messages, errors }
    }

    fn sink(&self, target: Target) -> &dyn Sink {
        match target {
            Target::Messages => self.messages.as_ref(),
            Target::Errors => self.errors.as_ref(),
        }
    }

    /// Writes `line` as is. Write failures are logged and swallowed.
    pub async fn emit_raw(&self, target: Target, line: &[u8]) {
        if let Err(e) = self.sink(target).write_line(line).await {
            error!("Failed to write line to {target:?} sink: {e}");
        }
    }

    /// Serializes `record` and writes it. If serialization fails a fallback
    /// diagnostic without any of the record's content goes to the same sink.
    pub async fn emit(&self, target: Target, record: &Envelope) {
        let line = match record.to_line() {
            Ok(line) => line,
            Err(e) => {
                let err = LoggerError::from(e);
                error!("{err}");
                fallback_line(&err)
            }
        };
        self.emit_raw(target, &line).await;
    }

    /// Writes a diagnostic record with `error` = `message` to the errors sink.
    pub async fn error(&self, message: impl Display) {
        self.emit(Target::Errors, &Envelope::error(message.to_string()))
            .await;
    }
}

fn fallback_line(err: &LoggerError) -> Vec<u8> {
    // Value's Display escapes the message and cannot fail
    format!(
        r#"{{"source":"{PROG}","key":"{ERROR_KEY}","content":{{"error":{}}}}}"#,
        Value::String(err.to_string())
    )
    .into_bytes()
}
