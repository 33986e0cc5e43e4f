// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use hyper::body::Body;
use tracing::debug;

use crate::emitter::{Emitter, Target};
use crate::envelope::Envelope;
use crate::http_utils::read_body;
use crate::validator::{ValidationError, Validator};

/// Turns `/msg` request bodies into exactly one line on exactly one sink.
#[derive(Clone)]
pub struct Router {
    emitter: Emitter,
    validator: Validator,
    max_body_bytes: Option<usize>,
}

impl Router {
    pub fn new(emitter: Emitter, validator: Validator, max_body_bytes: Option<usize>) -> Self {
        Self {
            emitter,
            validator,
            max_body_bytes,
        }
    }

    /// Reads the whole body and hands it to [`Router::handle_payload`]. A
    /// failed read is reported on the errors sink and nothing else happens.
    pub async fn handle_post<B>(&self, body: B)
    where
        B: Body,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        match read_body(body, self.max_body_bytes).await {
            Ok(payload) => self.handle_payload(&payload).await,
            Err(err) => self.emitter.error(err).await,
        }
    }

    /// Valid payloads are copied byte for byte to the messages sink, invalid
    /// ones produce a diagnostic on the errors sink.
    pub async fn handle_payload(&self, payload: &[u8]) {
        match self.validator.validate(payload) {
            Ok(message) => {
                debug!(
                    "Accepted message from source {} with key {}",
                    message.source, message.key
                );
                self.emitter.emit_raw(Target::Messages, payload).await;
            }
            Err(err) => {
                debug!("Rejected message: {err}");
                let record = match &err {
                    ValidationError::MalformedJson(_) => Envelope::error(err.to_string()),
                    ValidationError::MissingField { orig, .. } => {
                        Envelope::error_with_orig(err.to_string(), orig)
                    }
                };
                self.emitter.emit(Target::Errors, &record).await;
            }
        }
    }
}
