// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

/// Failures outside of envelope validation.
///
/// The `Display` text of each variant is the `error` description written to
/// the errors sink.
#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    #[error("error reading body: {0}")]
    BodyRead(String),

    #[error("error starting to listen: {0}")]
    Bind(#[source] std::io::Error),

    #[error("error accepting connection: {0}")]
    Accept(#[source] std::io::Error),

    #[error("error marshalling json: {0}")]
    Serialization(#[from] serde_json::Error),
}
