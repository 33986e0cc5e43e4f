// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! HTTP ingestion endpoint for JSON log envelopes.
//!
//! Producers POST `{"source", "key", "content"}` envelopes to `/msg`. Valid
//! envelopes are copied verbatim to the messages sink, anything else produces a
//! diagnostic record on the errors sink. Both sinks are JSON-Lines streams.

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

pub mod config;
pub mod emitter;
pub mod envelope;
pub mod error;
pub mod http_utils;
pub mod router;
pub mod server;
pub mod sink;
pub mod validator;

pub use config::Config;
pub use emitter::{Emitter, Target};
pub use envelope::{Content, Envelope, Field, Message};
pub use error::LoggerError;
pub use router::Router;
pub use server::JsonLogger;
pub use sink::{MemorySink, Sink, WriterSink};
pub use validator::{ContentLabel, ValidationError, Validator};
