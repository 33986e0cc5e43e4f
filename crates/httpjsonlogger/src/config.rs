// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use clap::Parser;

use crate::validator::ContentLabel;

const DEFAULT_PORT: &str = "8080";
const DEFAULT_HOST: &str = "0.0.0.0";

/// Accept JSON log envelopes over HTTP and re-emit them as JSON lines.
///
/// Valid envelopes are written to stdout, diagnostics to stderr.
#[derive(Debug, Clone, Parser)]
#[command(name = "httpjsonlogger", version, about)]
pub struct Config {
    /// port to listen on
    #[arg(long, env = "HTTPJSONLOGGER_PORT", default_value = DEFAULT_PORT)]
    pub port: String,

    /// address to listen on
    #[arg(long, env = "HTTPJSONLOGGER_HOST", default_value = DEFAULT_HOST)]
    pub host: String,

    /// reject request bodies larger than this many bytes
    #[arg(long, env = "HTTPJSONLOGGER_MAX_BODY_BYTES")]
    pub max_body_bytes: Option<usize>,

    /// prefix every output line with the local date and time
    #[arg(long, env = "HTTPJSONLOGGER_TIMESTAMPS")]
    pub timestamps: bool,

    /// report a null or non-object `content` as a missing `key`
    #[arg(long, env = "HTTPJSONLOGGER_LEGACY_CONTENT_LABEL")]
    pub legacy_content_label: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT.to_string(),
            host: DEFAULT_HOST.to_string(),
            max_body_bytes: None,
            timestamps: false,
            legacy_content_label: false,
        }
    }
}

impl Config {
    /// `host:port`, resolved when binding. The port is kept textual so an
    /// invalid value surfaces as a bind failure.
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn content_label(&self) -> ContentLabel {
        if self.legacy_content_label {
            ContentLabel::Legacy
        } else {
            ContentLabel::Content
        }
    }
}
