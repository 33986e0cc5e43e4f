// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

use clap::Parser;
use std::{env, process::ExitCode, sync::Arc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use httpjsonlogger::{Config, Emitter, JsonLogger, Sink, WriterSink};

#[tokio::main]
pub async fn main() -> ExitCode {
    let config = Config::parse();

    // Operator logs go to stderr, which is also the errors sink. They do not
    // take the sink's lock, so when enabled they can interleave with
    // diagnostic records and break the JSON Lines stream. Off by default.
    let log_level = env::var("HTTPJSONLOGGER_LOG_LEVEL")
        .map(|val| val.to_lowercase())
        .unwrap_or("off".to_string());

    let env_filter = format!("h2=off,hyper=off,{}", log_level);

    #[allow(clippy::expect_used)]
    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_new(env_filter).expect("could not parse log level in configuration"),
        )
        .with_writer(std::io::stderr)
        .with_level(true)
        .with_thread_names(false)
        .with_thread_ids(false)
        .with_line_number(false)
        .with_file(false)
        .with_target(true)
        .without_time()
        .finish();

    #[allow(clippy::expect_used)]
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    debug!("Logging subsystem enabled");

    let messages: Arc<dyn Sink> =
        Arc::new(WriterSink::stdout().with_timestamps(config.timestamps));
    let errors: Arc<dyn Sink> = Arc::new(WriterSink::stderr().with_timestamps(config.timestamps));

    let logger = JsonLogger::new(Arc::new(config), Emitter::new(messages, errors));

    let cancel = CancellationToken::new();
    tokio::spawn(shutdown_on_signal(cancel.clone()));

    match logger.start(cancel).await {
        Ok(()) => {
            debug!("httpjsonlogger stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            // already reported on the errors sink
            error!("httpjsonlogger exiting: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn shutdown_on_signal(cancel: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = sigterm.recv() => {},
                }
            }
            Err(e) => {
                error!("Unable to listen for SIGTERM: {e}");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    debug!("Shutdown signal received");
    cancel.cancel();
}
