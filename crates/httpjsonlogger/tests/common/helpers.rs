// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Helper functions for integration tests

use bytes::Bytes;
use http_body_util::{BodyExt, Empty, Full};
use httpjsonlogger::{Config, Emitter, JsonLogger, MemorySink};
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

/// A logger serving on an ephemeral localhost port, with in-memory sinks.
pub struct TestLogger {
    pub port: u16,
    pub messages: MemorySink,
    pub errors: MemorySink,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl TestLogger {
    pub async fn start(config: Config) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let port = listener.local_addr().expect("Failed to get local addr").port();

        let messages = MemorySink::new();
        let errors = MemorySink::new();
        let emitter = Emitter::new(Arc::new(messages.clone()), Arc::new(errors.clone()));
        let logger = JsonLogger::new(Arc::new(config), emitter);

        let cancel = CancellationToken::new();
        let serve_cancel = cancel.clone();
        let handle = tokio::spawn(async move { logger.serve(listener, serve_cancel).await });

        Self {
            port,
            messages,
            errors,
            cancel,
            handle,
        }
    }

    pub async fn stop(self) {
        self.cancel.cancel();
        timeout(Duration::from_secs(2), self.handle)
            .await
            .expect("logger did not stop")
            .expect("logger task panicked");
    }
}

/// Send an HTTP request over TCP and return the status and body of the response
pub async fn send_tcp_request(
    port: u16,
    uri: &str,
    method: &str,
    body: Option<Vec<u8>>,
) -> Result<(StatusCode, Bytes), Box<dyn std::error::Error>> {
    let stream = timeout(
        Duration::from_secs(2),
        tokio::net::TcpStream::connect(format!("127.0.0.1:{}", port)),
    )
    .await??;

    let io = TokioIo::new(stream);
    let (mut sender, conn) = hyper::client::conn::http1::handshake(io).await?;

    tokio::spawn(async move {
        let _ = conn.await;
    });

    let request_builder = Request::builder()
        .uri(uri)
        .method(method)
        .header("Host", format!("127.0.0.1:{}", port))
        .header("Content-Type", "application/json");

    let response: Response<hyper::body::Incoming> = if let Some(body_data) = body {
        let request = request_builder
            .header("Content-Length", body_data.len().to_string())
            .body(Full::new(Bytes::from(body_data)).boxed())?;
        timeout(Duration::from_secs(2), sender.send_request(request)).await??
    } else {
        let request = request_builder.body(Empty::<Bytes>::new().boxed())?;
        timeout(Duration::from_secs(2), sender.send_request(request)).await??
    };

    let status = response.status();
    let body = response.into_body().collect().await?.to_bytes();
    Ok((status, body))
}

/// POST `body` to `/msg` and assert the response is an empty 200.
pub async fn post_msg(port: u16, body: &[u8]) {
    let (status, response_body) = send_tcp_request(port, "/msg", "POST", Some(body.to_vec()))
        .await
        .expect("request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(response_body.is_empty());
}

/// Parse every line of a sink as JSON.
pub fn json_lines(sink: &MemorySink) -> Vec<Value> {
    sink.lines()
        .iter()
        .map(|line| serde_json::from_str(line).expect("sink line is not JSON"))
        .collect()
}
