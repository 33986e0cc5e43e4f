// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper::{http, Method, Request, StatusCode};
use serde_json::{json, Value};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::config::Config;
use crate::emitter::{Emitter, Target};
use crate::envelope::Envelope;
use crate::error::LoggerError;
use crate::http_utils::{empty_response, json_response, HttpResponse};
use crate::router::Router;
use crate::validator::Validator;

const MSG_ENDPOINT_PATH: &str = "/msg";
const VARS_ENDPOINT_PATH: &str = "/debug/vars";

const ACCEPT_BACKOFF_MIN: Duration = Duration::from_millis(5);
const ACCEPT_BACKOFF_MAX: Duration = Duration::from_secs(1);
/// How long open connections get to finish their request after cancellation.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Source of accepted connections for the serve loop.
#[async_trait]
trait Listener: Send + Sync {
    type Io: AsyncRead + AsyncWrite + Unpin + Send + 'static;

    async fn accept(&self) -> io::Result<Self::Io>;
}

#[async_trait]
impl Listener for TcpListener {
    type Io = TcpStream;

    async fn accept(&self) -> io::Result<TcpStream> {
        TcpListener::accept(self).await.map(|(stream, _)| stream)
    }
}

/// 5ms doubling up to 1s, restarting after every successful accept.
fn next_accept_backoff(previous: Option<Duration>) -> Duration {
    match previous {
        None => ACCEPT_BACKOFF_MIN,
        Some(delay) => (delay * 2).min(ACCEPT_BACKOFF_MAX),
    }
}

pub struct JsonLogger {
    pub config: Arc<Config>,
    pub emitter: Emitter,
}

impl JsonLogger {
    pub fn new(config: Arc<Config>, emitter: Emitter) -> Self {
        Self { config, emitter }
    }

    /// Announces the configured port on the messages sink, binds, and serves
    /// until `cancel` fires.
    ///
    /// A bind failure is written to the errors sink and returned; it is the
    /// only error that stops the logger.
    pub async fn start(&self, cancel: CancellationToken) -> Result<(), LoggerError> {
        self.emitter
            .emit(Target::Messages, &Envelope::listening(&self.config.port))
            .await;

        let listener = match TcpListener::bind(self.config.listen_address()).await {
            Ok(listener) => listener,
            Err(e) => {
                let err = LoggerError::Bind(e);
                self.emitter.error(&err).await;
                return Err(err);
            }
        };

        debug!(
            "httpjsonlogger started: listening on {}",
            self.config.listen_address()
        );

        self.serve(listener, cancel).await;
        Ok(())
    }

    /// Serves requests on an already bound listener until `cancel` fires.
    ///
    /// Accept failures are reported on the errors sink and retried, so once
    /// bound the logger only stops on cancellation.
    pub async fn serve(&self, listener: TcpListener, cancel: CancellationToken) {
        self.serve_listener(listener, cancel).await
    }

    async fn serve_listener<L: Listener>(&self, listener: L, cancel: CancellationToken) {
        let router = Arc::new(Router::new(
            self.emitter.clone(),
            Validator::new(self.config.content_label()),
            self.config.max_body_bytes,
        ));
        let vars = Arc::new(json!({
            "cmdline": std::env::args().collect::<Vec<String>>(),
            "listen_port": self.config.port,
        }));

        let service = service_fn(move |req| {
            // called for each http request
            let router = Arc::clone(&router);
            let vars = Arc::clone(&vars);
            JsonLogger::endpoint_handler(req, router, vars)
        });

        Self::serve_tcp(listener, service, &self.emitter, cancel).await
    }

    async fn serve_tcp<L, S>(
        listener: L,
        service: S,
        emitter: &Emitter,
        cancel: CancellationToken,
    ) where
        L: Listener,
        S: hyper::service::Service<Request<Incoming>, Response = HttpResponse>
            + Clone
            + Send
            + 'static,
        S::Future: Send,
        S::Error: std::error::Error + Send + Sync + 'static,
    {
        let server = hyper::server::conn::http1::Builder::new();
        let mut joinset = tokio::task::JoinSet::new();
        let mut accept_backoff = None;

        loop {
            let conn = tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("httpjsonlogger shutting down");
                    break;
                },
                con_res = listener.accept() => match con_res {
                    Err(e)
                        if matches!(
                            e.kind(),
                            io::ErrorKind::ConnectionAborted
                                | io::ErrorKind::ConnectionReset
                                | io::ErrorKind::ConnectionRefused
                        ) =>
                    {
                        continue;
                    }
                    Err(e) => {
                        // e.g. EMFILE: keep serving once descriptors free up
                        let delay = next_accept_backoff(accept_backoff);
                        accept_backoff = Some(delay);
                        emitter.error(&LoggerError::Accept(e)).await;
                        tokio::select! {
                            _ = cancel.cancelled() => {},
                            _ = tokio::time::sleep(delay) => {},
                        }
                        continue;
                    }
                    Ok(conn) => {
                        accept_backoff = None;
                        conn
                    }
                },
                finished = async {
                    match joinset.join_next().await {
                        Some(finished) => finished,
                        None => std::future::pending().await,
                    }
                } => match finished {
                    Err(e) if e.is_panic() => {
                        // Don't kill server on panic - log and continue
                        error!("Connection handler panicked: {:?}", e);
                        continue;
                    },
                    Ok(()) | Err(_) => continue,
                },
            };
            let conn = hyper_util::rt::TokioIo::new(conn);
            let server = server.clone();
            let service = service.clone();
            let cancel = cancel.clone();
            joinset.spawn(async move {
                let mut conn = std::pin::pin!(server.serve_connection(conn, service));
                let result = tokio::select! {
                    res = conn.as_mut() => res,
                    _ = cancel.cancelled() => {
                        // finish the request in flight, then close
                        conn.as_mut().graceful_shutdown();
                        conn.await
                    }
                };
                if let Err(e) = result {
                    error!("Connection error: {e}");
                }
            });
        }

        let drained = tokio::time::timeout(SHUTDOWN_GRACE, async {
            while joinset.join_next().await.is_some() {}
        })
        .await;
        if drained.is_err() {
            error!(
                "Aborting {} connections still open after {:?}",
                joinset.len(),
                SHUTDOWN_GRACE
            );
            joinset.shutdown().await;
        }
    }

    async fn endpoint_handler(
        req: Request<Incoming>,
        router: Arc<Router>,
        vars: Arc<Value>,
    ) -> http::Result<HttpResponse> {
        match (req.method(), req.uri().path()) {
            (&Method::POST, MSG_ENDPOINT_PATH) => {
                // the outcome only ever shows up on the sinks
                router.handle_post(req.into_body()).await;
                empty_response(StatusCode::OK)
            }
            (&Method::GET, VARS_ENDPOINT_PATH) => json_response(&vars, StatusCode::OK),
            _ => empty_response(StatusCode::NOT_FOUND),
        }
    }
}
