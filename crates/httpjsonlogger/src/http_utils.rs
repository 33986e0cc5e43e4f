// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use bytes::Bytes;
use http_body_util::{BodyExt, Full, Limited};
use hyper::{body::Body, header, http, Response, StatusCode};
use serde_json::Value;
use tracing::debug;

use crate::error::LoggerError;

pub type HttpResponse = Response<Full<Bytes>>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Response with the given status and no body. `/msg` answers every request
/// this way, whatever happened to the payload.
pub fn empty_response(status: StatusCode) -> http::Result<HttpResponse> {
    Response::builder()
        .status(status)
        .body(Full::new(Bytes::new()))
}

/// Returns `body` as a JSON response with the given status code.
pub fn json_response(body: &Value, status: StatusCode) -> http::Result<HttpResponse> {
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Full::new(Bytes::from(body.to_string())))
}

/// Reads the whole request body into memory.
///
/// With `max_bytes` set, a body larger than the limit is a read failure, the
/// same as a connection dropped mid-body.
pub async fn read_body<B>(body: B, max_bytes: Option<usize>) -> Result<Bytes, LoggerError>
where
    B: Body,
    B::Error: Into<BoxError>,
{
    let collected = match max_bytes {
        Some(limit) => Limited::new(body, limit)
            .collect()
            .await
            .map_err(|e| LoggerError::BodyRead(e.to_string()))?,
        None => body.collect().await.map_err(|e| {
            let e: BoxError = e.into();
            LoggerError::BodyRead(e.to_string())
        })?,
    };
    let bytes = collected.to_bytes();
    debug!("Read request body of {} bytes", bytes.len());
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::StreamBody;
    use hyper::body::Frame;
    use std::io;

    async fn response_body_as_string(response: HttpResponse) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_empty_response() {
        let response = empty_response(StatusCode::OK).unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response_body_as_string(response).await, "");
    }

    #[tokio::test]
    async fn test_json_response() {
        let response =
            json_response(&serde_json::json!({"listen_port": "8080"}), StatusCode::OK).unwrap();
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
        assert_eq!(
            response_body_as_string(response).await,
            r#"{"listen_port":"8080"}"#
        );
    }

    #[tokio::test]
    async fn test_read_body() {
        let body = Full::new(Bytes::from_static(b"{\"a\":1}"));
        let bytes = read_body(body, None).await.unwrap();
        assert_eq!(bytes, Bytes::from_static(b"{\"a\":1}"));
    }

    #[tokio::test]
    async fn test_read_body_within_limit() {
        let body = Full::new(Bytes::from_static(b"12345"));
        assert_eq!(read_body(body, Some(5)).await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_read_body_over_limit() {
        let body = Full::new(Bytes::from_static(b"123456"));
        let err = read_body(body, Some(5)).await.unwrap_err();
        assert_eq!(err.to_string(), "error reading body: length limit exceeded");
    }

    #[tokio::test]
    async fn test_read_body_stream_error() {
        let frames: Vec<Result<Frame<Bytes>, io::Error>> = vec![
            Ok(Frame::data(Bytes::from_static(b"{\"partial\""))),
            Err(io::Error::new(io::ErrorKind::UnexpectedEof, "connection reset")),
        ];
        let body = StreamBody::new(futures::stream::iter(frames));
        let err = read_body(body, None).await.unwrap_err();
        assert_eq!(err.to_string(), "error reading body: connection reset");
    }
}
