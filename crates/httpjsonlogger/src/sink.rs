// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeZone};
use std::fmt::Display;
use std::io;
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use tokio::io::{AsyncWrite, AsyncWriteExt, Stderr, Stdout};
use tokio::sync::Mutex as TokioMutex;

/// Line prefix layout, e.g. `2024/03/07 09:05:02`.
const TIMESTAMP_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// Append-only, line oriented output stream.
///
/// Implementations must write each line in one piece: concurrent callers never
/// see their lines interleaved.
#[async_trait]
pub trait Sink: Send + Sync {
    /// Writes `line` followed by exactly one newline. Trailing newlines already
    /// in `line` are folded into it.
    async fn write_line(&self, line: &[u8]) -> io::Result<()>;
}

/// Sink over any tokio writer, serialized by a mutex.
#[derive(Debug)]
pub struct WriterSink<W> {
    writer: TokioMutex<W>,
    timestamps: bool,
}

impl<W> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: TokioMutex::new(writer),
            timestamps: false,
        }
    }

    /// Prefix every line with the local time, `YYYY/MM/DD HH:MM:SS `.
    pub fn with_timestamps(mut self, enabled: bool) -> Self {
        self.timestamps = enabled;
        self
    }

    #[cfg(test)]
    pub(crate) fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

impl WriterSink<Stdout> {
    pub fn stdout() -> Self {
        Self::new(tokio::io::stdout())
    }
}

impl WriterSink<Stderr> {
    pub fn stderr() -> Self {
        Self::new(tokio::io::stderr())
    }
}

#[async_trait]
impl<W> Sink for WriterSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn write_line(&self, line: &[u8]) -> io::Result<()> {
        let prefix = self.timestamps.then(|| timestamp_prefix(Local::now()));
        let framed = frame_line(prefix.as_deref(), line);

        let mut writer = self.writer.lock().await;
        writer.write_all(&framed).await?;
        writer.flush().await
    }
}

/// In-memory sink, used to capture output in tests and when embedding the
/// logger.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    buffer: Arc<StdMutex<Vec<u8>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, newlines included.
    pub fn contents(&self) -> Vec<u8> {
        self.buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Written lines, without their trailing newline.
    pub fn lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.contents())
            .lines()
            .map(String::from)
            .collect()
    }
}

#[async_trait]
impl Sink for MemorySink {
    async fn write_line(&self, line: &[u8]) -> io::Result<()> {
        let framed = frame_line(None, line);
        self.buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(&framed);
        Ok(())
    }
}

fn timestamp_prefix<Tz>(now: DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    now.format(TIMESTAMP_FORMAT).to_string()
}

fn frame_line(prefix: Option<&str>, line: &[u8]) -> Vec<u8> {
    let mut framed = Vec::with_capacity(line.len() + 21);
    if let Some(prefix) = prefix {
        framed.extend_from_slice(prefix.as_bytes());
        framed.push(b' ');
    }
    let end = line
        .iter()
        .rposition(|&b| b != b'\n')
        .map_or(0, |last| last + 1);
    framed.extend_from_slice(&line[..end]);
    framed.push(b'\n');
    framed
}
