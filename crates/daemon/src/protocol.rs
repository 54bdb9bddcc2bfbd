// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire protocol for the daemon's Unix socket
//!
//! Newline-delimited JSON, one request and one response per connection.
//! `Message` is the inbound path: whatever transport faces the users
//! (a bot-API relay, a test harness) forwards their messages here.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

/// Protocol version for compatibility checks
pub const PROTOCOL_VERSION: &str = "1";

/// Default timeout for socket reads and writes
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Requests a client can send
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    Hello { version: String },
    Ping,
    /// An inbound message from a user on the delivery channel
    Message { user_id: i64, text: String },
    Status,
    Shutdown,
}

/// Responses the daemon sends back
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    Hello {
        version: String,
    },
    Pong,
    Ack,
    Status {
        uptime_secs: u64,
        users: usize,
        enrollments: usize,
        instances: usize,
        answers: usize,
    },
    ShuttingDown,
    Error {
        message: String,
    },
}

/// Protocol-level errors
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("timed out")]
    Timeout,
    #[error("connection closed")]
    ConnectionClosed,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Encode a message as raw JSON (no length prefix; framing is the newline)
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, ProtocolError> {
    Ok(serde_json::to_vec(value)?)
}

/// Decode a message from raw JSON
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ProtocolError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Read one request line under a timeout
pub async fn read_request<R: AsyncRead + Unpin>(
    reader: &mut R,
    timeout: Duration,
) -> Result<Request, ProtocolError> {
    let mut buf = BufReader::new(reader);
    let mut line = String::new();

    match tokio::time::timeout(timeout, buf.read_line(&mut line)).await {
        Err(_) => Err(ProtocolError::Timeout),
        Ok(Ok(0)) => Err(ProtocolError::ConnectionClosed),
        Ok(Ok(_)) => decode(line.trim_end().as_bytes()),
        Ok(Err(e)) => Err(e.into()),
    }
}

/// Write one response line under a timeout
pub async fn write_response<W: AsyncWrite + Unpin>(
    writer: &mut W,
    response: &Response,
    timeout: Duration,
) -> Result<(), ProtocolError> {
    let mut bytes = encode(response)?;
    bytes.push(b'\n');

    match tokio::time::timeout(timeout, async {
        writer.write_all(&bytes).await?;
        writer.flush().await
    })
    .await
    {
        Err(_) => Err(ProtocolError::Timeout),
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(e.into()),
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
