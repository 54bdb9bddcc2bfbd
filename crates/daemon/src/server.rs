// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Socket server and connection handling.

use ck_core::UserId;
use thiserror::Error;
use tokio::net::UnixStream;
use tracing::{debug, error};

use crate::lifecycle::DaemonState;
use crate::protocol::{self, Request, Response, DEFAULT_TIMEOUT, PROTOCOL_VERSION};

/// Server-level errors
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("request timed out")]
    Timeout,

    #[error("protocol error: {0}")]
    Protocol(#[from] protocol::ProtocolError),
}

/// Handle a single client connection
pub async fn handle_connection(
    daemon: &mut DaemonState,
    stream: UnixStream,
) -> Result<(), ServerError> {
    // Split stream for reading/writing
    let (mut reader, mut writer) = stream.into_split();

    // Read request with timeout
    let request = match protocol::read_request(&mut reader, DEFAULT_TIMEOUT).await {
        Ok(req) => req,
        Err(protocol::ProtocolError::Timeout) => {
            error!("Request read timeout");
            return Err(ServerError::Timeout);
        }
        Err(protocol::ProtocolError::ConnectionClosed) => {
            debug!("Client disconnected before sending request");
            return Ok(());
        }
        Err(e) => {
            error!("Failed to read request: {}", e);
            return Err(ServerError::Protocol(e));
        }
    };

    debug!("Received request: {:?}", request);

    // Handle request
    let response = handle_request(daemon, request).await;

    debug!("Sending response: {:?}", response);

    // Write response with timeout
    protocol::write_response(&mut writer, &response, DEFAULT_TIMEOUT)
        .await
        .map_err(ServerError::Protocol)?;

    Ok(())
}

/// Handle a single request and return a response
async fn handle_request(daemon: &mut DaemonState, request: Request) -> Response {
    match request {
        Request::Ping => Response::Pong,

        Request::Hello { version: _ } => Response::Hello {
            version: PROTOCOL_VERSION.to_string(),
        },

        Request::Message { user_id, text } => {
            match daemon.flow.handle_message(UserId(user_id), &text).await {
                Ok(()) => Response::Ack,
                Err(e) => {
                    error!(user = user_id, error = %e, "failed to handle inbound message");
                    Response::Error {
                        message: e.to_string(),
                    }
                }
            }
        }

        Request::Status => {
            let counts = daemon.store.counts();
            Response::Status {
                uptime_secs: daemon.start_time.elapsed().as_secs(),
                users: counts.users,
                enrollments: counts.enrollments,
                instances: counts.instances,
                answers: counts.answers,
            }
        }

        Request::Shutdown => {
            daemon.shutdown_requested = true;
            Response::ShuttingDown
        }
    }
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
