// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Peer endpoint: accepts connections and dispatches to a [`PeerHandler`]

use super::protocol::{self, ProtocolError, Request, Response, DEFAULT_TIMEOUT};
use super::PeerHandler;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Running peer endpoint
///
/// Dropping the server stops the accept loop; in-flight connections finish.
pub struct PeerServer {
    local_addr: SocketAddr,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl PeerServer {
    /// Serve `handler` on an already bound listener
    pub fn start(listener: TcpListener, handler: Arc<dyn PeerHandler>) -> std::io::Result<Self> {
        let local_addr = listener.local_addr()?;
        let (shutdown, mut stop) = watch::channel(false);

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    accepted = listener.accept() => match accepted {
                        Ok((stream, remote)) => {
                            let handler = Arc::clone(&handler);
                            tokio::spawn(async move {
                                if let Err(e) = handle_connection(handler.as_ref(), stream).await {
                                    debug!(%remote, error = %e, "peer connection failed");
                                }
                            });
                        }
                        Err(e) => warn!(error = %e, "failed to accept peer connection"),
                    },
                    _ = stop.changed() => break,
                }
            }
            debug!(%local_addr, "peer endpoint stopped");
        });

        Ok(Self {
            local_addr,
            shutdown,
            task,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting and wait for the accept loop to exit
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        let _ = self.task.await;
    }
}

/// Serve requests on one connection until the peer closes it
async fn handle_connection(
    handler: &dyn PeerHandler,
    stream: TcpStream,
) -> Result<(), ProtocolError> {
    let (mut reader, mut writer) = stream.into_split();
    loop {
        let request = match protocol::read_request(&mut reader, DEFAULT_TIMEOUT).await {
            Ok(request) => request,
            Err(ProtocolError::ConnectionClosed) => return Ok(()),
            Err(e) => return Err(e),
        };
        debug!(?request, "received peer request");

        let response = handle_request(handler, request).await;
        protocol::write_response(&mut writer, &response, DEFAULT_TIMEOUT).await?;
    }
}

async fn handle_request(handler: &dyn PeerHandler, request: Request) -> Response {
    match request {
        Request::Alive => Response::Alive {
            alive: handler.alive(),
        },
        Request::BucketRequest { requester, context } => {
            match handler.bucket_request(&requester, context.as_ref()).await {
                Ok(response) => Response::Bucket { response },
                Err(e) => Response::Error {
                    message: e.to_string(),
                },
            }
        }
    }
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
