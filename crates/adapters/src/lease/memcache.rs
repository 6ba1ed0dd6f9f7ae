// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Memcached lease store (text protocol)
//!
//! Keys are spread over the configured servers by CRC32 of the key, so every
//! worker of a group agrees on which server owns the group's token. Each server
//! keeps one lazily opened connection that is dropped on any I/O failure and
//! reopened by the next call.

use super::{LeaseError, LeaseStore};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufStream};
use tokio::net::TcpStream;
use tokio::sync::Mutex;

/// Longest key memcached accepts
const MAX_KEY_LEN: usize = 250;

/// Relative expiration times above 30 days are read by memcached as unix timestamps
const MAX_RELATIVE_EXPTIME: u64 = 60 * 60 * 24 * 30;

/// Default per-command timeout
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

type Connection = BufStream<TcpStream>;

struct Server {
    addr: String,
    conn: Mutex<Option<Connection>>,
}

/// Parsed reply to a single command
#[derive(Debug, PartialEq)]
enum Reply {
    Status(String),
    Value(Option<String>),
}

/// Lease store backed by one or more memcached servers
#[derive(Clone)]
pub struct MemcacheLeaseStore {
    servers: Arc<Vec<Server>>,
    timeout: Duration,
}

impl MemcacheLeaseStore {
    /// Create a client for `servers` (`host:port`). No connection is made until
    /// the first command.
    pub fn new<S: AsRef<str>>(servers: &[S]) -> Self {
        let servers = servers
            .iter()
            .map(|addr| Server {
                addr: addr.as_ref().to_string(),
                conn: Mutex::new(None),
            })
            .collect();
        Self {
            servers: Arc::new(servers),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn server_for(&self, key: &str) -> Result<&Server, LeaseError> {
        if self.servers.is_empty() {
            return Err(LeaseError::Rejected("no lease store servers configured".into()));
        }
        let index = crc32fast::hash(key.as_bytes()) as usize % self.servers.len();
        Ok(&self.servers[index])
    }

    async fn command(&self, key: &str, request: &[u8]) -> Result<Reply, LeaseError> {
        validate_key(key)?;
        let server = self.server_for(key)?;
        let mut conn = server.conn.lock().await;

        let result = tokio::time::timeout(self.timeout, server.exchange(&mut conn, request)).await;
        match result {
            Ok(Ok(reply)) => Ok(reply),
            Ok(Err(e)) => {
                *conn = None;
                Err(e)
            }
            Err(_) => {
                *conn = None;
                Err(LeaseError::Timeout(server.addr.clone()))
            }
        }
    }

    async fn store(
        &self,
        verb: &str,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<Reply, LeaseError> {
        let mut request = format!(
            "{} {} 0 {} {}\r\n",
            verb,
            key,
            exptime(ttl),
            value.len()
        )
        .into_bytes();
        request.extend_from_slice(value.as_bytes());
        request.extend_from_slice(b"\r\n");
        self.command(key, &request).await
    }
}

impl Server {
    async fn exchange(
        &self,
        slot: &mut Option<Connection>,
        request: &[u8],
    ) -> Result<Reply, LeaseError> {
        if slot.is_none() {
            let stream = TcpStream::connect(&self.addr)
                .await
                .map_err(|e| self.unavailable(e))?;
            tracing::debug!(server = %self.addr, "connected to lease store");
            *slot = Some(BufStream::new(stream));
        }
        let Some(conn) = slot.as_mut() else {
            return Err(LeaseError::Protocol("connection unavailable".into()));
        };

        conn.write_all(request)
            .await
            .map_err(|e| self.unavailable(e))?;
        conn.flush().await.map_err(|e| self.unavailable(e))?;
        self.read_reply(conn).await
    }

    async fn read_reply(&self, conn: &mut Connection) -> Result<Reply, LeaseError> {
        let line = self.read_line(conn).await?;

        if line == "END" {
            return Ok(Reply::Value(None));
        }
        if let Some(header) = line.strip_prefix("VALUE ") {
            let len = header
                .split_whitespace()
                .nth(2)
                .and_then(|n| n.parse::<usize>().ok())
                .ok_or_else(|| LeaseError::Protocol(format!("malformed value line: {}", line)))?;

            let mut data = vec![0u8; len + 2];
            conn.read_exact(&mut data)
                .await
                .map_err(|e| self.unavailable(e))?;
            if !data.ends_with(b"\r\n") {
                return Err(LeaseError::Protocol("value block not terminated".into()));
            }
            data.truncate(len);
            let value = String::from_utf8(data)
                .map_err(|_| LeaseError::Protocol("value is not utf-8".into()))?;

            let end = self.read_line(conn).await?;
            if end != "END" {
                return Err(LeaseError::Protocol(format!("expected END, got {}", end)));
            }
            return Ok(Reply::Value(Some(value)));
        }
        if line == "ERROR" || line.starts_with("CLIENT_ERROR") || line.starts_with("SERVER_ERROR") {
            return Err(LeaseError::Rejected(line));
        }
        Ok(Reply::Status(line))
    }

    async fn read_line(&self, conn: &mut Connection) -> Result<String, LeaseError> {
        let mut line = String::new();
        let read = conn
            .read_line(&mut line)
            .await
            .map_err(|e| self.unavailable(e))?;
        if read == 0 {
            return Err(self.unavailable(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "connection closed",
            )));
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    fn unavailable(&self, source: std::io::Error) -> LeaseError {
        LeaseError::Unavailable {
            server: self.addr.clone(),
            source,
        }
    }
}

fn validate_key(key: &str) -> Result<(), LeaseError> {
    if key.is_empty()
        || key.len() > MAX_KEY_LEN
        || key.chars().any(|c| c.is_whitespace() || c.is_control())
    {
        return Err(LeaseError::InvalidKey(key.to_string()));
    }
    Ok(())
}

/// Memcached expiration for a TTL: whole seconds rounded up, zero for no expiry
fn exptime(ttl: Duration) -> u64 {
    if ttl.is_zero() {
        return 0;
    }
    let secs = ttl.as_secs() + u64::from(ttl.subsec_nanos() > 0);
    if secs <= MAX_RELATIVE_EXPTIME {
        return secs;
    }
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    now + secs
}

fn unexpected(command: &str, reply: Reply) -> LeaseError {
    LeaseError::Protocol(format!("unexpected reply to {}: {:?}", command, reply))
}

#[async_trait]
impl LeaseStore for MemcacheLeaseStore {
    async fn create_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, LeaseError> {
        match self.store("add", key, value, ttl).await? {
            Reply::Status(s) if s == "STORED" => Ok(true),
            Reply::Status(s) if s == "NOT_STORED" => Ok(false),
            other => Err(unexpected("add", other)),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), LeaseError> {
        match self.store("set", key, value, ttl).await? {
            Reply::Status(s) if s == "STORED" => Ok(()),
            other => Err(unexpected("set", other)),
        }
    }

    async fn get(&self, key: &str) -> Result<Option<String>, LeaseError> {
        let request = format!("get {}\r\n", key);
        match self.command(key, request.as_bytes()).await? {
            Reply::Value(value) => Ok(value),
            other => Err(unexpected("get", other)),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), LeaseError> {
        let request = format!("delete {}\r\n", key);
        match self.command(key, request.as_bytes()).await? {
            Reply::Status(s) if s == "DELETED" || s == "NOT_FOUND" => Ok(()),
            other => Err(unexpected("delete", other)),
        }
    }
}

#[cfg(test)]
#[path = "memcache_tests.rs"]
mod tests;
