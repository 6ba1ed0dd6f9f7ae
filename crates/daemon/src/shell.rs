// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bucket processor that runs a shell command per bucket

use async_trait::async_trait;
use sq_core::WorkerConfig;
use sq_engine::{BucketProcessor, ProcessError};
use std::process::ExitStatus;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShellError {
    #[error("failed to spawn shell for bucket {bucket}: {source}")]
    Spawn {
        bucket: u32,
        #[source]
        source: std::io::Error,
    },
    #[error("command for bucket {bucket} exited with {status}")]
    Failed { bucket: u32, status: ExitStatus },
}

/// Runs `sh -c <command>` with the bucket in `SQ_BUCKET`
///
/// Without a command, buckets are only logged.
#[derive(Debug, Clone)]
pub struct ShellProcessor {
    command: Option<String>,
    group: String,
    bucket_count: u32,
}

impl ShellProcessor {
    pub fn new(command: Option<String>, config: &WorkerConfig) -> Self {
        Self {
            command,
            group: config.group.name().to_string(),
            bucket_count: config.bucket_count,
        }
    }
}

#[async_trait]
impl BucketProcessor for ShellProcessor {
    async fn process(&self, bucket: u32) -> Result<(), ProcessError> {
        let Some(command) = &self.command else {
            tracing::info!(bucket, "no command configured, skipping");
            return Ok(());
        };

        let output = tokio::process::Command::new("sh")
            .arg("-c")
            .arg(command)
            .env("SQ_BUCKET", bucket.to_string())
            .env("SQ_BUCKET_COUNT", self.bucket_count.to_string())
            .env("SQ_GROUP", &self.group)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| ShellError::Spawn { bucket, source })?;

        if !output.stdout.is_empty() {
            tracing::info!(
                bucket,
                stdout = %String::from_utf8_lossy(&output.stdout),
                "shell stdout"
            );
        }
        if !output.stderr.is_empty() {
            tracing::warn!(
                bucket,
                stderr = %String::from_utf8_lossy(&output.stderr),
                "shell stderr"
            );
        }

        if !output.status.success() {
            return Err(ShellError::Failed {
                bucket,
                status: output.status,
            }
            .into());
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "shell_tests.rs"]
mod tests;
