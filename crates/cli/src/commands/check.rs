// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Config validation

use anyhow::{Context, Result};
use sq_core::WorkerConfig;
use std::path::Path;

pub fn check(path: &Path) -> Result<()> {
    let config =
        WorkerConfig::load(path).with_context(|| format!("{} is not valid", path.display()))?;

    println!(
        "{}: group {}, {} buckets, iteration {}, dictatorship {}, {} lease server(s), {} peer(s)",
        path.display(),
        config.group,
        config.bucket_count,
        humantime::format_duration(config.iteration_length),
        humantime::format_duration(config.dictatorship_length()),
        config.servers.len(),
        config.peers.len()
    );
    Ok(())
}
