// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Background removal of expired artifacts.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{error, info};

use super::storage::OutputStore;

const SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Upper bound that keeps the cutoff arithmetic in range.
const MAX_RETENTION_HOURS: u64 = 24 * 365 * 100;

/// Sweep `store` once an hour, removing request directories older than
/// `retention_hours`. The first sweep runs immediately.
pub fn spawn_retention(store: Arc<OutputStore>, retention_hours: u64) -> JoinHandle<()> {
    info!(retention_hours, "Retention sweep scheduled");
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
        loop {
            ticker.tick().await;
            let store = Arc::clone(&store);
            let cutoff = Utc::now() - chrono::Duration::hours(retention_hours.min(MAX_RETENTION_HOURS) as i64);
            match tokio::task::spawn_blocking(move || store.sweep_older_than(cutoff)).await {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => error!(error = %e, "Retention sweep failed"),
                Err(e) => error!(error = %e, "Retention sweep task panicked"),
            }
        }
    })
}
