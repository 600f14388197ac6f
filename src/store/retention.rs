// SPDX-FileCopyrightText: 2026 Deckhand Authors
// SPDX-License-Identifier: LicenseRef-Deckhand-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Deckhand and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Retention sweeping.
//!
//! A background task that periodically purges sessions whose last update is
//! older than the retention window. Runs for the lifetime of the process and
//! shuts down cleanly on request without surfacing an error.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::model::now_millis;

use super::session_store::SessionStore;

pub const DEFAULT_RETENTION: Duration = Duration::from_secs(24 * 60 * 60);
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweeperConfig {
    pub interval: Duration,
    pub retention: Duration,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_SWEEP_INTERVAL,
            retention: DEFAULT_RETENTION,
        }
    }
}

/// Handle to the running sweep task.
#[derive(Debug)]
pub struct Sweeper {
    shutdown: Arc<Notify>,
    handle: JoinHandle<()>,
}

impl Sweeper {
    /// Spawns the sweep loop on the current runtime. The first pass runs
    /// immediately, then every `config.interval`.
    pub fn spawn(store: Arc<SessionStore>, config: SweeperConfig) -> Self {
        let shutdown = Arc::new(Notify::new());
        let handle = tokio::spawn(run_sweep_loop(store, config, shutdown.clone()));
        Self { shutdown, handle }
    }

    /// Stops the loop and waits for it to finish. An in-progress sweep pass
    /// runs to completion; cancellation never surfaces an error.
    pub async fn shutdown(self) {
        self.shutdown.notify_one();
        let _ = self.handle.await;
    }
}

async fn run_sweep_loop(store: Arc<SessionStore>, config: SweeperConfig, shutdown: Arc<Notify>) {
    let retention_millis = config.retention.as_millis() as u64;
    let mut ticker = tokio::time::interval(config.interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = shutdown.notified() => break,
            _ = ticker.tick() => {
                let cutoff = now_millis().saturating_sub(retention_millis);
                match store.sweep(cutoff) {
                    Ok(0) => {}
                    Ok(removed) => tracing::info!(removed, "swept expired sessions"),
                    Err(err) => tracing::warn!(error = %err, "session sweep failed"),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{SystemTime, UNIX_EPOCH};

    use super::*;
    use crate::model::SessionId;

    static TEMP_DIR_COUNTER: AtomicUsize = AtomicUsize::new(0);

    struct TempDir {
        path: std::path::PathBuf,
    }

    impl TempDir {
        fn new(prefix: &str) -> Self {
            let nanos =
                SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_nanos();
            let counter = TEMP_DIR_COUNTER.fetch_add(1, Ordering::Relaxed);
            let mut path = std::env::temp_dir();
            path.push(format!(
                "deckhand-{prefix}-{}-{nanos}-{counter}",
                std::process::id()
            ));
            std::fs::create_dir_all(&path).unwrap();
            Self { path }
        }

        fn path(&self) -> &std::path::Path {
            &self.path
        }
    }

    impl Drop for TempDir {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.path);
        }
    }

    #[tokio::test]
    async fn sweeper_purges_expired_sessions_and_shuts_down_cleanly() {
        let tmp = TempDir::new("sweeper");
        let store = Arc::new(SessionStore::open(tmp.path()).expect("open store"));

        let id = SessionId::new("stale").expect("session id");
        store.get_or_create(Some(id.clone())).expect("create");

        // The first interval tick fires immediately; with a zero retention
        // window the session created above is already "stale".
        let sweeper = Sweeper::spawn(
            store.clone(),
            SweeperConfig {
                interval: Duration::from_millis(10),
                retention: Duration::ZERO,
            },
        );

        let mut purged = false;
        for _ in 0..50 {
            tokio::time::sleep(Duration::from_millis(10)).await;
            if store.load(&id).expect("load").is_none() {
                purged = true;
                break;
            }
        }
        assert!(purged, "sweeper should purge the stale session");

        sweeper.shutdown().await;
    }

    #[tokio::test]
    async fn shutdown_before_any_tick_is_clean() {
        let tmp = TempDir::new("sweeper-shutdown");
        let store = Arc::new(SessionStore::open(tmp.path()).expect("open store"));

        let sweeper = Sweeper::spawn(
            store,
            SweeperConfig {
                interval: Duration::from_secs(3600),
                retention: DEFAULT_RETENTION,
            },
        );
        sweeper.shutdown().await;
    }
}
