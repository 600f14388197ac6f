// SPDX-FileCopyrightText: 2026 Deckhand Authors
// SPDX-License-Identifier: LicenseRef-Deckhand-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Deckhand and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Durable session persistence.
//!
//! The store module owns the authoritative `session_id -> Session` map: an
//! in-memory cache of live handles plus two durable mirrors (full JSON
//! document, compact SQLite index row) and the retention sweeper that purges
//! stale sessions from all three.

pub mod retention;
pub mod session_store;

pub use retention::{Sweeper, SweeperConfig, DEFAULT_RETENTION, DEFAULT_SWEEP_INTERVAL};
pub use session_store::{SessionHandle, SessionStore, StoreError, WriteDurability};
