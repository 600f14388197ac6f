// SPDX-FileCopyrightText: 2026 Deckhand Authors
// SPDX-License-Identifier: LicenseRef-Deckhand-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Deckhand and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Deckhand — slide-deck edit staging and session persistence.
//!
//! Sessions stage slide edits in a queue, apply them atomically on commit,
//! and persist to a per-session JSON document plus a compact SQLite index.
//! The whole surface is exposed as MCP tools.

pub mod mcp;
pub mod model;
pub mod ops;
pub mod store;
