// SPDX-FileCopyrightText: 2026 Deckhand Authors
// SPDX-License-Identifier: LicenseRef-Deckhand-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Deckhand and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Model Context Protocol (MCP) server surface.
//!
//! The MCP layer is the crate's tool interface: session lifecycle, edit
//! staging, and commit are all driven through it.

mod server;
mod types;

pub use server::DeckhandMcp;
