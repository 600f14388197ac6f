// SPDX-FileCopyrightText: 2026 Deckhand Authors
// SPDX-License-Identifier: LicenseRef-Deckhand-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Deckhand and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Core data model.
//!
//! Sessions own an optional presentation (ordered slides + theme), a queue of
//! staged edits, and an audit trail of committed edits. Pure data; all
//! behavior lives in `ops` and `store`.

pub mod edit;
pub mod ids;
pub mod presentation;
pub mod session;
pub mod slide;

pub use edit::{EditOp, EditOpKind, PendingEdit};
pub use ids::{EditId, Id, IdError, SessionId};
pub use presentation::Presentation;
pub use session::{now_millis, ContextFile, Session};
pub use slide::{Slide, SlideLayout};
