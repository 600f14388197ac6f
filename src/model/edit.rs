// SPDX-FileCopyrightText: 2026 Deckhand Authors
// SPDX-License-Identifier: LicenseRef-Deckhand-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Deckhand and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;

use super::ids::EditId;
use super::slide::SlideLayout;

/// An edit intent together with its operation-specific payload.
///
/// `slide_index` semantics depend on the variant: the resolved target
/// position for `Add`, the committed slide for `Update`/`Delete`, and the
/// source slide for `Reorder`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOp {
    Add {
        index: usize,
        html: String,
        layout: SlideLayout,
    },
    Update {
        index: usize,
        html: String,
    },
    Delete {
        index: usize,
    },
    Reorder {
        from_index: usize,
        to_index: usize,
    },
}

impl EditOp {
    pub fn kind(&self) -> EditOpKind {
        match self {
            Self::Add { .. } => EditOpKind::Add,
            Self::Update { .. } => EditOpKind::Update,
            Self::Delete { .. } => EditOpKind::Delete,
            Self::Reorder { .. } => EditOpKind::Reorder,
        }
    }

    /// The primary target index (source index for `Reorder`).
    pub fn slide_index(&self) -> usize {
        match self {
            Self::Add { index, .. } | Self::Update { index, .. } | Self::Delete { index } => *index,
            Self::Reorder { from_index, .. } => *from_index,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOpKind {
    Add,
    Update,
    Delete,
    Reorder,
}

impl EditOpKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Add => "ADD",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::Reorder => "REORDER",
        }
    }
}

impl fmt::Display for EditOpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A staged, not-yet-applied edit in a session's queue.
///
/// The preview is a one-line human-readable summary generated once at
/// staging time and never recomputed. Committed edits are frozen as-is into
/// the session's audit trail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingEdit {
    edit_id: EditId,
    op: EditOp,
    preview: String,
}

impl PendingEdit {
    pub fn new(edit_id: EditId, op: EditOp, preview: impl Into<String>) -> Self {
        Self {
            edit_id,
            op,
            preview: preview.into(),
        }
    }

    pub fn edit_id(&self) -> &EditId {
        &self.edit_id
    }

    pub fn op(&self) -> &EditOp {
        &self.op
    }

    pub fn preview(&self) -> &str {
        &self.preview
    }
}
