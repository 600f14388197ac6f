// SPDX-FileCopyrightText: 2026 Deckhand Authors
// SPDX-License-Identifier: LicenseRef-Deckhand-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Deckhand and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Edit staging and commit processing.
//!
//! Staging appends validated edit intents to a session's queue without
//! touching the committed presentation; commit applies the whole queue in
//! FIFO order with a per-edit skip boundary, re-indexing slides after every
//! structural change. Neither side performs durable writes; persistence is
//! the store's job and happens after commit.

use std::fmt;

use crate::model::{EditId, EditOp, PendingEdit, Presentation, Session, Slide, SlideLayout};

/// The staged edit's identity plus its resolved target index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedEdit {
    pub edit_id: EditId,
    pub slide_index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageError {
    /// The session has no presentation yet (`presentation.create` first).
    NoPresentation,
    /// Index outside `[0, slide_count)` against the committed deck.
    InvalidIndex { index: usize, slide_count: usize },
}

impl fmt::Display for StageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoPresentation => f.write_str("session has no presentation"),
            Self::InvalidIndex { index, slide_count } => {
                write!(f, "invalid slide index {index} (slide_count={slide_count})")
            }
        }
    }
}

impl std::error::Error for StageError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitError {
    NoPresentation,
}

impl fmt::Display for CommitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoPresentation => f.write_str("session has no presentation to commit into"),
        }
    }
}

impl std::error::Error for CommitError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitOutcome {
    /// Edits actually applied; skipped edits are not counted.
    pub applied: usize,
    pub total_slides: usize,
}

/// Stages an ADD. With `position` omitted or at/past the end of the
/// *eventual* deck (committed slides + ADDs already queued), the slide
/// targets the next sequential slot, so a batch of ADDs lands in submission
/// order instead of competing for the current end.
pub fn stage_add(
    session: &mut Session,
    html: String,
    layout: SlideLayout,
    position: Option<usize>,
) -> Result<StagedEdit, StageError> {
    let Some(presentation) = session.presentation() else {
        return Err(StageError::NoPresentation);
    };

    let queued_adds = session
        .pending_edits()
        .iter()
        .filter(|edit| matches!(edit.op(), EditOp::Add { .. }))
        .count();
    let eventual_end = presentation.slide_count() + queued_adds;
    let index = match position {
        Some(position) if position < eventual_end => position,
        _ => eventual_end,
    };

    let edit_id = EditId::generate();
    let preview = format!("Add slide at position {}", index + 1);
    session.pending_edits_mut().push(PendingEdit::new(
        edit_id.clone(),
        EditOp::Add {
            index,
            html,
            layout,
        },
        preview,
    ));

    Ok(StagedEdit {
        edit_id,
        slide_index: index,
    })
}

/// Stages an UPDATE of a committed slide's html. Pending ADDs are not valid
/// targets; the index is validated against the committed deck only.
pub fn stage_update(
    session: &mut Session,
    slide_index: usize,
    html: String,
) -> Result<StagedEdit, StageError> {
    validate_committed_index(session, slide_index)?;

    let edit_id = EditId::generate();
    let preview = format!("Update slide {}", slide_index + 1);
    session.pending_edits_mut().push(PendingEdit::new(
        edit_id.clone(),
        EditOp::Update {
            index: slide_index,
            html,
        },
        preview,
    ));

    Ok(StagedEdit {
        edit_id,
        slide_index,
    })
}

/// Stages a DELETE of a committed slide.
pub fn stage_delete(session: &mut Session, slide_index: usize) -> Result<StagedEdit, StageError> {
    validate_committed_index(session, slide_index)?;

    let edit_id = EditId::generate();
    let preview = format!("Delete slide {}", slide_index + 1);
    session.pending_edits_mut().push(PendingEdit::new(
        edit_id.clone(),
        EditOp::Delete { index: slide_index },
        preview,
    ));

    Ok(StagedEdit {
        edit_id,
        slide_index,
    })
}

/// Stages a REORDER. Both endpoints are validated against the committed
/// deck; out-of-range fails rather than clamping.
pub fn stage_reorder(
    session: &mut Session,
    from_index: usize,
    to_index: usize,
) -> Result<StagedEdit, StageError> {
    validate_committed_index(session, from_index)?;
    validate_committed_index(session, to_index)?;

    let edit_id = EditId::generate();
    let preview = format!("Move slide {} to position {}", from_index + 1, to_index + 1);
    session.pending_edits_mut().push(PendingEdit::new(
        edit_id.clone(),
        EditOp::Reorder {
            from_index,
            to_index,
        },
        preview,
    ));

    Ok(StagedEdit {
        edit_id,
        slide_index: from_index,
    })
}

/// Read-only snapshot of the queue in submission order.
pub fn list_pending(session: &Session) -> &[PendingEdit] {
    session.pending_edits()
}

/// Discards all queued, uncommitted edits. Returns the discarded count.
pub fn reset_queue(session: &mut Session) -> usize {
    let discarded = session.pending_edits().len();
    session.pending_edits_mut().clear();
    discarded
}

/// Applies the full pending queue in FIFO submission order.
///
/// Each edit runs inside its own failure boundary: an edit whose target no
/// longer exists (an earlier edit in the batch shrank the deck) is logged
/// and skipped, and the rest of the batch continues. Afterwards every
/// applied edit is frozen into the audit trail and the queue is cleared
/// unconditionally; skipped edits are dropped, not retried. The caller is
/// responsible for persisting the session afterwards.
pub fn commit_edits(session: &mut Session) -> Result<CommitOutcome, CommitError> {
    if session.presentation().is_none() {
        return Err(CommitError::NoPresentation);
    }

    let edits = std::mem::take(session.pending_edits_mut());
    let mut applied = Vec::with_capacity(edits.len());
    let total_slides;
    {
        let Some(presentation) = session.presentation_mut() else {
            return Err(CommitError::NoPresentation);
        };

        for edit in edits {
            match apply_edit(presentation, &edit) {
                ApplyOutcome::Applied => applied.push(edit),
                ApplyOutcome::Skipped { reason } => {
                    tracing::warn!(
                        edit_id = %edit.edit_id(),
                        operation = %edit.op().kind(),
                        slide_index = edit.op().slide_index(),
                        reason,
                        "skipping edit during commit"
                    );
                }
            }
        }

        total_slides = presentation.slide_count();
    }

    let outcome = CommitOutcome {
        applied: applied.len(),
        total_slides,
    };
    session.applied_edits_mut().append(&mut applied);
    session.touch();

    Ok(outcome)
}

fn validate_committed_index(session: &Session, index: usize) -> Result<(), StageError> {
    let Some(presentation) = session.presentation() else {
        return Err(StageError::NoPresentation);
    };
    let slide_count = presentation.slide_count();
    if index >= slide_count {
        return Err(StageError::InvalidIndex { index, slide_count });
    }
    Ok(())
}

// Extracted per-edit application rules for the commit processor.
include!("ops_impl.rs");
