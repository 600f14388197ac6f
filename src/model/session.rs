// SPDX-FileCopyrightText: 2026 Deckhand Authors
// SPDX-License-Identifier: LicenseRef-Deckhand-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Deckhand and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::Value;

use super::edit::PendingEdit;
use super::ids::SessionId;
use super::presentation::Presentation;

/// Milliseconds since the Unix epoch; the timestamp granularity used for
/// `created_at`/`updated_at` and retention cutoffs.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// A context document attached to a session by the external agent runner.
/// Carried and persisted opaquely; never interpreted here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextFile {
    pub filename: String,
    pub text: String,
}

/// The unit of durability, concurrency control, and retention: one user's
/// in-progress presentation plus its staged-edit queue and audit trail.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    session_id: SessionId,
    presentation: Option<Presentation>,
    pending_edits: Vec<PendingEdit>,
    applied_edits: Vec<PendingEdit>,
    context_files: Vec<ContextFile>,
    style_template: Option<Value>,
    is_continuation: bool,
    agent_session_id: Option<String>,
    created_at_millis: u64,
    updated_at_millis: u64,
}

impl Session {
    pub fn new(session_id: SessionId) -> Self {
        let now = now_millis();
        Self {
            session_id,
            presentation: None,
            pending_edits: Vec::new(),
            applied_edits: Vec::new(),
            context_files: Vec::new(),
            style_template: None,
            is_continuation: false,
            agent_session_id: None,
            created_at_millis: now,
            updated_at_millis: now,
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn presentation(&self) -> Option<&Presentation> {
        self.presentation.as_ref()
    }

    pub fn presentation_mut(&mut self) -> Option<&mut Presentation> {
        self.presentation.as_mut()
    }

    pub fn set_presentation(&mut self, presentation: Option<Presentation>) {
        self.presentation = presentation;
    }

    pub fn pending_edits(&self) -> &[PendingEdit] {
        &self.pending_edits
    }

    pub fn pending_edits_mut(&mut self) -> &mut Vec<PendingEdit> {
        &mut self.pending_edits
    }

    /// Append-only audit trail of committed edits; not replayable.
    pub fn applied_edits(&self) -> &[PendingEdit] {
        &self.applied_edits
    }

    pub fn applied_edits_mut(&mut self) -> &mut Vec<PendingEdit> {
        &mut self.applied_edits
    }

    pub fn context_files(&self) -> &[ContextFile] {
        &self.context_files
    }

    pub fn set_context_files(&mut self, context_files: Vec<ContextFile>) {
        self.context_files = context_files;
    }

    pub fn style_template(&self) -> Option<&Value> {
        self.style_template.as_ref()
    }

    pub fn set_style_template(&mut self, style_template: Option<Value>) {
        self.style_template = style_template;
    }

    pub fn is_continuation(&self) -> bool {
        self.is_continuation
    }

    pub fn set_continuation(&mut self, is_continuation: bool) {
        self.is_continuation = is_continuation;
    }

    /// Opaque handle for resuming the external agent conversation.
    pub fn agent_session_id(&self) -> Option<&str> {
        self.agent_session_id.as_deref()
    }

    pub fn set_agent_session_id(&mut self, agent_session_id: Option<String>) {
        self.agent_session_id = agent_session_id;
    }

    pub fn created_at_millis(&self) -> u64 {
        self.created_at_millis
    }

    pub fn updated_at_millis(&self) -> u64 {
        self.updated_at_millis
    }

    pub fn touch(&mut self) {
        self.updated_at_millis = now_millis();
    }

    pub(crate) fn set_timestamps(&mut self, created_at_millis: u64, updated_at_millis: u64) {
        self.created_at_millis = created_at_millis;
        self.updated_at_millis = updated_at_millis;
    }

    /// Full reset: drop the presentation, both edit lists, attached context,
    /// and the continuation flag. The agent handle survives so the caller
    /// can keep its conversation.
    pub fn reset(&mut self) {
        self.presentation = None;
        self.pending_edits.clear();
        self.applied_edits.clear();
        self.context_files.clear();
        self.style_template = None;
        self.is_continuation = false;
        self.touch();
    }

    /// Soft reset: keep the committed presentation, clear the pending queue.
    pub fn soft_reset(&mut self) {
        self.pending_edits.clear();
        self.touch();
    }
}
