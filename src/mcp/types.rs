// SPDX-FileCopyrightText: 2026 Deckhand Authors
// SPDX-License-Identifier: LicenseRef-Deckhand-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Deckhand and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Echo of the active session's shape, attached to every tool response so
/// the caller can track state without extra round trips.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SessionContext {
    pub session_id: String,
    pub has_presentation: bool,
    pub slide_count: u64,
    pub pending_edits: u64,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SessionOpenParams {
    /// Resume this session if it exists; otherwise create it. Omit to
    /// create a session with a generated id.
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SessionOpenResponse {
    pub session_id: String,
    pub created: bool,
    pub is_continuation: bool,
    pub agent_session_id: Option<String>,
    pub context: SessionContext,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SessionResetParams {
    /// Soft reset keeps the committed presentation and only clears the
    /// pending queue; a full reset (default) drops everything.
    pub soft: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SessionResetResponse {
    pub soft: bool,
    pub context: SessionContext,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct AgentSessionSetParams {
    /// Opaque handle for resuming the external agent conversation.
    pub agent_session_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AgentSessionSetResponse {
    pub context: SessionContext,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ContextFileParam {
    pub filename: String,
    pub text: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ContextAttachParams {
    pub files: Vec<ContextFileParam>,
    /// Opaque style-reference blob, carried as-is.
    pub style_template: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ContextAttachResponse {
    pub file_count: u64,
    pub context: SessionContext,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct PresentationCreateParams {
    pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PresentationCreateResponse {
    pub title: String,
    pub slide_count: u64,
    pub context: SessionContext,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SlideAddParams {
    /// Raw slide HTML; stored opaquely.
    pub html: String,
    /// One of `title`, `title_content`, `two_column`, `blank`. Unknown
    /// values fall back to `blank`.
    pub layout: Option<String>,
    /// Target position; defaults to the end of the eventual deck
    /// (committed slides plus already-queued adds).
    pub position: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct StagedEditResponse {
    pub slide_index: u64,
    pub edit_id: String,
    pub context: SessionContext,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SlideUpdateParams {
    pub slide_index: u32,
    pub html: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SlideDeleteParams {
    pub slide_index: u32,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SlideReorderParams {
    pub from_index: u32,
    pub to_index: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SlideReorderResponse {
    pub from_index: u64,
    pub to_index: u64,
    pub edit_id: String,
    pub context: SessionContext,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SlideGetParams {
    pub slide_index: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SlideGetResponse {
    pub index: u64,
    pub html: String,
    pub layout: String,
    pub notes: Option<String>,
    pub context: SessionContext,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SlideSummary {
    pub index: u64,
    pub layout: String,
    pub has_notes: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SlideListResponse {
    pub slides: Vec<SlideSummary>,
    pub count: u64,
    pub context: SessionContext,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ThemeSetParams {
    /// Open mapping of theme keys (colors, fonts) to arbitrary values.
    pub theme: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ThemeSetResponse {
    pub theme: BTreeMap<String, Value>,
    pub context: SessionContext,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PendingEditSummary {
    pub edit_id: String,
    pub slide_index: u64,
    pub operation: String,
    pub preview: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PendingEditsResponse {
    pub edits: Vec<PendingEditSummary>,
    pub count: u64,
    pub context: SessionContext,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EditsResetResponse {
    pub discarded: u64,
    pub context: SessionContext,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CommitResponse {
    pub applied_count: u64,
    pub total_slides: u64,
    pub context: SessionContext,
}
