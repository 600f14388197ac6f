// SPDX-FileCopyrightText: 2026 Deckhand Authors
// SPDX-License-Identifier: LicenseRef-Deckhand-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Deckhand and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::Arc;

use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::{Json, Parameters};
use rmcp::model::{ServerCapabilities, ServerInfo};
use rmcp::{tool, tool_handler, tool_router, ErrorData, ServerHandler, ServiceExt};
use tokio::sync::Mutex;

use crate::model::{Presentation, Session, SessionId, SlideLayout};
use crate::ops::{
    commit_edits, list_pending, reset_queue, stage_add, stage_delete, stage_reorder, stage_update,
    CommitError, StageError,
};
use crate::store::{SessionHandle, SessionStore, StoreError};

use super::types::*;

/// The active session bound to this server instance.
///
/// A stateless front end binds one session per MCP connection via
/// `session.open`; every other tool operates on the bound session and fails
/// with a `no_session` error until one is bound.
#[derive(Clone)]
struct ActiveSession {
    session_id: SessionId,
    handle: SessionHandle,
}

#[derive(Clone)]
pub struct DeckhandMcp {
    store: Arc<SessionStore>,
    active: Arc<Mutex<Option<ActiveSession>>>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl DeckhandMcp {
    pub fn new(store: Arc<SessionStore>) -> Self {
        Self {
            store,
            active: Arc::new(Mutex::new(None)),
            tool_router: Self::tool_router(),
        }
    }

    pub async fn serve_stdio(self) -> Result<(), rmcp::RmcpError> {
        let service = self.serve((tokio::io::stdin(), tokio::io::stdout())).await?;
        service.waiting().await?;
        Ok(())
    }

    async fn active_session(&self) -> Result<ActiveSession, ErrorData> {
        let active = self.active.lock().await;
        active.clone().ok_or_else(no_session_error)
    }

    /// Open (or create) a session and bind it as this connection's active
    /// session; start here. All slide/edit tools operate on the bound
    /// session.
    #[tool(name = "session.open")]
    async fn session_open(
        &self,
        params: Parameters<SessionOpenParams>,
    ) -> Result<Json<SessionOpenResponse>, ErrorData> {
        let session_id = match params.0.session_id {
            Some(raw) => Some(SessionId::new(raw.clone()).map_err(|err| {
                ErrorData::invalid_params(
                    format!("invalid session_id: {err}"),
                    Some(serde_json::json!({ "session_id": raw })),
                )
            })?),
            None => None,
        };

        let (handle, created) = self
            .store
            .get_or_create(session_id)
            .map_err(store_error)?;

        let (session_id, response) = {
            let session = handle.lock().await;
            let response = SessionOpenResponse {
                session_id: session.session_id().as_str().to_owned(),
                created,
                is_continuation: session.is_continuation(),
                agent_session_id: session.agent_session_id().map(ToOwned::to_owned),
                context: session_context(&session),
            };
            (session.session_id().clone(), response)
        };

        *self.active.lock().await = Some(ActiveSession { session_id, handle });

        Ok(Json(response))
    }

    /// Reset the active session: a full reset drops the presentation, both
    /// edit lists, and attached context; `soft: true` keeps the committed
    /// presentation and only discards the pending queue.
    #[tool(name = "session.reset")]
    async fn session_reset(
        &self,
        params: Parameters<SessionResetParams>,
    ) -> Result<Json<SessionResetResponse>, ErrorData> {
        let soft = params.0.soft.unwrap_or(false);
        let active = self.active_session().await?;
        let mut session = active.handle.lock().await;

        if soft {
            session.soft_reset();
        } else {
            session.reset();
        }
        self.store.save(&mut session).map_err(store_error)?;
        tracing::info!(session_id = %active.session_id, soft, "session reset");

        Ok(Json(SessionResetResponse {
            soft,
            context: session_context(&session),
        }))
    }

    /// Store the opaque agent-conversation handle on the active session so
    /// a later request can resume the external conversation.
    #[tool(name = "agent.session.set")]
    async fn agent_session_set(
        &self,
        params: Parameters<AgentSessionSetParams>,
    ) -> Result<Json<AgentSessionSetResponse>, ErrorData> {
        let active = self.active_session().await?;
        let mut session = active.handle.lock().await;

        session.set_agent_session_id(Some(params.0.agent_session_id));
        session.set_continuation(true);
        self.store.save(&mut session).map_err(store_error)?;

        Ok(Json(AgentSessionSetResponse {
            context: session_context(&session),
        }))
    }

    /// Attach uploaded-context documents (and optionally a style-reference
    /// blob) to the active session. Carried opaquely and persisted.
    #[tool(name = "context.attach")]
    async fn context_attach(
        &self,
        params: Parameters<ContextAttachParams>,
    ) -> Result<Json<ContextAttachResponse>, ErrorData> {
        let ContextAttachParams {
            files,
            style_template,
        } = params.0;
        let active = self.active_session().await?;
        let mut session = active.handle.lock().await;

        let file_count = files.len() as u64;
        session.set_context_files(
            files
                .into_iter()
                .map(|file| crate::model::ContextFile {
                    filename: file.filename,
                    text: file.text,
                })
                .collect(),
        );
        if style_template.is_some() {
            session.set_style_template(style_template);
        }
        self.store.save(&mut session).map_err(store_error)?;

        Ok(Json(ContextAttachResponse {
            file_count,
            context: session_context(&session),
        }))
    }

    /// Create a new empty presentation with the given title, replacing any
    /// existing one and clearing both edit lists.
    #[tool(name = "presentation.create")]
    async fn presentation_create(
        &self,
        params: Parameters<PresentationCreateParams>,
    ) -> Result<Json<PresentationCreateResponse>, ErrorData> {
        let title = params.0.title;
        let active = self.active_session().await?;
        let mut session = active.handle.lock().await;

        session.set_presentation(Some(Presentation::new(title.clone())));
        session.pending_edits_mut().clear();
        session.applied_edits_mut().clear();
        self.store.save(&mut session).map_err(store_error)?;

        Ok(Json(PresentationCreateResponse {
            title,
            slide_count: 0,
            context: session_context(&session),
        }))
    }

    /// Stage a new slide. The edit is queued, not applied; call
    /// `edits.commit` to apply the queue.
    #[tool(name = "slide.add")]
    async fn slide_add(
        &self,
        params: Parameters<SlideAddParams>,
    ) -> Result<Json<StagedEditResponse>, ErrorData> {
        let SlideAddParams {
            html,
            layout,
            position,
        } = params.0;
        let layout = SlideLayout::from_label(layout.as_deref().unwrap_or("blank"));
        let active = self.active_session().await?;
        let mut session = active.handle.lock().await;

        let staged = stage_add(&mut session, html, layout, position.map(|p| p as usize))
            .map_err(stage_error)?;

        Ok(Json(StagedEditResponse {
            slide_index: staged.slide_index as u64,
            edit_id: staged.edit_id.into_string(),
            context: session_context(&session),
        }))
    }

    /// Stage a replacement of an existing slide's HTML.
    #[tool(name = "slide.update")]
    async fn slide_update(
        &self,
        params: Parameters<SlideUpdateParams>,
    ) -> Result<Json<StagedEditResponse>, ErrorData> {
        let SlideUpdateParams { slide_index, html } = params.0;
        let active = self.active_session().await?;
        let mut session = active.handle.lock().await;

        let staged =
            stage_update(&mut session, slide_index as usize, html).map_err(stage_error)?;

        Ok(Json(StagedEditResponse {
            slide_index: staged.slide_index as u64,
            edit_id: staged.edit_id.into_string(),
            context: session_context(&session),
        }))
    }

    /// Stage the deletion of an existing slide.
    #[tool(name = "slide.delete")]
    async fn slide_delete(
        &self,
        params: Parameters<SlideDeleteParams>,
    ) -> Result<Json<StagedEditResponse>, ErrorData> {
        let slide_index = params.0.slide_index as usize;
        let active = self.active_session().await?;
        let mut session = active.handle.lock().await;

        let staged = stage_delete(&mut session, slide_index).map_err(stage_error)?;

        Ok(Json(StagedEditResponse {
            slide_index: staged.slide_index as u64,
            edit_id: staged.edit_id.into_string(),
            context: session_context(&session),
        }))
    }

    /// Stage moving a slide to a new position. Both indices are validated
    /// against the committed deck.
    #[tool(name = "slide.reorder")]
    async fn slide_reorder(
        &self,
        params: Parameters<SlideReorderParams>,
    ) -> Result<Json<SlideReorderResponse>, ErrorData> {
        let SlideReorderParams {
            from_index,
            to_index,
        } = params.0;
        let active = self.active_session().await?;
        let mut session = active.handle.lock().await;

        let staged = stage_reorder(&mut session, from_index as usize, to_index as usize)
            .map_err(stage_error)?;

        Ok(Json(SlideReorderResponse {
            from_index: from_index as u64,
            to_index: to_index as u64,
            edit_id: staged.edit_id.into_string(),
            context: session_context(&session),
        }))
    }

    /// Read one committed slide in full.
    #[tool(name = "slide.get")]
    async fn slide_get(
        &self,
        params: Parameters<SlideGetParams>,
    ) -> Result<Json<SlideGetResponse>, ErrorData> {
        let slide_index = params.0.slide_index as usize;
        let active = self.active_session().await?;
        let session = active.handle.lock().await;

        let presentation = session.presentation().ok_or_else(no_presentation_error)?;
        let slide = presentation.slides().get(slide_index).ok_or_else(|| {
            invalid_index_error(slide_index, presentation.slide_count())
        })?;

        Ok(Json(SlideGetResponse {
            index: slide.index() as u64,
            html: slide.html().to_owned(),
            layout: slide.layout().label().to_owned(),
            notes: slide.notes().map(ToOwned::to_owned),
            context: session_context(&session),
        }))
    }

    /// List committed slides (index, layout, notes flag). Content previews
    /// are the caller's concern; the HTML is opaque here.
    #[tool(name = "slide.list")]
    async fn slide_list(&self) -> Result<Json<SlideListResponse>, ErrorData> {
        let active = self.active_session().await?;
        let session = active.handle.lock().await;

        let slides = session
            .presentation()
            .map(|presentation| {
                presentation
                    .slides()
                    .iter()
                    .map(|slide| SlideSummary {
                        index: slide.index() as u64,
                        layout: slide.layout().label().to_owned(),
                        has_notes: slide.notes().is_some_and(|notes| !notes.is_empty()),
                    })
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        Ok(Json(SlideListResponse {
            count: slides.len() as u64,
            slides,
            context: session_context(&session),
        }))
    }

    /// Replace the presentation theme (colors/fonts); persisted immediately.
    #[tool(name = "theme.set")]
    async fn theme_set(
        &self,
        params: Parameters<ThemeSetParams>,
    ) -> Result<Json<ThemeSetResponse>, ErrorData> {
        let theme = params.0.theme;
        let active = self.active_session().await?;
        let mut session = active.handle.lock().await;

        let presentation = session
            .presentation_mut()
            .ok_or_else(no_presentation_error)?;
        presentation.set_theme(theme.clone());
        self.store.save(&mut session).map_err(store_error)?;

        Ok(Json(ThemeSetResponse {
            theme,
            context: session_context(&session),
        }))
    }

    /// List queued, uncommitted edits in submission order.
    #[tool(name = "edits.pending")]
    async fn edits_pending(&self) -> Result<Json<PendingEditsResponse>, ErrorData> {
        let active = self.active_session().await?;
        let session = active.handle.lock().await;

        let edits = list_pending(&session)
            .iter()
            .map(|edit| PendingEditSummary {
                edit_id: edit.edit_id().as_str().to_owned(),
                slide_index: edit.op().slide_index() as u64,
                operation: edit.op().kind().label().to_owned(),
                preview: edit.preview().to_owned(),
            })
            .collect::<Vec<_>>();

        Ok(Json(PendingEditsResponse {
            count: edits.len() as u64,
            edits,
            context: session_context(&session),
        }))
    }

    /// Discard all queued edits without applying them.
    #[tool(name = "edits.reset")]
    async fn edits_reset(&self) -> Result<Json<EditsResetResponse>, ErrorData> {
        let active = self.active_session().await?;
        let mut session = active.handle.lock().await;

        let discarded = reset_queue(&mut session) as u64;

        Ok(Json(EditsResetResponse {
            discarded,
            context: session_context(&session),
        }))
    }

    /// Apply the whole pending queue in submission order and persist the
    /// session. Edits whose target vanished mid-batch are skipped, not
    /// fatal; the queue is cleared either way.
    #[tool(name = "edits.commit")]
    async fn edits_commit(&self) -> Result<Json<CommitResponse>, ErrorData> {
        let active = self.active_session().await?;
        let mut session = active.handle.lock().await;

        let outcome = commit_edits(&mut session).map_err(|err| match err {
            CommitError::NoPresentation => no_presentation_error(),
        })?;
        self.store.save(&mut session).map_err(store_error)?;
        tracing::info!(
            session_id = %active.session_id,
            applied = outcome.applied,
            total_slides = outcome.total_slides,
            "committed edit batch"
        );

        Ok(Json(CommitResponse {
            applied_count: outcome.applied as u64,
            total_slides: outcome.total_slides as u64,
            context: session_context(&session),
        }))
    }
}

fn session_context(session: &Session) -> SessionContext {
    SessionContext {
        session_id: session.session_id().as_str().to_owned(),
        has_presentation: session.presentation().is_some(),
        slide_count: session
            .presentation()
            .map(|p| p.slide_count() as u64)
            .unwrap_or(0),
        pending_edits: session.pending_edits().len() as u64,
    }
}

fn no_session_error() -> ErrorData {
    ErrorData::invalid_params(
        "no active session; call session.open first",
        Some(serde_json::json!({ "code": "no_session" })),
    )
}

fn no_presentation_error() -> ErrorData {
    ErrorData::invalid_params(
        "session has no presentation; call presentation.create first",
        Some(serde_json::json!({ "code": "no_presentation" })),
    )
}

fn invalid_index_error(index: usize, slide_count: usize) -> ErrorData {
    ErrorData::invalid_params(
        format!("invalid slide index {index} (slide_count={slide_count})"),
        Some(serde_json::json!({
            "code": "invalid_index",
            "slide_index": index,
            "slide_count": slide_count,
        })),
    )
}

fn stage_error(err: StageError) -> ErrorData {
    match err {
        StageError::NoPresentation => no_presentation_error(),
        StageError::InvalidIndex { index, slide_count } => invalid_index_error(index, slide_count),
    }
}

fn store_error(err: StoreError) -> ErrorData {
    ErrorData::internal_error(format!("session store error: {err}"), None)
}

#[tool_handler]
impl ServerHandler for DeckhandMcp {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Deckhand slide-deck staging server (tools: session.open, session.reset, agent.session.set, context.attach, presentation.create, slide.add, slide.update, slide.delete, slide.reorder, slide.get, slide.list, theme.set, edits.pending, edits.reset, edits.commit). Stage edits, inspect them with edits.pending, then apply and persist with edits.commit."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}
