// SPDX-FileCopyrightText: 2026 Deckhand Authors
// SPDX-License-Identifier: LicenseRef-Deckhand-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Deckhand and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::env;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use rstest::{fixture, rstest};

use super::{SessionStore, StoreError, WriteDurability};
use crate::model::{now_millis, ContextFile, Presentation, Session, SessionId, SlideLayout};
use crate::ops::{commit_edits, stage_add, stage_reorder, stage_update};

static TEMP_DIR_COUNTER: AtomicUsize = AtomicUsize::new(0);

struct TempDir {
    path: std::path::PathBuf,
}

impl TempDir {
    fn new(prefix: &str) -> Self {
        let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_nanos();
        let counter = TEMP_DIR_COUNTER.fetch_add(1, Ordering::Relaxed);
        let mut path = env::temp_dir();
        path.push(format!("deckhand-{prefix}-{}-{nanos}-{counter}", std::process::id()));
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

struct StoreTestCtx {
    tmp: TempDir,
    store: SessionStore,
}

impl StoreTestCtx {
    fn new(prefix: &str) -> Self {
        let tmp = TempDir::new(prefix);
        let store = SessionStore::open(tmp.path().join("data")).expect("open store");
        Self { tmp, store }
    }
}

#[fixture]
fn ctx() -> StoreTestCtx {
    StoreTestCtx::new("session-store")
}

fn sid(value: &str) -> SessionId {
    SessionId::new(value).expect("session id")
}

fn populate(session: &mut Session) {
    session.set_presentation(Some(Presentation::new("Quarterly Review")));
    stage_add(session, "<h1>Intro</h1>".into(), SlideLayout::Title, None).expect("add");
    stage_add(session, "<p>Numbers</p>".into(), SlideLayout::TwoColumn, None).expect("add");
    stage_add(session, "<p>Outro</p>".into(), SlideLayout::Blank, None).expect("add");
    commit_edits(session).expect("commit");

    stage_update(session, 1, "<p>Better numbers</p>".into()).expect("update");
    stage_reorder(session, 0, 2).expect("reorder");

    if let Some(presentation) = session.presentation_mut() {
        let mut theme = std::collections::BTreeMap::new();
        theme.insert("primary".to_owned(), serde_json::json!("#1a73e8"));
        theme.insert("font_scale".to_owned(), serde_json::json!(1.25));
        presentation.set_theme(theme);
    }
    if let Some(slide) = session
        .presentation_mut()
        .and_then(|p| p.slides_mut().get_mut(0))
    {
        slide.set_notes(Some("welcome everyone".to_owned()));
    }

    session.set_context_files(vec![ContextFile {
        filename: "notes.md".to_owned(),
        text: "q3 revenue up".to_owned(),
    }]);
    session.set_style_template(Some(serde_json::json!({
        "filename": "brand.pptx",
        "text": "dark corporate",
    })));
    session.set_continuation(true);
    session.set_agent_session_id(Some("conv-42".to_owned()));
}

#[rstest]
fn get_or_create_generates_an_id_when_none_given(ctx: StoreTestCtx) {
    let (handle, created) = ctx.store.get_or_create(None).expect("get_or_create");
    assert!(created);
    let session = handle.blocking_lock();
    assert!(!session.session_id().as_str().is_empty());
    assert!(session.presentation().is_none());
}

#[rstest]
fn get_or_create_returns_cached_handle_for_known_id(ctx: StoreTestCtx) {
    let id = sid("alpha");
    let (first, created) = ctx.store.get_or_create(Some(id.clone())).expect("create");
    assert!(created);

    let (second, created_again) = ctx.store.get_or_create(Some(id)).expect("reuse");
    assert!(!created_again);
    assert!(std::sync::Arc::ptr_eq(&first, &second));
}

#[rstest]
fn new_sessions_are_written_to_both_mirrors(ctx: StoreTestCtx) {
    let id = sid("fresh");
    ctx.store.get_or_create(Some(id.clone())).expect("create");

    let doc_path = ctx
        .store
        .root()
        .join("sessions")
        .join("fresh")
        .join("session.json");
    assert!(doc_path.is_file());

    // Index row exists: a zero-cutoff sweep finds nothing, a future-cutoff
    // sweep finds exactly this session.
    assert_eq!(ctx.store.sweep(0).expect("sweep"), 0);
    assert_eq!(ctx.store.sweep(now_millis() + 1_000).expect("sweep"), 1);
}

#[rstest]
fn save_then_reload_round_trips_the_full_session(ctx: StoreTestCtx) {
    let id = sid("round-trip");
    let (handle, _) = ctx.store.get_or_create(Some(id.clone())).expect("create");

    let snapshot = {
        let mut session = handle.blocking_lock();
        populate(&mut session);
        ctx.store.save(&mut session).expect("save");
        session.clone()
    };

    ctx.store.evict_cached(&id);
    let reloaded = ctx.store.load(&id).expect("load").expect("found");
    let reloaded = reloaded.blocking_lock();

    assert_eq!(*reloaded, snapshot);
    let presentation = reloaded.presentation().expect("presentation");
    assert_eq!(presentation.title(), "Quarterly Review");
    assert_eq!(presentation.slide_count(), 3);
    assert!(presentation.indices_are_dense());
    assert_eq!(presentation.slides()[0].notes(), Some("welcome everyone"));
    assert_eq!(reloaded.pending_edits().len(), 2);
    assert_eq!(reloaded.applied_edits().len(), 3);
    assert_eq!(reloaded.agent_session_id(), Some("conv-42"));
    assert!(reloaded.is_continuation());
}

#[rstest]
fn save_stamps_updated_at(ctx: StoreTestCtx) {
    let (handle, _) = ctx.store.get_or_create(Some(sid("stamped"))).expect("create");
    let mut session = handle.blocking_lock();
    let before = session.updated_at_millis();

    std::thread::sleep(std::time::Duration::from_millis(5));
    ctx.store.save(&mut session).expect("save");
    assert!(session.updated_at_millis() > before);
}

#[rstest]
fn load_of_unknown_session_returns_none(ctx: StoreTestCtx) {
    assert!(ctx.store.load(&sid("missing")).expect("load").is_none());
}

#[rstest]
fn corrupt_document_is_treated_as_not_found(ctx: StoreTestCtx) {
    let id = sid("corrupt");
    ctx.store.get_or_create(Some(id.clone())).expect("create");
    ctx.store.evict_cached(&id);

    let doc_path = ctx
        .store
        .root()
        .join("sessions")
        .join("corrupt")
        .join("session.json");
    std::fs::write(&doc_path, b"{ not json").unwrap();

    assert!(ctx.store.load(&id).expect("load").is_none());

    // get_or_create falls through to creating a fresh session under the
    // same id instead of failing.
    let (handle, created) = ctx.store.get_or_create(Some(id)).expect("recreate");
    assert!(created);
    assert!(handle.blocking_lock().presentation().is_none());
}

#[rstest]
fn unknown_layout_label_in_document_coerces_to_blank(ctx: StoreTestCtx) {
    let id = sid("layouts");
    let (handle, _) = ctx.store.get_or_create(Some(id.clone())).expect("create");
    {
        let mut session = handle.blocking_lock();
        session.set_presentation(Some(Presentation::new("deck")));
        stage_add(&mut session, "x".into(), SlideLayout::Title, None).expect("add");
        commit_edits(&mut session).expect("commit");
        ctx.store.save(&mut session).expect("save");
    }
    ctx.store.evict_cached(&id);

    let doc_path = ctx
        .store
        .root()
        .join("sessions")
        .join("layouts")
        .join("session.json");
    let raw = std::fs::read_to_string(&doc_path).unwrap();
    let patched = raw.replace("\"title\",", "\"holographic\",");
    assert_ne!(raw, patched);
    std::fs::write(&doc_path, patched).unwrap();

    let reloaded = ctx.store.load(&id).expect("load").expect("found");
    let reloaded = reloaded.blocking_lock();
    assert_eq!(
        reloaded.presentation().expect("presentation").slides()[0].layout(),
        SlideLayout::Blank
    );
}

#[rstest]
fn sweep_removes_expired_sessions_and_is_idempotent(ctx: StoreTestCtx) {
    let stale = sid("stale");
    let live = sid("live");
    ctx.store.get_or_create(Some(stale.clone())).expect("create stale");

    // Make the second session's updated_at strictly newer than the cutoff
    // we'll use.
    std::thread::sleep(std::time::Duration::from_millis(5));
    let cutoff = now_millis();
    std::thread::sleep(std::time::Duration::from_millis(5));
    ctx.store.get_or_create(Some(live.clone())).expect("create live");

    assert_eq!(ctx.store.sweep(cutoff).expect("sweep"), 1);
    assert!(ctx.store.load(&stale).expect("load").is_none());
    assert!(ctx.store.load(&live).expect("load").is_some());
    assert!(!ctx.store.root().join("sessions").join("stale").exists());

    // Second pass over the same cutoff: nothing left to do.
    assert_eq!(ctx.store.sweep(cutoff).expect("sweep"), 0);
}

#[rstest]
fn sweep_evicts_cached_handles_before_touching_disk(ctx: StoreTestCtx) {
    let id = sid("checked-out");
    let (handle, _) = ctx.store.get_or_create(Some(id.clone())).expect("create");

    // A caller may still hold the handle while the sweep runs; the cache
    // entry, document dir, and index row all go regardless.
    assert_eq!(ctx.store.sweep(now_millis() + 1_000).expect("sweep"), 1);
    assert!(ctx.store.load(&id).expect("load").is_none());
    assert!(!ctx.store.root().join("sessions").join("checked-out").exists());

    // The held handle keeps its session alive in memory only; a re-open
    // under the same id starts fresh.
    assert!(handle.blocking_lock().presentation().is_none());
    let (_, created) = ctx.store.get_or_create(Some(id)).expect("recreate");
    assert!(created);
}

#[rstest]
fn sweep_with_missing_document_dir_still_drops_the_index_row(ctx: StoreTestCtx) {
    let id = sid("ghost");
    ctx.store.get_or_create(Some(id.clone())).expect("create");
    std::fs::remove_dir_all(ctx.store.root().join("sessions").join("ghost")).unwrap();

    assert_eq!(ctx.store.sweep(now_millis() + 1_000).expect("sweep"), 1);
    assert_eq!(ctx.store.sweep(now_millis() + 1_000).expect("sweep"), 0);
}

#[rstest]
fn store_reopen_recovers_sessions_from_documents(ctx: StoreTestCtx) {
    let id = sid("durable");
    {
        let (handle, _) = ctx.store.get_or_create(Some(id.clone())).expect("create");
        let mut session = handle.blocking_lock();
        populate(&mut session);
        ctx.store.save(&mut session).expect("save");
    }

    let reopened = SessionStore::open(ctx.store.root()).expect("reopen");
    let handle = reopened.load(&id).expect("load").expect("found");
    let session = handle.blocking_lock();
    assert_eq!(
        session.presentation().expect("presentation").title(),
        "Quarterly Review"
    );
}

#[rstest]
fn durable_writes_mode_round_trips(ctx: StoreTestCtx) {
    let store = SessionStore::open_with_durability(
        ctx.tmp.path().join("durable-data"),
        WriteDurability::Durable,
    )
    .expect("open store");
    assert_eq!(store.durability(), WriteDurability::Durable);

    let id = sid("synced");
    let (handle, _) = store.get_or_create(Some(id.clone())).expect("create");
    {
        let mut session = handle.blocking_lock();
        session.set_presentation(Some(Presentation::new("deck")));
        store.save(&mut session).expect("save");
    }
    store.evict_cached(&id);
    assert!(store.load(&id).expect("load").is_some());
}

#[rstest]
fn document_write_refuses_symlinked_target(ctx: StoreTestCtx) {
    #[cfg(unix)]
    {
        let id = sid("linked");
        ctx.store.get_or_create(Some(id.clone())).expect("create");

        let doc_path = ctx
            .store
            .root()
            .join("sessions")
            .join("linked")
            .join("session.json");
        let outside = ctx.tmp.path().join("outside.json");
        std::fs::write(&outside, b"{}").unwrap();
        std::fs::remove_file(&doc_path).unwrap();
        std::os::unix::fs::symlink(&outside, &doc_path).unwrap();

        ctx.store.evict_cached(&id);
        // The symlinked "{}" document fails to decode, so the lookup falls
        // through to re-creating the session, and the write path must
        // refuse to write through the symlink.
        let err = ctx.store.get_or_create(Some(id)).unwrap_err();
        assert!(matches!(err, StoreError::SymlinkRefused { .. }));
    }
}
