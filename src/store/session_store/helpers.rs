// SPDX-FileCopyrightText: 2026 Deckhand Authors
// SPDX-License-Identifier: LicenseRef-Deckhand-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Deckhand and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

/// Session store helpers: the persisted document JSON shapes, conversion
/// to/from the plain model types, and safe atomic writes inside the data
/// root.
///
/// The document format is stable and self-contained: every field of the
/// session (title, slides in order, theme, both edit lists, attached
/// context, flags, timestamps) so a session can be reconstructed from the
/// document alone.
#[derive(Debug, Serialize, Deserialize)]
struct SessionDocJson {
    session_id: String,
    presentation: Option<PresentationJson>,
    #[serde(default)]
    pending_edits: Vec<PendingEditJson>,
    #[serde(default)]
    applied_edits: Vec<PendingEditJson>,
    #[serde(default)]
    context_files: Vec<ContextFileJson>,
    #[serde(default)]
    style_template: Option<Value>,
    #[serde(default)]
    is_continuation: bool,
    #[serde(default)]
    agent_session_id: Option<String>,
    created_at: u64,
    updated_at: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct PresentationJson {
    title: String,
    #[serde(default)]
    slides: Vec<SlideJson>,
    #[serde(default)]
    theme: std::collections::BTreeMap<String, Value>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SlideJson {
    index: u64,
    html: String,
    #[serde(default)]
    layout: String,
    #[serde(default)]
    notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct PendingEditJson {
    edit_id: String,
    slide_index: u64,
    operation: String,
    #[serde(default)]
    params: Value,
    #[serde(default)]
    preview: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct ContextFileJson {
    filename: String,
    #[serde(default)]
    text: String,
}

fn session_to_doc(session: &Session) -> SessionDocJson {
    SessionDocJson {
        session_id: session.session_id().as_str().to_owned(),
        presentation: session.presentation().map(presentation_to_json),
        pending_edits: session.pending_edits().iter().map(edit_to_json).collect(),
        applied_edits: session.applied_edits().iter().map(edit_to_json).collect(),
        context_files: session
            .context_files()
            .iter()
            .map(|file| ContextFileJson {
                filename: file.filename.clone(),
                text: file.text.clone(),
            })
            .collect(),
        style_template: session.style_template().cloned(),
        is_continuation: session.is_continuation(),
        agent_session_id: session.agent_session_id().map(ToOwned::to_owned),
        created_at: session.created_at_millis(),
        updated_at: session.updated_at_millis(),
    }
}

fn presentation_to_json(presentation: &Presentation) -> PresentationJson {
    PresentationJson {
        title: presentation.title().to_owned(),
        slides: presentation
            .slides()
            .iter()
            .map(|slide| SlideJson {
                index: slide.index() as u64,
                html: slide.html().to_owned(),
                layout: slide.layout().label().to_owned(),
                notes: slide.notes().map(ToOwned::to_owned),
            })
            .collect(),
        theme: presentation.theme().clone(),
    }
}

fn edit_to_json(edit: &PendingEdit) -> PendingEditJson {
    let (operation, params) = match edit.op() {
        EditOp::Add {
            index: _,
            html,
            layout,
        } => (
            "ADD",
            serde_json::json!({ "html": html, "layout": layout.label() }),
        ),
        EditOp::Update { index: _, html } => ("UPDATE", serde_json::json!({ "html": html })),
        EditOp::Delete { index: _ } => ("DELETE", serde_json::json!({})),
        EditOp::Reorder {
            from_index: _,
            to_index,
        } => ("REORDER", serde_json::json!({ "to_index": *to_index as u64 })),
    };

    PendingEditJson {
        edit_id: edit.edit_id().as_str().to_owned(),
        slide_index: edit.op().slide_index() as u64,
        operation: operation.to_owned(),
        params,
        preview: edit.preview().to_owned(),
    }
}

fn session_from_doc(doc: SessionDocJson, path: &Path) -> Result<Session, StoreError> {
    let session_id =
        SessionId::new(doc.session_id.clone()).map_err(|source| StoreError::InvalidId {
            value: doc.session_id.clone(),
            source,
        })?;

    let mut session = Session::new(session_id);
    session.set_presentation(doc.presentation.map(presentation_from_json));

    let mut pending = Vec::with_capacity(doc.pending_edits.len());
    for edit in doc.pending_edits {
        pending.push(edit_from_json(edit, path)?);
    }
    *session.pending_edits_mut() = pending;

    let mut applied = Vec::with_capacity(doc.applied_edits.len());
    for edit in doc.applied_edits {
        applied.push(edit_from_json(edit, path)?);
    }
    *session.applied_edits_mut() = applied;

    session.set_context_files(
        doc.context_files
            .into_iter()
            .map(|file| ContextFile {
                filename: file.filename,
                text: file.text,
            })
            .collect(),
    );
    session.set_style_template(doc.style_template);
    session.set_continuation(doc.is_continuation);
    session.set_agent_session_id(doc.agent_session_id);
    session.set_timestamps(doc.created_at, doc.updated_at);

    Ok(session)
}

fn presentation_from_json(json: PresentationJson) -> Presentation {
    let mut presentation = Presentation::new(json.title);
    *presentation.slides_mut() = json
        .slides
        .into_iter()
        .map(|slide| {
            let mut s = Slide::new(
                slide.index as usize,
                slide.html,
                SlideLayout::from_label(&slide.layout),
            );
            s.set_notes(slide.notes);
            s
        })
        .collect();
    presentation.set_theme(json.theme);
    presentation
}

fn edit_from_json(json: PendingEditJson, path: &Path) -> Result<PendingEdit, StoreError> {
    let edit_id = EditId::new(json.edit_id.clone()).map_err(|source| StoreError::InvalidId {
        value: json.edit_id.clone(),
        source,
    })?;
    let index = json.slide_index as usize;

    let op = match json.operation.as_str() {
        "ADD" => EditOp::Add {
            index,
            html: param_str(&json.params, "html"),
            layout: SlideLayout::from_label(&param_str(&json.params, "layout")),
        },
        "UPDATE" => EditOp::Update {
            index,
            html: param_str(&json.params, "html"),
        },
        "DELETE" => EditOp::Delete { index },
        "REORDER" => EditOp::Reorder {
            from_index: index,
            to_index: json
                .params
                .get("to_index")
                .and_then(Value::as_u64)
                .unwrap_or(0) as usize,
        },
        other => {
            return Err(StoreError::InvalidDocument {
                path: path.to_path_buf(),
                detail: format!("unknown edit operation {other:?}"),
            })
        }
    };

    Ok(PendingEdit::new(edit_id, op, json.preview))
}

fn param_str(params: &Value, key: &str) -> String {
    params
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned()
}

fn validate_relative_path(field: &'static str, path: &Path) -> Result<(), StoreError> {
    if path.as_os_str().is_empty() {
        return Err(StoreError::InvalidRelativePath {
            field,
            value: path.to_path_buf(),
        });
    }

    if path.is_absolute() {
        return Err(StoreError::InvalidRelativePath {
            field,
            value: path.to_path_buf(),
        });
    }

    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir | Component::ParentDir => {
                return Err(StoreError::InvalidRelativePath {
                    field,
                    value: path.to_path_buf(),
                });
            }
            Component::CurDir | Component::Normal(_) => {}
        }
    }

    Ok(())
}

fn to_relative_path(
    root: &Path,
    path: &Path,
    field: &'static str,
) -> Result<PathBuf, StoreError> {
    let relative = if path.is_absolute() {
        path.strip_prefix(root)
            .map(PathBuf::from)
            .map_err(|_| StoreError::PathOutsideRoot {
                root: root.to_path_buf(),
                path: path.to_path_buf(),
            })?
    } else {
        path.to_path_buf()
    };

    validate_relative_path(field, &relative)?;
    Ok(relative)
}

fn create_dir_all_safe(root: &Path, relative: &Path) -> Result<(), StoreError> {
    if relative.as_os_str().is_empty() {
        return Ok(());
    }

    validate_relative_path("dir", relative)?;

    let mut current = root.to_path_buf();
    for component in relative.components() {
        let Component::Normal(part) = component else {
            continue;
        };

        current.push(part);

        match fs::symlink_metadata(&current) {
            Ok(md) => {
                if md.file_type().is_symlink() {
                    return Err(StoreError::SymlinkRefused { path: current });
                }
                if !md.is_dir() {
                    return Err(StoreError::Io {
                        path: current,
                        source: io::Error::new(io::ErrorKind::AlreadyExists, "expected directory"),
                    });
                }
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                fs::create_dir(&current).map_err(|source| StoreError::Io {
                    path: current.clone(),
                    source,
                })?;
            }
            Err(source) => return Err(StoreError::Io { path: current, source }),
        }
    }

    Ok(())
}

fn rename_overwrite(from: &Path, to: &Path) -> io::Result<()> {
    #[cfg(windows)]
    {
        match fs::rename(from, to) {
            Ok(()) => Ok(()),
            Err(err)
                if matches!(
                    err.kind(),
                    io::ErrorKind::AlreadyExists | io::ErrorKind::PermissionDenied
                ) =>
            {
                let _ = fs::remove_file(to);
                fs::rename(from, to)
            }
            Err(err) => Err(err),
        }
    }

    #[cfg(not(windows))]
    {
        fs::rename(from, to)
    }
}

fn write_atomic_in_root(
    root: &Path,
    path: &Path,
    contents: &[u8],
    durability: WriteDurability,
) -> Result<(), StoreError> {
    fs::create_dir_all(root).map_err(|source| StoreError::Io {
        path: root.to_path_buf(),
        source,
    })?;

    let relative = to_relative_path(root, path, "path")?;
    let parent_rel = relative.parent().unwrap_or_else(|| Path::new(""));
    create_dir_all_safe(root, parent_rel)?;

    match fs::symlink_metadata(path) {
        Ok(md) if md.file_type().is_symlink() => {
            return Err(StoreError::SymlinkRefused {
                path: path.to_path_buf(),
            });
        }
        Ok(_) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(source) => {
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    }

    let Some(parent) = path.parent() else {
        return Err(StoreError::Io {
            path: path.to_path_buf(),
            source: io::Error::new(io::ErrorKind::Other, "path has no parent"),
        });
    };

    let Some(file_name) = path.file_name() else {
        return Err(StoreError::Io {
            path: path.to_path_buf(),
            source: io::Error::new(io::ErrorKind::Other, "path has no file name"),
        });
    };

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let tmp_path = parent.join(format!(
        ".deckhand.tmp.{}.{}",
        file_name.to_string_lossy(),
        nanos
    ));

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&tmp_path)
        .map_err(|source| StoreError::Io {
            path: tmp_path.clone(),
            source,
        })?;

    file.write_all(contents).map_err(|source| StoreError::Io {
        path: tmp_path.clone(),
        source,
    })?;

    if durability == WriteDurability::Durable {
        file.sync_all().map_err(|source| StoreError::Io {
            path: tmp_path.clone(),
            source,
        })?;
    }
    drop(file);

    if let Err(source) = rename_overwrite(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(StoreError::Io {
            path: path.to_path_buf(),
            source,
        });
    }

    if durability == WriteDurability::Durable {
        #[cfg(unix)]
        {
            let dir = fs::File::open(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
            dir.sync_all().map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }

    Ok(())
}
