// SPDX-FileCopyrightText: 2026 Deckhand Authors
// SPDX-License-Identifier: LicenseRef-Deckhand-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Deckhand and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ApplyOutcome {
    Applied,
    Skipped { reason: &'static str },
}

/// Applies one edit to the presentation.
///
/// Indices are checked against the deck as it stands *now*, not as it stood
/// at staging time: earlier edits in the same batch may have shifted or
/// shrunk it. Out-of-range targets are skips, not errors.
fn apply_edit(presentation: &mut Presentation, edit: &PendingEdit) -> ApplyOutcome {
    match edit.op() {
        EditOp::Add {
            index,
            html,
            layout,
        } => {
            let slide = Slide::new(*index, html.clone(), *layout);
            let slides = presentation.slides_mut();
            if *index >= slides.len() {
                slides.push(slide);
            } else {
                slides.insert(*index, slide);
            }
            presentation.reindex();
            ApplyOutcome::Applied
        }
        EditOp::Update { index, html } => {
            let slides = presentation.slides_mut();
            match slides.get_mut(*index) {
                Some(slide) => {
                    slide.set_html(html.clone());
                    ApplyOutcome::Applied
                }
                None => ApplyOutcome::Skipped {
                    reason: "update target out of range",
                },
            }
        }
        EditOp::Delete { index } => {
            let slides = presentation.slides_mut();
            if *index >= slides.len() {
                return ApplyOutcome::Skipped {
                    reason: "delete target out of range",
                };
            }
            slides.remove(*index);
            presentation.reindex();
            ApplyOutcome::Applied
        }
        EditOp::Reorder {
            from_index,
            to_index,
        } => {
            let slides = presentation.slides_mut();
            if *from_index >= slides.len() {
                return ApplyOutcome::Skipped {
                    reason: "reorder source out of range",
                };
            }
            let slide = slides.remove(*from_index);
            // A destination past the end (possible after earlier deletes in
            // the batch) appends, mirroring insert-at-arbitrary-position
            // list semantics.
            let destination = (*to_index).min(slides.len());
            slides.insert(destination, slide);
            presentation.reindex();
            ApplyOutcome::Applied
        }
    }
}
