// SPDX-FileCopyrightText: 2026 Deckhand Authors
// SPDX-License-Identifier: LicenseRef-Deckhand-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Deckhand and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeMap;

use serde_json::Value;

use super::slide::Slide;

/// A complete presentation: a title, an ordered slide sequence, and an open
/// theme map (colors/fonts) that this crate carries opaquely.
///
/// Invariant: `slides[i].index() == i` for all `i` after every commit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Presentation {
    title: String,
    slides: Vec<Slide>,
    theme: BTreeMap<String, Value>,
}

impl Presentation {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            slides: Vec::new(),
            theme: BTreeMap::new(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    pub fn slides_mut(&mut self) -> &mut Vec<Slide> {
        &mut self.slides
    }

    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    pub fn theme(&self) -> &BTreeMap<String, Value> {
        &self.theme
    }

    pub fn set_theme(&mut self, theme: BTreeMap<String, Value>) {
        self.theme = theme;
    }

    /// Recomputes every slide's `index` to match its position in the
    /// sequence. Called after any structural change (add/delete/reorder).
    pub fn reindex(&mut self) {
        for (i, slide) in self.slides.iter_mut().enumerate() {
            slide.set_index(i);
        }
    }

    /// Checks the dense-index invariant; commit asserts it in tests.
    pub fn indices_are_dense(&self) -> bool {
        self.slides.iter().enumerate().all(|(i, s)| s.index() == i)
    }
}
