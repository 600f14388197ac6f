// SPDX-FileCopyrightText: 2026 Deckhand Authors
// SPDX-License-Identifier: LicenseRef-Deckhand-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Deckhand and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;

/// Predefined slide layouts.
///
/// The set is closed; unknown labels coerce to [`SlideLayout::Blank`] rather
/// than failing, so decks written by newer versions stay loadable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SlideLayout {
    Title,
    TitleContent,
    TwoColumn,
    #[default]
    Blank,
}

impl SlideLayout {
    pub fn label(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::TitleContent => "title_content",
            Self::TwoColumn => "two_column",
            Self::Blank => "blank",
        }
    }

    /// Parses a layout label, coercing anything unrecognized to `Blank`.
    pub fn from_label(label: &str) -> Self {
        match label {
            "title" => Self::Title,
            "title_content" => Self::TitleContent,
            "two_column" => Self::TwoColumn,
            _ => Self::Blank,
        }
    }
}

impl fmt::Display for SlideLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single slide in a presentation.
///
/// `index` must equal the slide's position in its owning presentation's
/// ordered sequence; the commit processor re-establishes this after every
/// structural change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slide {
    index: usize,
    html: String,
    layout: SlideLayout,
    notes: Option<String>,
}

impl Slide {
    pub fn new(index: usize, html: impl Into<String>, layout: SlideLayout) -> Self {
        Self {
            index,
            html: html.into(),
            layout,
            notes: None,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn set_index(&mut self, index: usize) {
        self.index = index;
    }

    /// Opaque content blob; never parsed by this crate.
    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn set_html(&mut self, html: impl Into<String>) {
        self.html = html.into();
    }

    pub fn layout(&self) -> SlideLayout {
        self.layout
    }

    pub fn set_layout(&mut self, layout: SlideLayout) {
        self.layout = layout;
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn set_notes(&mut self, notes: Option<String>) {
        self.notes = notes;
    }
}

#[cfg(test)]
mod tests {
    use super::SlideLayout;

    #[test]
    fn layout_labels_round_trip() {
        for layout in [
            SlideLayout::Title,
            SlideLayout::TitleContent,
            SlideLayout::TwoColumn,
            SlideLayout::Blank,
        ] {
            assert_eq!(SlideLayout::from_label(layout.label()), layout);
        }
    }

    #[test]
    fn unknown_layout_coerces_to_blank() {
        assert_eq!(SlideLayout::from_label("hero_image"), SlideLayout::Blank);
        assert_eq!(SlideLayout::from_label(""), SlideLayout::Blank);
    }
}
