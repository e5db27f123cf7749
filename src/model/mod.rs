// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Talegraph-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Talegraph and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Core story-graph types.
//!
//! A story owns chapters; chapters own up to three choices that point at other chapters.

pub mod body;
pub mod chapter;
#[cfg(test)]
pub(crate) mod fixtures;
pub mod ids;
pub mod story;

pub use body::{normalize_paragraphs, paragraphs_to_text, PARAGRAPH_DELIMITER};
pub use chapter::{
    Chapter, Choice, ChoiceLimitExceeded, ChoiceRef, ChoiceTarget, Choices, Position, MAX_CHOICES,
};
pub use ids::{ChapterId, Id, IdError, StoryId};
pub use story::{Story, StoryDetails};
