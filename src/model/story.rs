// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Talegraph-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Talegraph and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::HashSet;

use super::chapter::Chapter;
use super::ids::{ChapterId, StoryId};

/// Book-level metadata shown on the dashboard and description pages.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StoryDetails {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub cover_image: Option<String>,
    pub published: bool,
    pub created_at: u64,
}

/// One story: its metadata, its start chapter, and its chapters in creation order.
#[derive(Debug, Clone, PartialEq)]
pub struct Story {
    story_id: StoryId,
    details: StoryDetails,
    start_chapter_id: Option<ChapterId>,
    chapters: Vec<Chapter>,
}

impl Story {
    pub fn new(story_id: StoryId) -> Self {
        Self {
            story_id,
            details: StoryDetails::default(),
            start_chapter_id: None,
            chapters: Vec::new(),
        }
    }

    pub fn with_parts(
        story_id: StoryId,
        details: StoryDetails,
        start_chapter_id: Option<ChapterId>,
        chapters: Vec<Chapter>,
    ) -> Self {
        Self {
            story_id,
            details,
            start_chapter_id,
            chapters,
        }
    }

    pub fn story_id(&self) -> &StoryId {
        &self.story_id
    }

    pub fn details(&self) -> &StoryDetails {
        &self.details
    }

    pub fn details_mut(&mut self) -> &mut StoryDetails {
        &mut self.details
    }

    pub fn start_chapter_id(&self) -> Option<&ChapterId> {
        self.start_chapter_id.as_ref()
    }

    pub fn set_start_chapter_id(&mut self, start_chapter_id: Option<ChapterId>) {
        self.start_chapter_id = start_chapter_id;
    }

    /// True when a start chapter is set but no longer exists.
    pub fn start_chapter_is_dangling(&self) -> bool {
        self.start_chapter_id
            .as_ref()
            .is_some_and(|id| !self.contains_chapter(id))
    }

    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    pub fn chapter(&self, chapter_id: &ChapterId) -> Option<&Chapter> {
        self.chapters.iter().find(|c| c.chapter_id() == chapter_id)
    }

    pub fn chapter_mut(&mut self, chapter_id: &ChapterId) -> Option<&mut Chapter> {
        self.chapters
            .iter_mut()
            .find(|c| c.chapter_id() == chapter_id)
    }

    pub fn chapter_index(&self, chapter_id: &ChapterId) -> Option<usize> {
        self.chapters
            .iter()
            .position(|c| c.chapter_id() == chapter_id)
    }

    pub fn contains_chapter(&self, chapter_id: &ChapterId) -> bool {
        self.chapter_index(chapter_id).is_some()
    }

    pub fn live_chapter_ids(&self) -> HashSet<&ChapterId> {
        self.chapters.iter().map(Chapter::chapter_id).collect()
    }

    pub fn push_chapter(&mut self, chapter: Chapter) {
        self.chapters.push(chapter);
    }

    /// Inserts at `index`, clamped to the end of the list.
    pub fn insert_chapter(&mut self, index: usize, chapter: Chapter) {
        let index = index.min(self.chapters.len());
        self.chapters.insert(index, chapter);
    }

    /// Removes a chapter without touching any other chapter's choices.
    pub fn remove_chapter(&mut self, chapter_id: &ChapterId) -> Option<(usize, Chapter)> {
        let index = self.chapter_index(chapter_id)?;
        Some((index, self.chapters.remove(index)))
    }

    pub(crate) fn chapters_mut(&mut self) -> &mut [Chapter] {
        &mut self.chapters
    }

    /// Largest creation key among the chapters, or 0 for an empty story.
    pub fn latest_created_at(&self) -> u64 {
        self.chapters
            .iter()
            .map(Chapter::created_at)
            .max()
            .unwrap_or(0)
    }
}
