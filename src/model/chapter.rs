// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Talegraph-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Talegraph and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;

use serde::Serialize;
use smallvec::SmallVec;

use super::body::{ensure_body, paragraphs_to_text};
use super::ids::ChapterId;

/// Hard cap on outgoing choices per chapter.
pub const MAX_CHOICES: usize = 3;

/// Inline storage sized for the cap; a chapter never spills to the heap.
pub type Choices = SmallVec<[Choice; MAX_CHOICES]>;

/// Canvas coordinate. Only used for layout; story logic ignores it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// One labeled outgoing edge of a chapter.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Choice {
    text: String,
    next_chapter_id: Option<ChapterId>,
    remember: bool,
}

impl Choice {
    pub fn new(text: impl Into<String>, next_chapter_id: Option<ChapterId>) -> Self {
        Self {
            text: text.into(),
            next_chapter_id,
            remember: false,
        }
    }

    /// A choice with no text and no destination yet.
    pub fn blank() -> Self {
        Self::default()
    }

    pub fn linked_to(next_chapter_id: ChapterId) -> Self {
        Self::new("", Some(next_chapter_id))
    }

    pub fn with_remember(mut self, remember: bool) -> Self {
        self.remember = remember;
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn next_chapter_id(&self) -> Option<&ChapterId> {
        self.next_chapter_id.as_ref()
    }

    pub fn set_next_chapter_id(&mut self, next_chapter_id: Option<ChapterId>) {
        self.next_chapter_id = next_chapter_id;
    }

    pub fn remember(&self) -> bool {
        self.remember
    }

    pub fn set_remember(&mut self, remember: bool) {
        self.remember = remember;
    }

    /// Resolves the destination against the set of live chapter ids.
    pub fn target<'a>(&'a self, is_live: impl Fn(&ChapterId) -> bool) -> ChoiceTarget<'a> {
        match self.next_chapter_id.as_ref() {
            None => ChoiceTarget::Dangling,
            Some(id) if is_live(id) => ChoiceTarget::Live(id),
            Some(id) => ChoiceTarget::Broken(id),
        }
    }

    /// Rewrites the destination if it equals `from`. Returns whether it changed.
    pub(crate) fn retarget(&mut self, from: &ChapterId, to: &ChapterId) -> bool {
        if self.next_chapter_id.as_ref() == Some(from) {
            self.next_chapter_id = Some(to.clone());
            return true;
        }
        false
    }
}

/// Where a choice leads, relative to the chapters that currently exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChoiceTarget<'a> {
    /// No destination picked yet.
    Dangling,
    Live(&'a ChapterId),
    /// Points at a chapter that no longer exists.
    Broken(&'a ChapterId),
}

/// Addresses a single choice: the owning chapter plus its index in `options`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceRef {
    pub chapter_id: ChapterId,
    pub index: usize,
}

impl ChoiceRef {
    pub fn new(chapter_id: ChapterId, index: usize) -> Self {
        Self { chapter_id, index }
    }
}

impl fmt::Display for ChoiceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.chapter_id, self.index)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChoiceLimitExceeded {
    pub len: usize,
}

impl fmt::Display for ChoiceLimitExceeded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "a chapter holds at most {MAX_CHOICES} choices (got {})",
            self.len
        )
    }
}

impl std::error::Error for ChoiceLimitExceeded {}

/// A node of the story graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Chapter {
    chapter_id: ChapterId,
    title: String,
    body: Vec<String>,
    options: Choices,
    position: Position,
    created_at: u64,
    /// Stored choices past the cap that were dropped when the chapter was loaded.
    dropped_choices: usize,
}

impl Chapter {
    /// An empty chapter: no title, one blank paragraph, one blank choice.
    pub fn new(chapter_id: ChapterId, position: Position) -> Self {
        let mut options = Choices::new();
        options.push(Choice::blank());
        Self {
            chapter_id,
            title: String::new(),
            body: vec![String::new()],
            options,
            position,
            created_at: 0,
            dropped_choices: 0,
        }
    }

    /// Rebuilds a chapter from stored fields, repairing an empty body.
    pub fn from_parts(
        chapter_id: ChapterId,
        title: impl Into<String>,
        body: Vec<String>,
        options: Choices,
        position: Position,
        created_at: u64,
    ) -> Result<Self, ChoiceLimitExceeded> {
        if options.len() > MAX_CHOICES {
            return Err(ChoiceLimitExceeded { len: options.len() });
        }
        Ok(Self {
            chapter_id,
            title: title.into(),
            body: ensure_body(body),
            options,
            position,
            created_at,
            dropped_choices: 0,
        })
    }

    pub fn chapter_id(&self) -> &ChapterId {
        &self.chapter_id
    }

    pub(crate) fn set_chapter_id(&mut self, chapter_id: ChapterId) {
        self.chapter_id = chapter_id;
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    /// Title for pickers and lists; untitled chapters fall back to a short id.
    pub fn display_title(&self) -> String {
        if self.title.is_empty() {
            format!("Untitled ({})", self.chapter_id.short(6))
        } else {
            self.title.clone()
        }
    }

    pub fn body(&self) -> &[String] {
        &self.body
    }

    pub fn set_body(&mut self, body: Vec<String>) {
        self.body = ensure_body(body);
    }

    /// The body in its editable single-string form.
    pub fn body_text(&self) -> String {
        paragraphs_to_text(&self.body)
    }

    pub fn options(&self) -> &[Choice] {
        &self.options
    }

    /// Mutable access to existing choices. The slice cannot grow past the cap.
    pub fn options_mut(&mut self) -> &mut [Choice] {
        &mut self.options
    }

    pub fn set_options(&mut self, options: Choices) -> Result<(), ChoiceLimitExceeded> {
        if options.len() > MAX_CHOICES {
            return Err(ChoiceLimitExceeded { len: options.len() });
        }
        self.options = options;
        Ok(())
    }

    pub fn can_add_choice(&self) -> bool {
        self.options.len() < MAX_CHOICES
    }

    pub fn push_choice(&mut self, choice: Choice) -> Result<(), ChoiceLimitExceeded> {
        if !self.can_add_choice() {
            return Err(ChoiceLimitExceeded {
                len: self.options.len() + 1,
            });
        }
        self.options.push(choice);
        Ok(())
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn set_position(&mut self, position: Position) {
        self.position = position;
    }

    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    pub fn set_created_at(&mut self, created_at: u64) {
        self.created_at = created_at;
    }

    /// How many stored choices were cut off at load. The next options write makes the loss
    /// permanent in the store.
    pub fn dropped_choices(&self) -> usize {
        self.dropped_choices
    }

    pub(crate) fn set_dropped_choices(&mut self, dropped: usize) {
        self.dropped_choices = dropped;
    }

    /// Points every choice aimed at `from` to `to` instead. Returns how many changed.
    pub(crate) fn retarget_choices(&mut self, from: &ChapterId, to: &ChapterId) -> usize {
        self.options
            .iter_mut()
            .map(|choice| choice.retarget(from, to))
            .filter(|changed| *changed)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::{Chapter, Choice, ChoiceTarget, Choices, Position, MAX_CHOICES};
    use crate::model::ChapterId;

    fn cid(value: &str) -> ChapterId {
        ChapterId::new(value).expect("chapter id")
    }

    #[test]
    fn new_chapter_is_empty_with_one_blank_choice() {
        let chapter = Chapter::new(cid("c1"), Position::new(100.0, 300.0));

        assert_eq!(chapter.title(), "");
        assert_eq!(chapter.body(), &[String::new()]);
        assert_eq!(chapter.options(), &[Choice::blank()]);
        assert_eq!(chapter.position(), Position::new(100.0, 300.0));
    }

    #[test]
    fn push_choice_stops_at_cap() {
        let mut chapter = Chapter::new(cid("c1"), Position::default());
        while chapter.can_add_choice() {
            chapter.push_choice(Choice::blank()).expect("below cap");
        }

        assert_eq!(chapter.options().len(), MAX_CHOICES);
        let err = chapter.push_choice(Choice::blank()).unwrap_err();
        assert_eq!(err.len, MAX_CHOICES + 1);
        assert_eq!(chapter.options().len(), MAX_CHOICES);
    }

    #[test]
    fn from_parts_rejects_too_many_options_and_repairs_body() {
        let options: Choices = (0..4).map(|_| Choice::blank()).collect();
        assert!(Chapter::from_parts(
            cid("c1"),
            "",
            Vec::new(),
            options,
            Position::default(),
            0
        )
        .is_err());

        let chapter = Chapter::from_parts(
            cid("c1"),
            "Title",
            Vec::new(),
            Choices::new(),
            Position::default(),
            7,
        )
        .expect("chapter");
        assert_eq!(chapter.body(), &[String::new()]);
        assert!(chapter.options().is_empty());
        assert_eq!(chapter.created_at(), 7);
    }

    #[test]
    fn choice_target_distinguishes_dangling_live_and_broken() {
        let live = cid("live");
        let is_live = |id: &ChapterId| id == &live;

        assert_eq!(Choice::blank().target(is_live), ChoiceTarget::Dangling);

        let to_live = Choice::linked_to(cid("live"));
        assert_eq!(to_live.target(is_live), ChoiceTarget::Live(&cid("live")));

        let to_ghost = Choice::linked_to(cid("ghost"));
        assert_eq!(to_ghost.target(is_live), ChoiceTarget::Broken(&cid("ghost")));
    }

    #[test]
    fn retarget_choices_only_touches_matching_choices() {
        let mut chapter = Chapter::new(cid("c1"), Position::default());
        chapter.options_mut()[0].set_next_chapter_id(Some(cid("temp-1")));
        chapter
            .push_choice(Choice::linked_to(cid("other")))
            .expect("push");
        chapter
            .push_choice(Choice::linked_to(cid("temp-1")).with_remember(true))
            .expect("push");

        let changed = chapter.retarget_choices(&cid("temp-1"), &cid("real"));

        assert_eq!(changed, 2);
        assert_eq!(chapter.options()[0].next_chapter_id(), Some(&cid("real")));
        assert_eq!(chapter.options()[1].next_chapter_id(), Some(&cid("other")));
        assert_eq!(chapter.options()[2].next_chapter_id(), Some(&cid("real")));
        assert!(chapter.options()[2].remember());
    }

    #[test]
    fn display_title_falls_back_to_short_id() {
        let mut chapter = Chapter::new(cid("abcdefghij"), Position::default());
        assert_eq!(chapter.display_title(), "Untitled (abcdef)");

        chapter.set_title("The Lighthouse");
        assert_eq!(chapter.display_title(), "The Lighthouse");
    }
}
