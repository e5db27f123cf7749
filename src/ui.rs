// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Talegraph-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Talegraph and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Selection and focus state for the editing surface.
//!
//! At most one thing is selected: a chapter or a single choice. Selecting a chapter opens an
//! edit buffer holding a *copy* of its title, body, and options, so unsaved edits never
//! reach the graph projection. Closing without saving discards the buffer.

use crate::model::{
    normalize_paragraphs, Chapter, ChapterId, Choice, ChoiceLimitExceeded, ChoiceRef, Choices,
    MAX_CHOICES,
};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    None,
    Chapter(ChapterId),
    Choice(ChoiceRef),
}

/// Unsaved edits for the chapter currently open in the editor panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditBuffer {
    chapter_id: ChapterId,
    title: String,
    body_text: String,
    options: Choices,
}

impl EditBuffer {
    pub fn from_chapter(chapter: &Chapter) -> Self {
        Self {
            chapter_id: chapter.chapter_id().clone(),
            title: chapter.title().to_owned(),
            body_text: chapter.body_text(),
            options: chapter.options().iter().cloned().collect(),
        }
    }

    pub fn chapter_id(&self) -> &ChapterId {
        &self.chapter_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn body_text(&self) -> &str {
        &self.body_text
    }

    pub fn set_body_text(&mut self, body_text: impl Into<String>) {
        self.body_text = body_text.into();
    }

    /// The body as it will be stored on save.
    pub fn paragraphs(&self) -> Vec<String> {
        normalize_paragraphs(&self.body_text)
    }

    pub fn options(&self) -> &[Choice] {
        &self.options
    }

    pub fn option_mut(&mut self, index: usize) -> Option<&mut Choice> {
        self.options.get_mut(index)
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

    pub fn remove_choice(&mut self, index: usize) -> Option<Choice> {
        (index < self.options.len()).then(|| self.options.remove(index))
    }

    pub(crate) fn to_choices(&self) -> Choices {
        self.options.clone()
    }

    /// Drops every choice leading to `chapter_id`. Returns how many were removed.
    fn drop_choices_to(&mut self, chapter_id: &ChapterId) -> usize {
        let before = self.options.len();
        self.options
            .retain(|choice| choice.next_chapter_id() != Some(chapter_id));
        before - self.options.len()
    }

    fn rebind_chapter_id(&mut self, from: &ChapterId, to: &ChapterId) {
        if &self.chapter_id == from {
            self.chapter_id = to.clone();
        }
        for choice in self.options.iter_mut() {
            choice.retarget(from, to);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EditorState {
    rev: u64,
    selection: Selection,
    edit_buffer: Option<EditBuffer>,
}

impl EditorState {
    /// Bumped on every selection change so observers can cheaply detect one.
    pub fn rev(&self) -> u64 {
        self.rev
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn selected_chapter_id(&self) -> Option<&ChapterId> {
        match &self.selection {
            Selection::Chapter(chapter_id) => Some(chapter_id),
            _ => None,
        }
    }

    pub fn selected_choice(&self) -> Option<&ChoiceRef> {
        match &self.selection {
            Selection::Choice(choice) => Some(choice),
            _ => None,
        }
    }

    pub fn edit_buffer(&self) -> Option<&EditBuffer> {
        self.edit_buffer.as_ref()
    }

    pub fn edit_buffer_mut(&mut self) -> Option<&mut EditBuffer> {
        self.edit_buffer.as_mut()
    }

    /// Selects a chapter and opens a fresh buffer, discarding any previous one.
    pub fn select_chapter(&mut self, chapter: &Chapter) {
        self.selection = Selection::Chapter(chapter.chapter_id().clone());
        self.edit_buffer = Some(EditBuffer::from_chapter(chapter));
        self.rev = self.rev.wrapping_add(1);
    }

    /// Selects a choice; any open chapter buffer is discarded.
    pub fn select_choice(&mut self, choice: ChoiceRef) {
        if self.selection == Selection::Choice(choice.clone()) {
            return;
        }
        self.selection = Selection::Choice(choice);
        self.edit_buffer = None;
        self.rev = self.rev.wrapping_add(1);
    }

    pub fn clear(&mut self) {
        if self.selection == Selection::None && self.edit_buffer.is_none() {
            return;
        }
        self.selection = Selection::None;
        self.edit_buffer = None;
        self.rev = self.rev.wrapping_add(1);
    }

    /// Reloads the open buffer from `chapter` if it is the chapter in edit.
    pub(crate) fn refresh_buffer(&mut self, chapter: &Chapter) {
        if let Some(buffer) = self.edit_buffer.as_mut() {
            if buffer.chapter_id() == chapter.chapter_id() {
                *buffer = EditBuffer::from_chapter(chapter);
            }
        }
    }

    /// Whether the current selection is, or belongs to, `chapter_id`.
    pub fn involves_chapter(&self, chapter_id: &ChapterId) -> bool {
        match &self.selection {
            Selection::None => false,
            Selection::Chapter(selected) => selected == chapter_id,
            Selection::Choice(choice) => &choice.chapter_id == chapter_id,
        }
    }

    /// Forgets a chapter that never made it to the store: clears a selection on it and drops
    /// buffered choices leading to it.
    pub(crate) fn forget_chapter(&mut self, chapter_id: &ChapterId) -> usize {
        if self.involves_chapter(chapter_id) {
            self.clear();
        }
        self.edit_buffer
            .as_mut()
            .map_or(0, |buffer| buffer.drop_choices_to(chapter_id))
    }

    /// Replaces a temporary chapter id with its permanent one everywhere in the state.
    pub(crate) fn rebind_chapter_id(&mut self, from: &ChapterId, to: &ChapterId) {
        match &mut self.selection {
            Selection::Chapter(selected) if selected == from => *selected = to.clone(),
            Selection::Choice(choice) if &choice.chapter_id == from => {
                choice.chapter_id = to.clone()
            }
            _ => {}
        }
        if let Some(buffer) = self.edit_buffer.as_mut() {
            buffer.rebind_chapter_id(from, to);
        }
    }
}
