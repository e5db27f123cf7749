// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Talegraph-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Talegraph and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Edit operations on a story.
//!
//! Operations are applied optimistically to the in-memory story and produce the
//! [`PendingWrite`]s that persist them. Each write remembers the values it replaced so a
//! failed write can be rolled back locally.

use std::fmt;

use tracing::{debug, warn};

use crate::config::LayoutConfig;
use crate::model::{Chapter, ChapterId, Choice, ChoiceRef, Choices, IdError, Position, Story};
use crate::store::StoreError;
use crate::ui::{EditBuffer, EditorState};

#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    /// Creates an empty chapter; with `after`, also links `after` to it when there is room.
    CreateChapter {
        after: Option<ChapterId>,
    },
    RenameChapter {
        chapter_id: ChapterId,
        title: String,
    },
    SetBody {
        chapter_id: ChapterId,
        text: String,
    },
    SetChoice {
        chapter_id: ChapterId,
        index: usize,
        field: ChoiceField,
    },
    AddChoice {
        chapter_id: ChapterId,
    },
    /// Deletes a choice from the buffer; later choices move up one index.
    RemoveChoice {
        chapter_id: ChapterId,
        index: usize,
    },
    SetStartChapter {
        chapter_id: ChapterId,
        confirmed: bool,
    },
    Reposition {
        chapter_id: ChapterId,
        position: Position,
    },
    DeleteChapter {
        chapter_id: ChapterId,
    },
    SaveChapter {
        chapter_id: ChapterId,
    },
    SetChoiceRemember {
        choice: ChoiceRef,
        remember: bool,
    },
    UpdateStoryDetails {
        patch: StoryDetailsPatch,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChoiceField {
    Text(String),
    Next(Option<ChapterId>),
    Remember(bool),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoryDetailsPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
    pub cover_image: Option<Option<String>>,
    pub published: Option<bool>,
}

/// Field-level chapter update. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChapterPatch {
    pub title: Option<String>,
    pub body: Option<Vec<String>>,
    pub options: Option<Choices>,
    pub position: Option<Position>,
}

impl ChapterPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.body.is_none()
            && self.options.is_none()
            && self.position.is_none()
    }

    /// The chapter's current values for exactly the fields this patch sets.
    pub fn capture(&self, chapter: &Chapter) -> ChapterPatch {
        ChapterPatch {
            title: self.title.as_ref().map(|_| chapter.title().to_owned()),
            body: self.body.as_ref().map(|_| chapter.body().to_vec()),
            options: self
                .options
                .as_ref()
                .map(|_| chapter.options().iter().cloned().collect()),
            position: self.position.map(|_| chapter.position()),
        }
    }

    fn rebind_chapter_id(&mut self, from: &ChapterId, to: &ChapterId) {
        if let Some(options) = self.options.as_mut() {
            for choice in options.iter_mut() {
                choice.retarget(from, to);
            }
        }
    }
}

/// Story-document update. `start_chapter_id: Some(None)` clears the start chapter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoryPatch {
    pub start_chapter_id: Option<Option<ChapterId>>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
    pub cover_image: Option<Option<String>>,
    pub published: Option<bool>,
}

impl StoryPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    fn capture(&self, story: &Story) -> StoryPatch {
        let details = story.details();
        StoryPatch {
            start_chapter_id: self
                .start_chapter_id
                .as_ref()
                .map(|_| story.start_chapter_id().cloned()),
            title: self.title.as_ref().map(|_| details.title.clone()),
            description: self.description.as_ref().map(|_| details.description.clone()),
            tags: self.tags.as_ref().map(|_| details.tags.clone()),
            cover_image: self.cover_image.as_ref().map(|_| details.cover_image.clone()),
            published: self.published.map(|_| details.published),
        }
    }

    fn rebind_chapter_id(&mut self, from: &ChapterId, to: &ChapterId) {
        if let Some(Some(start)) = self.start_chapter_id.as_mut() {
            if start == from {
                *start = to.clone();
            }
        }
    }
}

impl From<StoryDetailsPatch> for StoryPatch {
    fn from(patch: StoryDetailsPatch) -> Self {
        StoryPatch {
            start_chapter_id: None,
            title: patch.title,
            description: patch.description,
            tags: patch.tags,
            cover_image: patch.cover_image,
            published: patch.published,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteKind {
    CreateChapter,
    UpdateChapter,
    DeleteChapter,
    UpdateStory,
}

impl fmt::Display for WriteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::CreateChapter => "create chapter",
            Self::UpdateChapter => "update chapter",
            Self::DeleteChapter => "delete chapter",
            Self::UpdateStory => "update story",
        })
    }
}

/// A persistence call produced by a local mutation, plus what it needs for rollback.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingWrite {
    CreateChapter {
        temp_id: ChapterId,
        chapter: Chapter,
    },
    UpdateChapter {
        chapter_id: ChapterId,
        patch: ChapterPatch,
        previous: ChapterPatch,
    },
    DeleteChapter {
        chapter_id: ChapterId,
        index: usize,
        snapshot: Chapter,
    },
    UpdateStory {
        patch: StoryPatch,
        previous: StoryPatch,
    },
}

impl PendingWrite {
    pub fn kind(&self) -> WriteKind {
        match self {
            Self::CreateChapter { .. } => WriteKind::CreateChapter,
            Self::UpdateChapter { .. } => WriteKind::UpdateChapter,
            Self::DeleteChapter { .. } => WriteKind::DeleteChapter,
            Self::UpdateStory { .. } => WriteKind::UpdateStory,
        }
    }

    /// The chapter this write is about, if any.
    pub fn chapter_id(&self) -> Option<&ChapterId> {
        match self {
            Self::CreateChapter { temp_id, .. } => Some(temp_id),
            Self::UpdateChapter { chapter_id, .. } | Self::DeleteChapter { chapter_id, .. } => {
                Some(chapter_id)
            }
            Self::UpdateStory { .. } => None,
        }
    }

    /// Every chapter id the document store would see when this write is sent.
    ///
    /// A create is addressed by the store's new id, so its own temp id is not included.
    pub fn referenced_chapter_ids(&self) -> Vec<&ChapterId> {
        fn option_targets(options: &[Choice]) -> Vec<&ChapterId> {
            options
                .iter()
                .filter_map(Choice::next_chapter_id)
                .collect()
        }

        match self {
            Self::CreateChapter { chapter, .. } => option_targets(chapter.options()),
            Self::UpdateChapter {
                chapter_id, patch, ..
            } => {
                let mut ids = vec![chapter_id];
                if let Some(options) = patch.options.as_ref() {
                    ids.extend(option_targets(options));
                }
                ids
            }
            Self::DeleteChapter { chapter_id, .. } => vec![chapter_id],
            Self::UpdateStory { patch, .. } => match patch.start_chapter_id.as_ref() {
                Some(Some(start)) => vec![start],
                _ => Vec::new(),
            },
        }
    }

    pub(crate) fn rebind_chapter_id(&mut self, from: &ChapterId, to: &ChapterId) {
        match self {
            Self::CreateChapter { temp_id, chapter } => {
                if temp_id == from {
                    *temp_id = to.clone();
                    chapter.set_chapter_id(to.clone());
                }
                chapter.retarget_choices(from, to);
            }
            Self::UpdateChapter {
                chapter_id,
                patch,
                previous,
            } => {
                if chapter_id == from {
                    *chapter_id = to.clone();
                }
                patch.rebind_chapter_id(from, to);
                previous.rebind_chapter_id(from, to);
            }
            Self::DeleteChapter {
                chapter_id,
                snapshot,
                ..
            } => {
                if chapter_id == from {
                    *chapter_id = to.clone();
                    snapshot.set_chapter_id(to.clone());
                }
                snapshot.retarget_choices(from, to);
            }
            Self::UpdateStory { patch, previous } => {
                patch.rebind_chapter_id(from, to);
                previous.rebind_chapter_id(from, to);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedChapter {
    pub chapter_id: ChapterId,
    /// False when the originating chapter already had the maximum number of choices.
    pub linked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpOutcome {
    /// The op ran. `graph_changed` is true when the projection must be recomputed.
    Applied { graph_changed: bool },
    Created(CreatedChapter),
    /// Replacing an existing start chapter must be confirmed by the caller first.
    NeedsConfirmation { current: ChapterId },
    /// No chapter is in edit, so there was nothing to apply the op to.
    Ignored,
}

impl OpOutcome {
    pub fn graph_changed(&self) -> bool {
        match self {
            Self::Applied { graph_changed } => *graph_changed,
            Self::Created(_) => true,
            Self::NeedsConfirmation { .. } | Self::Ignored => false,
        }
    }
}

/// Hands out client-side chapter ids until the store assigns permanent ones.
#[derive(Debug, Clone)]
pub struct TempIdAllocator {
    prefix: String,
    next: u64,
}

impl TempIdAllocator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 1,
        }
    }

    pub fn allocate(&mut self, story: &Story) -> Result<ChapterId, IdError> {
        loop {
            let candidate = ChapterId::new(format!("{}{}", self.prefix, self.next))?;
            self.next = self.next.saturating_add(1);
            if !story.contains_chapter(&candidate) {
                return Ok(candidate);
            }
        }
    }
}

pub struct OpContext<'a> {
    pub layout: &'a LayoutConfig,
    pub temp_ids: &'a mut TempIdAllocator,
}

#[derive(Debug)]
pub enum EditError {
    NotFound {
        chapter_id: ChapterId,
    },
    NotInEdit {
        chapter_id: ChapterId,
        in_edit: ChapterId,
    },
    ChoiceIndexOutOfRange {
        chapter_id: ChapterId,
        index: usize,
        len: usize,
    },
    ChoiceLimit {
        chapter_id: ChapterId,
    },
    /// A settled create named a temporary id the editor no longer tracks.
    ChapterIdUnresolved {
        chapter_id: ChapterId,
    },
    InvalidId(IdError),
    Persistence {
        write: WriteKind,
        chapter_id: Option<ChapterId>,
        source: StoreError,
        rolled_back: bool,
    },
}

impl EditError {
    /// The op was refused by a model rule and nothing changed.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::ChoiceLimit { .. } | Self::ChoiceIndexOutOfRange { .. }
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// A persistence failure whose local effect could not be undone.
    pub fn needs_reload(&self) -> bool {
        matches!(
            self,
            Self::Persistence {
                rolled_back: false,
                ..
            }
        )
    }
}

impl fmt::Display for EditError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { chapter_id } => write!(f, "chapter not found (id={chapter_id})"),
            Self::NotInEdit {
                chapter_id,
                in_edit,
            } => write!(
                f,
                "chapter {chapter_id} is not open in the editor (editing {in_edit})"
            ),
            Self::ChoiceIndexOutOfRange {
                chapter_id,
                index,
                len,
            } => write!(
                f,
                "choice index {index} out of range for chapter {chapter_id} ({len} choices)"
            ),
            Self::ChoiceLimit { chapter_id } => write!(
                f,
                "chapter {chapter_id} already has {} choices",
                crate::model::MAX_CHOICES
            ),
            Self::ChapterIdUnresolved { chapter_id } => {
                write!(f, "no pending chapter for temporary id {chapter_id}")
            }
            Self::InvalidId(err) => write!(f, "invalid chapter id: {err}"),
            Self::Persistence {
                write,
                chapter_id,
                source,
                rolled_back,
            } => {
                match chapter_id {
                    Some(chapter_id) => write!(f, "failed to {write} {chapter_id}: {source}")?,
                    None => write!(f, "failed to {write}: {source}")?,
                }
                if *rolled_back {
                    f.write_str("; the change was undone, try again")
                } else {
                    f.write_str("; reload the story to see what was saved")
                }
            }
        }
    }
}

impl std::error::Error for EditError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidId(err) => Some(err),
            Self::Persistence { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<IdError> for EditError {
    fn from(err: IdError) -> Self {
        Self::InvalidId(err)
    }
}

// Op application and rollback helpers.
include!("ops_impl.rs");
