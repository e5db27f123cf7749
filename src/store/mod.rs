// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Talegraph-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Talegraph and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Persistence collaborators and the code that talks to them.
//!
//! The document store keeps one story document plus a flat collection of chapter documents
//! per story. The blob store holds cover images. Both are async traits so the editor can be
//! driven against a remote backend or the in-memory implementations used by tests and the
//! CLI.

use std::fmt;

use async_trait::async_trait;

use crate::model::{ChapterId, StoryId};

mod cover;
mod dispatch;
mod documents;
mod export;
mod load;
mod memory;

pub use cover::{create_story_with_cover, delete_story_with_cover, replace_cover_image};
pub use dispatch::{persist, PersistOutcome, PersistReport};
pub use documents::{
    document_schemas, ChapterDocument, ChapterDocumentPatch, ChapterRecord, ChoiceDocument,
    PositionDocument, StoryDocument, StoryDocumentPatch,
};
pub use export::{ExportError, StoryExport};
pub use load::{load_story, LoadError};
pub use memory::{MemoryBlobStore, MemoryDocumentStore, StoredBlob};

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get_story(&self, story_id: &StoryId) -> Result<Option<StoryDocument>, StoreError>;

    /// Chapter documents in store arrival order.
    async fn list_chapters(&self, story_id: &StoryId) -> Result<Vec<ChapterRecord>, StoreError>;

    async fn create_story(&self, story: StoryDocument) -> Result<StoryId, StoreError>;

    async fn update_story(
        &self,
        story_id: &StoryId,
        patch: StoryDocumentPatch,
    ) -> Result<(), StoreError>;

    /// Removes the story document. Chapter documents are not cascaded.
    async fn delete_story(&self, story_id: &StoryId) -> Result<(), StoreError>;

    /// Stores a new chapter and returns the id the store generated for it.
    async fn create_chapter(
        &self,
        story_id: &StoryId,
        chapter: ChapterDocument,
    ) -> Result<ChapterId, StoreError>;

    async fn update_chapter(
        &self,
        story_id: &StoryId,
        chapter_id: &ChapterId,
        patch: ChapterDocumentPatch,
    ) -> Result<(), StoreError>;

    async fn delete_chapter(
        &self,
        story_id: &StoryId,
        chapter_id: &ChapterId,
    ) -> Result<(), StoreError>;
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Uploads `bytes` and returns a URL that can later be passed to [`BlobStore::delete`].
    async fn put(&self, bytes: Vec<u8>, content_type: &str) -> Result<String, StoreError>;

    async fn delete(&self, url: &str) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    GetStory,
    ListChapters,
    CreateStory,
    UpdateStory,
    DeleteStory,
    CreateChapter,
    UpdateChapter,
    DeleteChapter,
    PutBlob,
    DeleteBlob,
}

impl fmt::Display for StoreOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::GetStory => "get_story",
            Self::ListChapters => "list_chapters",
            Self::CreateStory => "create_story",
            Self::UpdateStory => "update_story",
            Self::DeleteStory => "delete_story",
            Self::CreateChapter => "create_chapter",
            Self::UpdateChapter => "update_chapter",
            Self::DeleteChapter => "delete_chapter",
            Self::PutBlob => "put_blob",
            Self::DeleteBlob => "delete_blob",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    StoryNotFound {
        story_id: StoryId,
    },
    ChapterNotFound {
        story_id: StoryId,
        chapter_id: ChapterId,
    },
    /// The backend rejected or could not serve the call.
    Unavailable {
        operation: StoreOperation,
        reason: String,
    },
    /// A store's internal lock was poisoned by a panicking writer.
    Lock {
        operation: StoreOperation,
    },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StoryNotFound { story_id } => write!(f, "story not found (id={story_id})"),
            Self::ChapterNotFound {
                story_id,
                chapter_id,
            } => write!(
                f,
                "chapter not found (story_id={story_id} chapter_id={chapter_id})"
            ),
            Self::Unavailable { operation, reason } => {
                write!(f, "store unavailable during {operation}: {reason}")
            }
            Self::Lock { operation } => write!(f, "store lock poisoned during {operation}"),
        }
    }
}

impl std::error::Error for StoreError {}
