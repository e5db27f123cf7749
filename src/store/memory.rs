// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Talegraph-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Talegraph and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! In-memory document and blob stores.
//!
//! Both hand out sequential ids and stamp `createdAt` from a logical clock. `fail_next`
//! queues a failure for the next call of one operation, which is how tests drive the
//! rollback paths.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use tracing::debug;

use super::{
    BlobStore, ChapterDocument, ChapterDocumentPatch, ChapterRecord, DocumentStore, StoreError,
    StoreOperation, StoryDocument, StoryDocumentPatch,
};
use crate::model::{ChapterId, StoryId};

#[derive(Debug, Default)]
struct Failures {
    queued: HashMap<StoreOperation, Vec<String>>,
}

impl Failures {
    fn push(&mut self, operation: StoreOperation, reason: String) {
        self.queued.entry(operation).or_default().push(reason);
    }

    fn take(&mut self, operation: StoreOperation) -> Result<(), StoreError> {
        let Some(reasons) = self.queued.get_mut(&operation) else {
            return Ok(());
        };
        if reasons.is_empty() {
            return Ok(());
        }
        let reason = reasons.remove(0);
        Err(StoreError::Unavailable { operation, reason })
    }
}

#[derive(Debug, Default)]
struct DocumentState {
    stories: BTreeMap<StoryId, StoryDocument>,
    chapters: BTreeMap<StoryId, Vec<ChapterRecord>>,
    next_id: u64,
    clock: u64,
    failures: Failures,
    calls: Vec<StoreOperation>,
}

impl DocumentState {
    fn begin(&mut self, operation: StoreOperation) -> Result<(), StoreError> {
        self.calls.push(operation);
        self.failures.take(operation)
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn allocate(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }

    fn require_story(&self, story_id: &StoryId) -> Result<(), StoreError> {
        if self.stories.contains_key(story_id) {
            Ok(())
        } else {
            Err(StoreError::StoryNotFound {
                story_id: story_id.clone(),
            })
        }
    }

    fn chapter_mut(
        &mut self,
        story_id: &StoryId,
        chapter_id: &ChapterId,
    ) -> Result<&mut ChapterRecord, StoreError> {
        self.chapters
            .get_mut(story_id)
            .and_then(|records| {
                records
                    .iter_mut()
                    .find(|record| record.id == chapter_id.as_str())
            })
            .ok_or_else(|| StoreError::ChapterNotFound {
                story_id: story_id.clone(),
                chapter_id: chapter_id.clone(),
            })
    }
}

#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    state: Mutex<DocumentState>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self, operation: StoreOperation) -> Result<MutexGuard<'_, DocumentState>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::Lock { operation })
    }

    /// Seeds a story with pre-existing chapter records, kept in the given order.
    pub fn insert_story(
        &self,
        story_id: StoryId,
        story: StoryDocument,
        chapters: Vec<ChapterRecord>,
    ) -> Result<(), StoreError> {
        let mut state = self.lock(StoreOperation::CreateStory)?;
        state.clock = state.clock.max(story.created_at);
        for record in &chapters {
            state.clock = state.clock.max(record.document.created_at);
        }
        state.stories.insert(story_id.clone(), story);
        state.chapters.insert(story_id, chapters);
        Ok(())
    }

    /// Makes the next call of `operation` fail with [`StoreError::Unavailable`].
    pub fn fail_next(&self, operation: StoreOperation, reason: impl Into<String>) {
        if let Ok(mut state) = self.state.lock() {
            state.failures.push(operation, reason.into());
        }
    }

    pub fn story_document(&self, story_id: &StoryId) -> Option<StoryDocument> {
        let state = self.state.lock().ok()?;
        state.stories.get(story_id).cloned()
    }

    pub fn chapter_records(&self, story_id: &StoryId) -> Vec<ChapterRecord> {
        self.state
            .lock()
            .ok()
            .and_then(|state| state.chapters.get(story_id).cloned())
            .unwrap_or_default()
    }

    /// Every operation attempted so far, failed ones included.
    pub fn calls(&self) -> Vec<StoreOperation> {
        self.state
            .lock()
            .map(|state| state.calls.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get_story(&self, story_id: &StoryId) -> Result<Option<StoryDocument>, StoreError> {
        tokio::task::yield_now().await;
        let mut state = self.lock(StoreOperation::GetStory)?;
        state.begin(StoreOperation::GetStory)?;
        Ok(state.stories.get(story_id).cloned())
    }

    async fn list_chapters(&self, story_id: &StoryId) -> Result<Vec<ChapterRecord>, StoreError> {
        tokio::task::yield_now().await;
        let mut state = self.lock(StoreOperation::ListChapters)?;
        state.begin(StoreOperation::ListChapters)?;
        Ok(state.chapters.get(story_id).cloned().unwrap_or_default())
    }

    async fn create_story(&self, mut story: StoryDocument) -> Result<StoryId, StoreError> {
        tokio::task::yield_now().await;
        let mut state = self.lock(StoreOperation::CreateStory)?;
        state.begin(StoreOperation::CreateStory)?;
        let story_id = StoryId::new(state.allocate("story")).map_err(|err| {
            StoreError::Unavailable {
                operation: StoreOperation::CreateStory,
                reason: err.to_string(),
            }
        })?;
        story.created_at = state.tick();
        state.stories.insert(story_id.clone(), story);
        debug!(story_id = %story_id, "memory store: story created");
        Ok(story_id)
    }

    async fn update_story(
        &self,
        story_id: &StoryId,
        patch: StoryDocumentPatch,
    ) -> Result<(), StoreError> {
        tokio::task::yield_now().await;
        let mut state = self.lock(StoreOperation::UpdateStory)?;
        state.begin(StoreOperation::UpdateStory)?;
        let story = state
            .stories
            .get_mut(story_id)
            .ok_or_else(|| StoreError::StoryNotFound {
                story_id: story_id.clone(),
            })?;
        story.apply_patch(&patch);
        Ok(())
    }

    async fn delete_story(&self, story_id: &StoryId) -> Result<(), StoreError> {
        tokio::task::yield_now().await;
        let mut state = self.lock(StoreOperation::DeleteStory)?;
        state.begin(StoreOperation::DeleteStory)?;
        state.stories.remove(story_id);
        Ok(())
    }

    async fn create_chapter(
        &self,
        story_id: &StoryId,
        mut chapter: ChapterDocument,
    ) -> Result<ChapterId, StoreError> {
        tokio::task::yield_now().await;
        let mut state = self.lock(StoreOperation::CreateChapter)?;
        state.begin(StoreOperation::CreateChapter)?;
        state.require_story(story_id)?;

        let raw_id = state.allocate("ch");
        let chapter_id = ChapterId::new(raw_id.clone()).map_err(|err| StoreError::Unavailable {
            operation: StoreOperation::CreateChapter,
            reason: err.to_string(),
        })?;
        chapter.created_at = state.tick();
        state
            .chapters
            .entry(story_id.clone())
            .or_default()
            .push(ChapterRecord {
                id: raw_id,
                document: chapter,
            });
        debug!(story_id = %story_id, chapter_id = %chapter_id, "memory store: chapter created");
        Ok(chapter_id)
    }

    async fn update_chapter(
        &self,
        story_id: &StoryId,
        chapter_id: &ChapterId,
        patch: ChapterDocumentPatch,
    ) -> Result<(), StoreError> {
        tokio::task::yield_now().await;
        let mut state = self.lock(StoreOperation::UpdateChapter)?;
        state.begin(StoreOperation::UpdateChapter)?;
        let record = state.chapter_mut(story_id, chapter_id)?;
        record.document.apply_patch(&patch);
        Ok(())
    }

    async fn delete_chapter(
        &self,
        story_id: &StoryId,
        chapter_id: &ChapterId,
    ) -> Result<(), StoreError> {
        tokio::task::yield_now().await;
        let mut state = self.lock(StoreOperation::DeleteChapter)?;
        state.begin(StoreOperation::DeleteChapter)?;
        if let Some(records) = state.chapters.get_mut(story_id) {
            records.retain(|record| record.id != chapter_id.as_str());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Default)]
struct BlobState {
    blobs: BTreeMap<String, StoredBlob>,
    next_id: u64,
    failures: Failures,
}

#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    state: Mutex<BlobState>,
}

impl MemoryBlobStore {
    pub const URL_PREFIX: &'static str = "memory://blobs/";

    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self, operation: StoreOperation) -> Result<MutexGuard<'_, BlobState>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::Lock { operation })
    }

    pub fn fail_next(&self, operation: StoreOperation, reason: impl Into<String>) {
        if let Ok(mut state) = self.state.lock() {
            state.failures.push(operation, reason.into());
        }
    }

    pub fn get(&self, url: &str) -> Option<StoredBlob> {
        let state = self.state.lock().ok()?;
        state.blobs.get(url).cloned()
    }

    pub fn len(&self) -> usize {
        self.state.lock().map(|state| state.blobs.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, bytes: Vec<u8>, content_type: &str) -> Result<String, StoreError> {
        tokio::task::yield_now().await;
        let mut state = self.lock(StoreOperation::PutBlob)?;
        state.failures.take(StoreOperation::PutBlob)?;
        state.next_id += 1;
        let url = format!("{}{}", Self::URL_PREFIX, state.next_id);
        state.blobs.insert(
            url.clone(),
            StoredBlob {
                content_type: content_type.to_owned(),
                bytes,
            },
        );
        Ok(url)
    }

    async fn delete(&self, url: &str) -> Result<(), StoreError> {
        tokio::task::yield_now().await;
        let mut state = self.lock(StoreOperation::DeleteBlob)?;
        state.failures.take(StoreOperation::DeleteBlob)?;
        state.blobs.remove(url);
        Ok(())
    }
}
