// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Talegraph-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Talegraph and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use tracing::{debug, warn};

use super::{ChapterDocument, DocumentStore, StoreError};
use crate::model::{ChapterId, StoryId};
use crate::ops::PendingWrite;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistOutcome {
    /// A chapter create landed; `chapter_id` is the permanent id the store assigned.
    Created { chapter_id: ChapterId },
    Saved,
}

/// The write that was sent, paired with what the store answered.
#[derive(Debug, Clone)]
pub struct PersistReport {
    pub write: PendingWrite,
    pub result: Result<PersistOutcome, StoreError>,
}

impl PersistReport {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Sends one pending write to the document store.
///
/// Borrows only the store, so several writes can be in flight at once. The report is handed
/// back to the editor, which rebinds ids or rolls back.
pub async fn persist<S: DocumentStore + ?Sized>(
    store: &S,
    story_id: &StoryId,
    write: PendingWrite,
) -> PersistReport {
    let result = match &write {
        PendingWrite::CreateChapter { chapter, .. } => store
            .create_chapter(story_id, ChapterDocument::from_chapter(chapter))
            .await
            .map(|chapter_id| PersistOutcome::Created { chapter_id }),
        PendingWrite::UpdateChapter {
            chapter_id, patch, ..
        } => store
            .update_chapter(story_id, chapter_id, patch.into())
            .await
            .map(|()| PersistOutcome::Saved),
        PendingWrite::DeleteChapter { chapter_id, .. } => store
            .delete_chapter(story_id, chapter_id)
            .await
            .map(|()| PersistOutcome::Saved),
        PendingWrite::UpdateStory { patch, .. } => store
            .update_story(story_id, patch.into())
            .await
            .map(|()| PersistOutcome::Saved),
    };

    match &result {
        Ok(outcome) => debug!(
            story_id = %story_id,
            write = %write.kind(),
            ?outcome,
            "write persisted"
        ),
        Err(err) => warn!(
            story_id = %story_id,
            write = %write.kind(),
            error = %err,
            "write failed"
        ),
    }
    PersistReport { write, result }
}
