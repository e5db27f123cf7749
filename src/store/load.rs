// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Talegraph-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Talegraph and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;

use tracing::{debug, warn};

use super::{ChapterRecord, DocumentStore, StoreError, StoryDocument};
use crate::config::LayoutConfig;
use crate::model::{
    Chapter, ChapterId, Choice, ChoiceLimitExceeded, Choices, IdError, Story, StoryDetails,
    StoryId, MAX_CHOICES,
};

#[derive(Debug)]
pub enum LoadError {
    NotFound {
        story_id: StoryId,
    },
    InvalidId {
        field: &'static str,
        value: String,
        source: IdError,
    },
    InvalidChapter {
        chapter_id: ChapterId,
        source: ChoiceLimitExceeded,
    },
    Store(StoreError),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { story_id } => write!(f, "story not found (id={story_id})"),
            Self::InvalidId {
                field,
                value,
                source,
            } => write!(f, "invalid id for {field}: {value:?}: {source}"),
            Self::InvalidChapter { chapter_id, source } => {
                write!(f, "invalid chapter {chapter_id}: {source}")
            }
            Self::Store(err) => write!(f, "cannot load story: {err}"),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::NotFound { .. } => None,
            Self::InvalidId { source, .. } => Some(source),
            Self::InvalidChapter { source, .. } => Some(source),
            Self::Store(err) => Some(err),
        }
    }
}

impl From<StoreError> for LoadError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}

/// Reads a story and all of its chapters.
///
/// Chapters come back sorted by `createdAt`; ties keep the store's order. Missing fields get
/// their defaults and chapters nobody has positioned are stacked with the fallback layout.
pub async fn load_story<S: DocumentStore + ?Sized>(
    store: &S,
    story_id: &StoryId,
    layout: &LayoutConfig,
) -> Result<Story, LoadError> {
    let Some(document) = store.get_story(story_id).await? else {
        return Err(LoadError::NotFound {
            story_id: story_id.clone(),
        });
    };

    let mut records = store.list_chapters(story_id).await?;
    records.sort_by_key(|record| record.document.created_at);

    let chapters = records
        .into_iter()
        .enumerate()
        .map(|(index, record)| chapter_from_record(record, index, layout))
        .collect::<Result<Vec<_>, _>>()?;

    let (details, start_chapter_id) = details_from_document(document)?;
    debug!(story_id = %story_id, chapters = chapters.len(), "story loaded");
    Ok(Story::with_parts(
        story_id.clone(),
        details,
        start_chapter_id,
        chapters,
    ))
}

fn details_from_document(
    document: StoryDocument,
) -> Result<(StoryDetails, Option<ChapterId>), LoadError> {
    let start_chapter_id = optional_chapter_id("startChapterId", document.start_chapter_id)?;
    let details = StoryDetails {
        title: document.title,
        description: document.description,
        tags: document.tags,
        cover_image: Some(document.cover_image).filter(|url| !url.is_empty()),
        published: document.published,
        created_at: document.created_at,
    };
    Ok((details, start_chapter_id))
}

fn chapter_from_record(
    record: ChapterRecord,
    index: usize,
    layout: &LayoutConfig,
) -> Result<Chapter, LoadError> {
    let chapter_id = ChapterId::new(record.id.clone()).map_err(|source| LoadError::InvalidId {
        field: "chapter id",
        value: record.id.clone(),
        source,
    })?;
    let document = record.document;

    let mut dropped = 0;
    let options = match document.options {
        None => Some(Choice::blank()).into_iter().collect::<Choices>(),
        Some(mut stored) => {
            if stored.len() > MAX_CHOICES {
                warn!(
                    chapter_id = %chapter_id,
                    stored = stored.len(),
                    "chapter has more than {MAX_CHOICES} choices; extra choices dropped"
                );
                dropped = stored.len() - MAX_CHOICES;
                stored.truncate(MAX_CHOICES);
            }
            let mut options = Choices::new();
            for choice in stored {
                let value = choice.next_chapter_id.clone();
                options.push(choice.into_choice().map_err(|source| LoadError::InvalidId {
                    field: "nextChapterId",
                    value,
                    source,
                })?);
            }
            options
        }
    };

    let position = document
        .position
        .map(Into::into)
        .unwrap_or_else(|| layout.fallback_position(index));

    let mut chapter = Chapter::from_parts(
        chapter_id.clone(),
        document.title,
        document.body,
        options,
        position,
        document.created_at,
    )
    .map_err(|source| LoadError::InvalidChapter { chapter_id, source })?;
    chapter.set_dropped_choices(dropped);
    Ok(chapter)
}

fn optional_chapter_id(field: &'static str, value: String) -> Result<Option<ChapterId>, LoadError> {
    if value.is_empty() {
        return Ok(None);
    }
    ChapterId::new(value.clone())
        .map(Some)
        .map_err(|source| LoadError::InvalidId {
            field,
            value,
            source,
        })
}
