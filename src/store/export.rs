// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Talegraph-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Talegraph and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Single-file JSON export of one story and its chapter documents.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{ChapterDocument, ChapterRecord, MemoryDocumentStore, StoreError, StoryDocument};
use crate::model::{IdError, Story, StoryId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StoryExport {
    pub id: String,
    pub story: StoryDocument,
    #[serde(default)]
    pub chapters: Vec<ChapterRecord>,
}

impl StoryExport {
    pub fn from_story(story: &Story) -> Self {
        Self {
            id: story.story_id().as_str().to_owned(),
            story: StoryDocument::from_story(story),
            chapters: story
                .chapters()
                .iter()
                .map(|chapter| ChapterRecord {
                    id: chapter.chapter_id().as_str().to_owned(),
                    document: ChapterDocument::from_chapter(chapter),
                })
                .collect(),
        }
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ExportError> {
        serde_json::from_str(raw).map_err(|source| ExportError::Json { path: None, source })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ExportError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ExportError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ExportError::Json {
            path: Some(path.to_path_buf()),
            source,
        })
    }

    pub fn to_json_pretty(&self) -> Result<String, ExportError> {
        serde_json::to_string_pretty(self).map_err(|source| ExportError::Json { path: None, source })
    }

    /// Puts the story into `store` as-is. Chapter ids are validated later, on load.
    pub fn seed(self, store: &MemoryDocumentStore) -> Result<StoryId, ExportError> {
        let story_id = StoryId::new(self.id.clone()).map_err(|source| ExportError::InvalidId {
            value: self.id.clone(),
            source,
        })?;
        store
            .insert_story(story_id.clone(), self.story, self.chapters)
            .map_err(ExportError::Store)?;
        Ok(story_id)
    }
}

#[derive(Debug)]
pub enum ExportError {
    Io {
        path: PathBuf,
        source: io::Error,
    },
    Json {
        path: Option<PathBuf>,
        source: serde_json::Error,
    },
    InvalidId {
        value: String,
        source: IdError,
    },
    Store(StoreError),
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "cannot read story export {path:?}: {source}"),
            Self::Json {
                path: Some(path),
                source,
            } => write!(f, "invalid story export json in {path:?}: {source}"),
            Self::Json { path: None, source } => write!(f, "invalid story export json: {source}"),
            Self::InvalidId { value, source } => {
                write!(f, "invalid story id {value:?}: {source}")
            }
            Self::Store(err) => write!(f, "cannot seed story: {err}"),
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
            Self::InvalidId { source, .. } => Some(source),
            Self::Store(err) => Some(err),
        }
    }
}
