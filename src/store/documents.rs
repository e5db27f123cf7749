// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Talegraph-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Talegraph and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Wire shapes of the story and chapter documents.
//!
//! Ids are plain strings here and an empty string means "unset". Every field that older
//! documents may lack carries a serde default so loading never fails on a missing field.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::model::{Chapter, ChapterId, Choice, IdError, Position, Story};
use crate::ops::{ChapterPatch, StoryPatch};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct StoryDocument {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub cover_image: String,
    pub published: bool,
    pub start_chapter_id: String,
    pub created_at: u64,
}

impl StoryDocument {
    pub fn from_story(story: &Story) -> Self {
        let details = story.details();
        Self {
            title: details.title.clone(),
            description: details.description.clone(),
            tags: details.tags.clone(),
            cover_image: details.cover_image.clone().unwrap_or_default(),
            published: details.published,
            start_chapter_id: story
                .start_chapter_id()
                .map(|id| id.as_str().to_owned())
                .unwrap_or_default(),
            created_at: details.created_at,
        }
    }

    pub fn apply_patch(&mut self, patch: &StoryDocumentPatch) {
        if let Some(start) = patch.start_chapter_id.as_ref() {
            self.start_chapter_id = start.clone();
        }
        if let Some(title) = patch.title.as_ref() {
            self.title = title.clone();
        }
        if let Some(description) = patch.description.as_ref() {
            self.description = description.clone();
        }
        if let Some(tags) = patch.tags.as_ref() {
            self.tags = tags.clone();
        }
        if let Some(cover_image) = patch.cover_image.as_ref() {
            self.cover_image = cover_image.clone();
        }
        if let Some(published) = patch.published {
            self.published = published;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PositionDocument {
    pub x: f64,
    pub y: f64,
}

impl From<Position> for PositionDocument {
    fn from(position: Position) -> Self {
        Self {
            x: position.x,
            y: position.y,
        }
    }
}

impl From<PositionDocument> for Position {
    fn from(position: PositionDocument) -> Self {
        Position::new(position.x, position.y)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ChoiceDocument {
    pub text: String,
    pub next_chapter_id: String,
    pub remember: bool,
}

impl ChoiceDocument {
    pub fn into_choice(self) -> Result<Choice, IdError> {
        let next = if self.next_chapter_id.is_empty() {
            None
        } else {
            Some(ChapterId::new(self.next_chapter_id)?)
        };
        Ok(Choice::new(self.text, next).with_remember(self.remember))
    }
}

impl From<&Choice> for ChoiceDocument {
    fn from(choice: &Choice) -> Self {
        Self {
            text: choice.text().to_owned(),
            next_chapter_id: choice
                .next_chapter_id()
                .map(|id| id.as_str().to_owned())
                .unwrap_or_default(),
            remember: choice.remember(),
        }
    }
}

/// A chapter document without its id; the store keys it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChapterDocument {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: Vec<String>,
    /// `None` when the field is missing; loading substitutes one blank choice.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<ChoiceDocument>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<PositionDocument>,
    #[serde(default)]
    pub created_at: u64,
}

impl ChapterDocument {
    pub fn from_chapter(chapter: &Chapter) -> Self {
        Self {
            title: chapter.title().to_owned(),
            body: chapter.body().to_vec(),
            options: Some(chapter.options().iter().map(ChoiceDocument::from).collect()),
            position: Some(chapter.position().into()),
            created_at: chapter.created_at(),
        }
    }

    pub fn apply_patch(&mut self, patch: &ChapterDocumentPatch) {
        if let Some(title) = patch.title.as_ref() {
            self.title = title.clone();
        }
        if let Some(body) = patch.body.as_ref() {
            self.body = body.clone();
        }
        if let Some(options) = patch.options.as_ref() {
            self.options = Some(options.clone());
        }
        if let Some(position) = patch.position {
            self.position = Some(position);
        }
    }
}

/// A chapter document as listed by the store, with its raw id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ChapterRecord {
    pub id: String,
    #[serde(flatten)]
    pub document: ChapterDocument,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChapterDocumentPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<ChoiceDocument>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<PositionDocument>,
}

impl From<&ChapterPatch> for ChapterDocumentPatch {
    fn from(patch: &ChapterPatch) -> Self {
        Self {
            title: patch.title.clone(),
            body: patch.body.clone(),
            options: patch
                .options
                .as_ref()
                .map(|options| options.iter().map(ChoiceDocument::from).collect()),
            position: patch.position.map(PositionDocument::from),
        }
    }
}

/// Story-document update; an empty `startChapterId` or `coverImage` clears the field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StoryDocumentPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_chapter_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<bool>,
}

impl From<&StoryPatch> for StoryDocumentPatch {
    fn from(patch: &StoryPatch) -> Self {
        Self {
            start_chapter_id: patch.start_chapter_id.as_ref().map(|start| {
                start
                    .as_ref()
                    .map(|id| id.as_str().to_owned())
                    .unwrap_or_default()
            }),
            title: patch.title.clone(),
            description: patch.description.clone(),
            tags: patch.tags.clone(),
            cover_image: patch
                .cover_image
                .as_ref()
                .map(|cover| cover.clone().unwrap_or_default()),
            published: patch.published,
        }
    }
}

/// JSON schemas of every document shape, keyed by type name.
pub fn document_schemas() -> serde_json::Value {
    serde_json::json!({
        "StoryDocument": schemars::schema_for!(StoryDocument),
        "ChapterDocument": schemars::schema_for!(ChapterDocument),
        "ChoiceDocument": schemars::schema_for!(ChoiceDocument),
        "StoryDocumentPatch": schemars::schema_for!(StoryDocumentPatch),
        "ChapterDocumentPatch": schemars::schema_for!(ChapterDocumentPatch),
    })
}
