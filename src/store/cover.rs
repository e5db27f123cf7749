// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Talegraph-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Talegraph and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Story cover images, kept in the blob store and referenced by URL from the story document.

use tracing::warn;

use super::{BlobStore, DocumentStore, StoreError, StoryDocument, StoryDocumentPatch};
use crate::model::StoryId;

/// Creates a story document, uploading `cover` first when one is given.
pub async fn create_story_with_cover<D, B>(
    documents: &D,
    blobs: &B,
    mut story: StoryDocument,
    cover: Option<(Vec<u8>, &str)>,
) -> Result<StoryId, StoreError>
where
    D: DocumentStore + ?Sized,
    B: BlobStore + ?Sized,
{
    let uploaded = match cover {
        Some((bytes, content_type)) => Some(blobs.put(bytes, content_type).await?),
        None => None,
    };
    if let Some(url) = uploaded.as_ref() {
        story.cover_image = url.clone();
    }

    match documents.create_story(story).await {
        Ok(story_id) => Ok(story_id),
        Err(err) => {
            if let Some(url) = uploaded {
                discard_blob(blobs, &url).await;
            }
            Err(err)
        }
    }
}

/// Uploads a new cover, points the story at it, and removes the previous cover blob.
///
/// Returns the new URL. If the story update fails the fresh upload is removed again and the
/// old cover stays in place.
pub async fn replace_cover_image<D, B>(
    documents: &D,
    blobs: &B,
    story_id: &StoryId,
    bytes: Vec<u8>,
    content_type: &str,
) -> Result<String, StoreError>
where
    D: DocumentStore + ?Sized,
    B: BlobStore + ?Sized,
{
    let previous = documents
        .get_story(story_id)
        .await?
        .ok_or_else(|| StoreError::StoryNotFound {
            story_id: story_id.clone(),
        })?
        .cover_image;

    let url = blobs.put(bytes, content_type).await?;
    let patch = StoryDocumentPatch {
        cover_image: Some(url.clone()),
        ..StoryDocumentPatch::default()
    };
    if let Err(err) = documents.update_story(story_id, patch).await {
        discard_blob(blobs, &url).await;
        return Err(err);
    }

    if !previous.is_empty() && previous != url {
        discard_blob(blobs, &previous).await;
    }
    Ok(url)
}

/// Deletes the cover blob (if any) and then the story document.
///
/// A failed blob delete aborts before the document is touched.
pub async fn delete_story_with_cover<D, B>(
    documents: &D,
    blobs: &B,
    story_id: &StoryId,
) -> Result<(), StoreError>
where
    D: DocumentStore + ?Sized,
    B: BlobStore + ?Sized,
{
    let story = documents
        .get_story(story_id)
        .await?
        .ok_or_else(|| StoreError::StoryNotFound {
            story_id: story_id.clone(),
        })?;
    if !story.cover_image.is_empty() {
        blobs.delete(&story.cover_image).await?;
    }
    documents.delete_story(story_id).await
}

async fn discard_blob<B: BlobStore + ?Sized>(blobs: &B, url: &str) {
    if let Err(err) = blobs.delete(url).await {
        warn!(url, error = %err, "cannot remove cover blob");
    }
}
