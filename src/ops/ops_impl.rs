// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Talegraph-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Talegraph and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

/// Applies one op to the story and selection state, pushing the writes it produces.
///
/// On `Err` nothing was changed and no write was pushed.
pub fn apply_op(
    story: &mut Story,
    state: &mut EditorState,
    ctx: &mut OpContext<'_>,
    op: &Op,
    writes: &mut Vec<PendingWrite>,
) -> Result<OpOutcome, EditError> {
    match op {
        Op::CreateChapter { after } => create_chapter(story, state, ctx, after.as_ref(), writes),
        Op::RenameChapter { chapter_id, title } => {
            let Some(buffer) = buffer_in_edit(story, state, chapter_id)? else {
                return Ok(OpOutcome::Ignored);
            };
            buffer.set_title(title.as_str());
            Ok(OpOutcome::Applied {
                graph_changed: false,
            })
        }
        Op::SetBody { chapter_id, text } => {
            let Some(buffer) = buffer_in_edit(story, state, chapter_id)? else {
                return Ok(OpOutcome::Ignored);
            };
            buffer.set_body_text(text.as_str());
            Ok(OpOutcome::Applied {
                graph_changed: false,
            })
        }
        Op::SetChoice {
            chapter_id,
            index,
            field,
        } => {
            let Some(buffer) = buffer_in_edit(story, state, chapter_id)? else {
                return Ok(OpOutcome::Ignored);
            };
            let len = buffer.options().len();
            let Some(choice) = buffer.option_mut(*index) else {
                return Err(EditError::ChoiceIndexOutOfRange {
                    chapter_id: chapter_id.clone(),
                    index: *index,
                    len,
                });
            };
            match field {
                ChoiceField::Text(text) => choice.set_text(text.as_str()),
                ChoiceField::Next(next) => choice.set_next_chapter_id(next.clone()),
                ChoiceField::Remember(remember) => choice.set_remember(*remember),
            }
            Ok(OpOutcome::Applied {
                graph_changed: false,
            })
        }
        Op::AddChoice { chapter_id } => {
            let Some(buffer) = buffer_in_edit(story, state, chapter_id)? else {
                return Ok(OpOutcome::Ignored);
            };
            buffer
                .push_choice(Choice::blank())
                .map_err(|_| EditError::ChoiceLimit {
                    chapter_id: chapter_id.clone(),
                })?;
            Ok(OpOutcome::Applied {
                graph_changed: false,
            })
        }
        Op::RemoveChoice { chapter_id, index } => {
            let Some(buffer) = buffer_in_edit(story, state, chapter_id)? else {
                return Ok(OpOutcome::Ignored);
            };
            let len = buffer.options().len();
            if buffer.remove_choice(*index).is_none() {
                return Err(EditError::ChoiceIndexOutOfRange {
                    chapter_id: chapter_id.clone(),
                    index: *index,
                    len,
                });
            }
            Ok(OpOutcome::Applied {
                graph_changed: false,
            })
        }
        Op::SaveChapter { chapter_id } => save_chapter(story, state, chapter_id, writes),
        Op::SetStartChapter {
            chapter_id,
            confirmed,
        } => set_start_chapter(story, chapter_id, *confirmed, writes),
        Op::Reposition {
            chapter_id,
            position,
        } => {
            let chapter = story
                .chapter_mut(chapter_id)
                .ok_or_else(|| not_found(chapter_id))?;
            if chapter.position() == *position {
                return Ok(OpOutcome::Applied {
                    graph_changed: false,
                });
            }
            let patch = ChapterPatch {
                position: Some(*position),
                ..ChapterPatch::default()
            };
            let previous = patch.capture(chapter);
            chapter.set_position(*position);
            debug!(chapter_id = %chapter_id, x = position.x, y = position.y, "reposition chapter");
            writes.push(PendingWrite::UpdateChapter {
                chapter_id: chapter_id.clone(),
                patch,
                previous,
            });
            Ok(OpOutcome::Applied {
                graph_changed: true,
            })
        }
        Op::DeleteChapter { chapter_id } => {
            let (index, snapshot) = story
                .remove_chapter(chapter_id)
                .ok_or_else(|| not_found(chapter_id))?;
            if state.involves_chapter(chapter_id) {
                state.clear();
            }
            debug!(chapter_id = %chapter_id, index, "delete chapter");
            writes.push(PendingWrite::DeleteChapter {
                chapter_id: chapter_id.clone(),
                index,
                snapshot,
            });
            Ok(OpOutcome::Applied {
                graph_changed: true,
            })
        }
        Op::SetChoiceRemember { choice, remember } => {
            set_choice_remember(story, state, choice, *remember, writes)
        }
        Op::UpdateStoryDetails { patch } => {
            let patch = StoryPatch::from(patch.clone());
            let previous = patch.capture(story);
            if patch.is_empty() || patch == previous {
                return Ok(OpOutcome::Applied {
                    graph_changed: false,
                });
            }
            apply_story_patch(story, &patch);
            debug!(story_id = %story.story_id(), "update story details");
            writes.push(PendingWrite::UpdateStory { patch, previous });
            Ok(OpOutcome::Applied {
                graph_changed: false,
            })
        }
    }
}

fn create_chapter(
    story: &mut Story,
    state: &mut EditorState,
    ctx: &mut OpContext<'_>,
    after: Option<&ChapterId>,
    writes: &mut Vec<PendingWrite>,
) -> Result<OpOutcome, EditError> {
    let position = match after {
        Some(after_id) => {
            let origin = story.chapter(after_id).ok_or_else(|| not_found(after_id))?;
            ctx.layout.linked_position(origin.position())
        }
        None => ctx.layout.fallback_position(story.chapters().len()),
    };

    let chapter_id = ctx.temp_ids.allocate(story)?;
    let mut chapter = Chapter::new(chapter_id.clone(), position);
    chapter.set_created_at(story.latest_created_at().saturating_add(1));
    writes.push(PendingWrite::CreateChapter {
        temp_id: chapter_id.clone(),
        chapter: chapter.clone(),
    });
    story.push_chapter(chapter);

    let linked = match after {
        Some(after_id) => link_new_chapter(story, state, after_id, &chapter_id, writes)?,
        None => {
            if let Some(chapter) = story.chapter(&chapter_id) {
                state.select_chapter(chapter);
            }
            false
        }
    };

    debug!(chapter_id = %chapter_id, linked, "create chapter");
    Ok(OpOutcome::Created(CreatedChapter { chapter_id, linked }))
}

/// Appends a choice on `after` leading to `target`, unless `after` is already full.
fn link_new_chapter(
    story: &mut Story,
    state: &mut EditorState,
    after: &ChapterId,
    target: &ChapterId,
    writes: &mut Vec<PendingWrite>,
) -> Result<bool, EditError> {
    let origin = story.chapter_mut(after).ok_or_else(|| not_found(after))?;
    if !origin.can_add_choice() {
        debug!(chapter_id = %after, "choice cap reached; new chapter left unlinked");
        return Ok(false);
    }

    let choice = Choice::linked_to(target.clone());
    let mut options: Choices = origin.options().iter().cloned().collect();
    options.push(choice.clone());
    let patch = ChapterPatch {
        options: Some(options),
        ..ChapterPatch::default()
    };
    let previous = patch.capture(origin);
    apply_chapter_patch(origin, &patch)?;
    writes.push(PendingWrite::UpdateChapter {
        chapter_id: after.clone(),
        patch,
        previous,
    });

    if let Some(buffer) = state.edit_buffer_mut() {
        if buffer.chapter_id() == after && buffer.push_choice(choice).is_err() {
            debug!(chapter_id = %after, "edit buffer full; linked choice not mirrored");
        }
    }
    Ok(true)
}

fn save_chapter(
    story: &mut Story,
    state: &mut EditorState,
    chapter_id: &ChapterId,
    writes: &mut Vec<PendingWrite>,
) -> Result<OpOutcome, EditError> {
    let Some(buffer) = buffer_in_edit(story, state, chapter_id)? else {
        return Ok(OpOutcome::Ignored);
    };
    let patch = ChapterPatch {
        title: Some(buffer.title().to_owned()),
        body: Some(buffer.paragraphs()),
        options: Some(buffer.to_choices()),
        position: None,
    };

    let chapter = story
        .chapter_mut(chapter_id)
        .ok_or_else(|| not_found(chapter_id))?;
    let previous = patch.capture(chapter);
    if patch == previous {
        state.refresh_buffer(chapter);
        return Ok(OpOutcome::Applied {
            graph_changed: false,
        });
    }

    apply_chapter_patch(chapter, &patch)?;
    state.refresh_buffer(chapter);
    warn_if_dropping_choices(chapter);
    debug!(chapter_id = %chapter_id, "save chapter");
    writes.push(PendingWrite::UpdateChapter {
        chapter_id: chapter_id.clone(),
        patch,
        previous,
    });
    Ok(OpOutcome::Applied {
        graph_changed: true,
    })
}

fn set_start_chapter(
    story: &mut Story,
    chapter_id: &ChapterId,
    confirmed: bool,
    writes: &mut Vec<PendingWrite>,
) -> Result<OpOutcome, EditError> {
    if !story.contains_chapter(chapter_id) {
        return Err(not_found(chapter_id));
    }
    if story.start_chapter_id() == Some(chapter_id) {
        return Ok(OpOutcome::Applied {
            graph_changed: false,
        });
    }
    if !confirmed {
        // A dangling start has nothing to lose, so it is replaced without asking.
        if let Some(current) = story
            .start_chapter_id()
            .filter(|current| story.contains_chapter(current))
        {
            return Ok(OpOutcome::NeedsConfirmation {
                current: current.clone(),
            });
        }
    }

    let patch = StoryPatch {
        start_chapter_id: Some(Some(chapter_id.clone())),
        ..StoryPatch::default()
    };
    let previous = patch.capture(story);
    story.set_start_chapter_id(Some(chapter_id.clone()));
    debug!(chapter_id = %chapter_id, "set start chapter");
    writes.push(PendingWrite::UpdateStory { patch, previous });
    Ok(OpOutcome::Applied {
        graph_changed: true,
    })
}

fn set_choice_remember(
    story: &mut Story,
    state: &mut EditorState,
    choice_ref: &ChoiceRef,
    remember: bool,
    writes: &mut Vec<PendingWrite>,
) -> Result<OpOutcome, EditError> {
    let chapter_id = &choice_ref.chapter_id;
    let chapter = story
        .chapter_mut(chapter_id)
        .ok_or_else(|| not_found(chapter_id))?;
    let len = chapter.options().len();
    let Some(current) = chapter.options().get(choice_ref.index) else {
        return Err(EditError::ChoiceIndexOutOfRange {
            chapter_id: chapter_id.clone(),
            index: choice_ref.index,
            len,
        });
    };
    if current.remember() == remember {
        return Ok(OpOutcome::Applied {
            graph_changed: false,
        });
    }

    let target = current.next_chapter_id().cloned();
    let mut options: Choices = chapter.options().iter().cloned().collect();
    options[choice_ref.index].set_remember(remember);
    let patch = ChapterPatch {
        options: Some(options),
        ..ChapterPatch::default()
    };
    let previous = patch.capture(chapter);
    apply_chapter_patch(chapter, &patch)?;

    // The buffer may hold unsaved reordering; only mirror onto the same edge.
    if let Some(buffer) = state.edit_buffer_mut() {
        if buffer.chapter_id() == chapter_id {
            match buffer.option_mut(choice_ref.index) {
                Some(option) if option.next_chapter_id() == target.as_ref() => {
                    option.set_remember(remember);
                }
                _ => debug!(choice = %choice_ref, "edit buffer diverged; remember not mirrored"),
            }
        }
    }
    warn_if_dropping_choices(chapter);

    debug!(choice = %choice_ref, remember, "set choice remember");
    writes.push(PendingWrite::UpdateChapter {
        chapter_id: chapter_id.clone(),
        patch,
        previous,
    });
    Ok(OpOutcome::Applied {
        graph_changed: true,
    })
}

/// The edit buffer for `chapter_id`, or `None` when nothing is in edit.
fn buffer_in_edit<'s>(
    story: &Story,
    state: &'s mut EditorState,
    chapter_id: &ChapterId,
) -> Result<Option<&'s mut EditBuffer>, EditError> {
    let Some(buffer) = state.edit_buffer_mut() else {
        return Ok(None);
    };
    if !story.contains_chapter(chapter_id) {
        return Err(not_found(chapter_id));
    }
    if buffer.chapter_id() != chapter_id {
        return Err(EditError::NotInEdit {
            chapter_id: chapter_id.clone(),
            in_edit: buffer.chapter_id().clone(),
        });
    }
    Ok(Some(buffer))
}

fn apply_chapter_patch(chapter: &mut Chapter, patch: &ChapterPatch) -> Result<(), EditError> {
    if let Some(options) = patch.options.as_ref() {
        chapter
            .set_options(options.clone())
            .map_err(|_| EditError::ChoiceLimit {
                chapter_id: chapter.chapter_id().clone(),
            })?;
    }
    if let Some(title) = patch.title.as_ref() {
        chapter.set_title(title.as_str());
    }
    if let Some(body) = patch.body.as_ref() {
        chapter.set_body(body.clone());
    }
    if let Some(position) = patch.position {
        chapter.set_position(position);
    }
    Ok(())
}

fn apply_story_patch(story: &mut Story, patch: &StoryPatch) {
    if let Some(start) = patch.start_chapter_id.as_ref() {
        story.set_start_chapter_id(start.clone());
    }
    let details = story.details_mut();
    if let Some(title) = patch.title.as_ref() {
        details.title = title.clone();
    }
    if let Some(description) = patch.description.as_ref() {
        details.description = description.clone();
    }
    if let Some(tags) = patch.tags.as_ref() {
        details.tags = tags.clone();
    }
    if let Some(cover_image) = patch.cover_image.as_ref() {
        details.cover_image = cover_image.clone();
    }
    if let Some(published) = patch.published {
        details.published = published;
    }
}

/// Reverts the local effect of a write that failed to persist.
///
/// Each field is restored only while it still holds the value the write put there. Returns
/// false when something could not be restored because later edits replaced it.
pub(crate) fn rollback_write(
    story: &mut Story,
    state: &mut EditorState,
    write: &PendingWrite,
) -> bool {
    match write {
        PendingWrite::CreateChapter { temp_id, .. } => {
            if state.involves_chapter(temp_id) {
                state.clear();
            }
            story.remove_chapter(temp_id).is_some()
        }
        PendingWrite::UpdateChapter {
            chapter_id,
            patch,
            previous,
        } => {
            let Some(chapter) = story.chapter_mut(chapter_id) else {
                return false;
            };
            rollback_chapter_fields(chapter, patch, previous)
        }
        PendingWrite::DeleteChapter {
            chapter_id,
            index,
            snapshot,
        } => {
            if story.contains_chapter(chapter_id) {
                return false;
            }
            story.insert_chapter(*index, snapshot.clone());
            true
        }
        PendingWrite::UpdateStory { patch, previous } => {
            rollback_story_fields(story, patch, previous)
        }
    }
}

fn rollback_chapter_fields(
    chapter: &mut Chapter,
    patch: &ChapterPatch,
    previous: &ChapterPatch,
) -> bool {
    let mut restored = true;

    if let (Some(written), Some(before)) = (patch.title.as_ref(), previous.title.as_ref()) {
        if chapter.title() == written {
            chapter.set_title(before.as_str());
        } else {
            restored = false;
        }
    }
    if let (Some(written), Some(before)) = (patch.body.as_ref(), previous.body.as_ref()) {
        if chapter.body() == written.as_slice() {
            chapter.set_body(before.clone());
        } else {
            restored = false;
        }
    }
    if let (Some(written), Some(before)) = (patch.options.as_ref(), previous.options.as_ref()) {
        if chapter.options() == written.as_slice() {
            restored &= chapter.set_options(before.clone()).is_ok();
        } else {
            restored = false;
        }
    }
    if let (Some(written), Some(before)) = (patch.position, previous.position) {
        if chapter.position() == written {
            chapter.set_position(before);
        } else {
            restored = false;
        }
    }
    restored
}

fn rollback_story_fields(story: &mut Story, patch: &StoryPatch, previous: &StoryPatch) -> bool {
    let mut restored = true;

    if let (Some(written), Some(before)) = (
        patch.start_chapter_id.as_ref(),
        previous.start_chapter_id.as_ref(),
    ) {
        if story.start_chapter_id() == written.as_ref() {
            story.set_start_chapter_id(before.clone());
        } else {
            restored = false;
        }
    }

    let details = story.details_mut();
    restored &= restore_field(&mut details.title, &patch.title, &previous.title);
    restored &= restore_field(
        &mut details.description,
        &patch.description,
        &previous.description,
    );
    restored &= restore_field(&mut details.tags, &patch.tags, &previous.tags);
    restored &= restore_field(
        &mut details.cover_image,
        &patch.cover_image,
        &previous.cover_image,
    );
    restored &= restore_field(&mut details.published, &patch.published, &previous.published);
    restored
}

fn restore_field<T: PartialEq + Clone>(
    current: &mut T,
    written: &Option<T>,
    before: &Option<T>,
) -> bool {
    match (written, before) {
        (Some(written), Some(before)) if current == written => {
            *current = before.clone();
            true
        }
        (Some(_), Some(_)) => false,
        _ => true,
    }
}

fn warn_if_dropping_choices(chapter: &Chapter) {
    if chapter.dropped_choices() > 0 {
        warn!(
            chapter_id = %chapter.chapter_id(),
            dropped = chapter.dropped_choices(),
            "saving options drops choices cut off at load"
        );
    }
}

fn not_found(chapter_id: &ChapterId) -> EditError {
    EditError::NotFound {
        chapter_id: chapter_id.clone(),
    }
}
