// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Talegraph-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Talegraph and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! The editing session for one story.
//!
//! `StoryEditor` owns the story, the selection state, and the current graph projection. Ops
//! mutate local state synchronously and queue [`PendingWrite`]s. Callers drain the queue,
//! run [`persist`] for each write (possibly concurrently), and hand every report back to
//! [`StoryEditor::settle`].
//!
//! Chapters created locally carry a temporary id until their create settles. Writes that
//! would show that id to the store wait in a deferred queue and are released, rewritten to
//! the permanent id, once every temporary id they mention is known. If a create fails,
//! every deferred write mentioning its id is rolled back with it.

use std::collections::BTreeSet;
use std::mem;

use tracing::{debug, warn};

use crate::config::EditorConfig;
use crate::model::{ChapterId, ChoiceRef, Position, Story, StoryId};
use crate::ops::{
    apply_op, rollback_write, EditError, Op, OpContext, OpOutcome, PendingWrite, TempIdAllocator,
};
use crate::projection::{recompute_projection, GraphProjection};
use crate::store::{
    load_story, persist, DocumentStore, LoadError, PersistOutcome, PersistReport, StoreError,
};
use crate::ui::{EditorState, Selection};

/// Interactions reported by the graph surface.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphEvent {
    NodeClicked(ChapterId),
    NodeDragReleased {
        chapter_id: ChapterId,
        position: Position,
    },
    EdgeClicked(ChoiceRef),
}

/// Result of [`StoryEditor::flush`].
#[derive(Debug, Default)]
pub struct FlushReport {
    pub persisted: usize,
    pub failures: Vec<EditError>,
}

impl FlushReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Debug)]
pub struct StoryEditor {
    story: Story,
    state: EditorState,
    projection: GraphProjection,
    config: EditorConfig,
    temp_ids: TempIdAllocator,
    /// Temporary ids whose create has not settled yet.
    pending_creates: BTreeSet<ChapterId>,
    /// Writes naming at least one pending temporary id, oldest first.
    deferred: Vec<PendingWrite>,
    outbox: Vec<PendingWrite>,
}

impl StoryEditor {
    pub fn new(story: Story, config: EditorConfig) -> Self {
        let projection = recompute_projection(story.chapters(), story.start_chapter_id());
        let temp_ids = TempIdAllocator::new(config.temp_id_prefix.clone());
        Self {
            story,
            state: EditorState::default(),
            projection,
            config,
            temp_ids,
            pending_creates: BTreeSet::new(),
            deferred: Vec::new(),
            outbox: Vec::new(),
        }
    }

    pub async fn load<S: DocumentStore + ?Sized>(
        store: &S,
        story_id: &StoryId,
        config: EditorConfig,
    ) -> Result<Self, LoadError> {
        let story = load_story(store, story_id, &config.layout).await?;
        Ok(Self::new(story, config))
    }

    /// Replaces local state with what the store holds.
    ///
    /// Queued and deferred writes are dropped. The selection survives when its chapter
    /// still exists, unsaved buffer edits included.
    pub async fn reload<S: DocumentStore + ?Sized>(&mut self, store: &S) -> Result<(), LoadError> {
        let story = load_story(store, self.story.story_id(), &self.config.layout).await?;
        let dropped = self.outbox.len() + self.deferred.len();
        if dropped > 0 {
            warn!(story_id = %story.story_id(), dropped, "reload discards unsent writes");
        }

        self.story = story;
        self.outbox.clear();
        self.deferred.clear();
        self.pending_creates.clear();
        let keep_selection = match self.state.selection() {
            Selection::None => true,
            Selection::Chapter(chapter_id) => self.story.contains_chapter(chapter_id),
            Selection::Choice(choice) => self
                .story
                .chapter(&choice.chapter_id)
                .is_some_and(|chapter| choice.index < chapter.options().len()),
        };
        if !keep_selection {
            self.state.clear();
        }
        self.refresh_projection();
        Ok(())
    }

    pub fn story(&self) -> &Story {
        &self.story
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn projection(&self) -> &GraphProjection {
        &self.projection
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Writes ready to send.
    pub fn queued_writes(&self) -> &[PendingWrite] {
        &self.outbox
    }

    /// Whether anything is queued, in flight as a create, or waiting on one.
    pub fn has_pending_writes(&self) -> bool {
        !self.outbox.is_empty() || !self.pending_creates.is_empty() || !self.deferred.is_empty()
    }

    pub fn is_temporary(&self, chapter_id: &ChapterId) -> bool {
        self.pending_creates.contains(chapter_id)
    }

    pub fn apply(&mut self, op: Op) -> Result<OpOutcome, EditError> {
        let mut writes = Vec::new();
        let mut ctx = OpContext {
            layout: &self.config.layout,
            temp_ids: &mut self.temp_ids,
        };
        let outcome = apply_op(
            &mut self.story,
            &mut self.state,
            &mut ctx,
            &op,
            &mut writes,
        )?;

        for write in writes {
            self.enqueue(write);
        }
        if outcome.graph_changed() {
            self.refresh_projection();
        }
        Ok(outcome)
    }

    /// Takes every write that is ready to send.
    pub fn drain_writes(&mut self) -> Vec<PendingWrite> {
        mem::take(&mut self.outbox)
    }

    /// Folds one persistence result back into local state.
    ///
    /// A successful create rebinds its temporary id and releases the writes that waited on
    /// it. A failure rolls the write back and is returned as [`EditError::Persistence`].
    pub fn settle(&mut self, report: PersistReport) -> Result<(), EditError> {
        let PersistReport { write, result } = report;
        match (write, result) {
            (
                PendingWrite::CreateChapter { temp_id, .. },
                Ok(PersistOutcome::Created { chapter_id }),
            ) => self.complete_create(&temp_id, &chapter_id),
            (PendingWrite::CreateChapter { temp_id, .. }, Ok(PersistOutcome::Saved)) => {
                Err(EditError::ChapterIdUnresolved {
                    chapter_id: temp_id,
                })
            }
            (_, Ok(_)) => Ok(()),
            (write, Err(source)) => Err(self.fail_write(write, source)),
        }
    }

    /// Sends every queued write one after another and settles each report.
    ///
    /// Writes released by a settled create are sent in the same call.
    pub async fn flush<S: DocumentStore + ?Sized>(&mut self, store: &S) -> FlushReport {
        let mut report = FlushReport::default();
        loop {
            let writes = self.drain_writes();
            if writes.is_empty() {
                break;
            }
            for write in writes {
                let persisted = persist(store, self.story.story_id(), write).await;
                match self.settle(persisted) {
                    Ok(()) => report.persisted += 1,
                    Err(err) => report.failures.push(err),
                }
            }
        }
        report
    }

    pub fn select_chapter(&mut self, chapter_id: &ChapterId) -> Result<(), EditError> {
        let chapter = self
            .story
            .chapter(chapter_id)
            .ok_or_else(|| EditError::NotFound {
                chapter_id: chapter_id.clone(),
            })?;
        self.state.select_chapter(chapter);
        Ok(())
    }

    pub fn select_choice(&mut self, choice: ChoiceRef) -> Result<(), EditError> {
        let chapter = self
            .story
            .chapter(&choice.chapter_id)
            .ok_or_else(|| EditError::NotFound {
                chapter_id: choice.chapter_id.clone(),
            })?;
        let len = chapter.options().len();
        if choice.index >= len {
            return Err(EditError::ChoiceIndexOutOfRange {
                chapter_id: choice.chapter_id,
                index: choice.index,
                len,
            });
        }
        self.state.select_choice(choice);
        Ok(())
    }

    /// Discards the edit buffer and clears the selection.
    pub fn close_editor(&mut self) {
        self.state.clear();
    }

    pub fn handle_event(&mut self, event: GraphEvent) -> Result<OpOutcome, EditError> {
        match event {
            GraphEvent::NodeClicked(chapter_id) => {
                self.select_chapter(&chapter_id)?;
                Ok(OpOutcome::Applied {
                    graph_changed: false,
                })
            }
            GraphEvent::NodeDragReleased {
                chapter_id,
                position,
            } => self.apply(Op::Reposition {
                chapter_id,
                position,
            }),
            GraphEvent::EdgeClicked(choice) => {
                self.select_choice(choice)?;
                Ok(OpOutcome::Applied {
                    graph_changed: false,
                })
            }
        }
    }

    /// Every chapter as a `(id, label)` pair for a destination picker, in chapter order.
    pub fn destination_options(&self) -> Vec<(ChapterId, String)> {
        self.story
            .chapters()
            .iter()
            .map(|chapter| (chapter.chapter_id().clone(), chapter.display_title()))
            .collect()
    }

    fn refresh_projection(&mut self) {
        self.projection =
            recompute_projection(self.story.chapters(), self.story.start_chapter_id());
    }

    fn enqueue(&mut self, write: PendingWrite) {
        if let PendingWrite::CreateChapter { temp_id, .. } = &write {
            self.pending_creates.insert(temp_id.clone());
            self.outbox.push(write);
            return;
        }

        let blocking = self.blocking_id(&write).cloned();
        match blocking {
            Some(temp_id) => {
                debug!(temp_id = %temp_id, write = %write.kind(), "write deferred until create settles");
                self.deferred.push(write);
            }
            None => self.outbox.push(write),
        }
    }

    /// The first pending temporary id `write` mentions.
    fn blocking_id<'w>(&self, write: &'w PendingWrite) -> Option<&'w ChapterId> {
        write
            .referenced_chapter_ids()
            .into_iter()
            .find(|id| self.pending_creates.contains(*id))
    }

    fn complete_create(
        &mut self,
        temp_id: &ChapterId,
        chapter_id: &ChapterId,
    ) -> Result<(), EditError> {
        if !self.pending_creates.remove(temp_id) {
            return Err(EditError::ChapterIdUnresolved {
                chapter_id: temp_id.clone(),
            });
        }

        self.rebind_chapter_id(temp_id, chapter_id);
        let (ready, waiting): (Vec<_>, Vec<_>) = mem::take(&mut self.deferred)
            .into_iter()
            .partition(|write| self.blocking_id(write).is_none());
        self.deferred = waiting;
        debug!(
            temp_id = %temp_id,
            chapter_id = %chapter_id,
            released = ready.len(),
            "chapter id assigned"
        );
        self.outbox.extend(ready);
        self.refresh_projection();
        Ok(())
    }

    fn fail_write(&mut self, write: PendingWrite, source: StoreError) -> EditError {
        let kind = write.kind();
        let chapter_id = write.chapter_id().cloned();

        let mut rolled_back = true;
        if let PendingWrite::CreateChapter { temp_id, .. } = &write {
            self.pending_creates.remove(temp_id);
            // Nothing naming the failed id was ever sent; undo it newest first.
            let (doomed, kept): (Vec<_>, Vec<_>) = mem::take(&mut self.deferred)
                .into_iter()
                .partition(|waiting| waiting.referenced_chapter_ids().contains(&temp_id));
            self.deferred = kept;
            for waiting in doomed.iter().rev() {
                rolled_back &= rollback_write(&mut self.story, &mut self.state, waiting);
            }
            let unlinked = self.state.forget_chapter(temp_id);
            if unlinked > 0 {
                debug!(temp_id = %temp_id, unlinked, "buffered choices to failed chapter dropped");
            }
        }
        rolled_back &= rollback_write(&mut self.story, &mut self.state, &write);
        self.refresh_projection();

        if rolled_back {
            warn!(write = %kind, chapter_id = ?chapter_id, error = %source, "write failed; local change undone");
        } else {
            warn!(write = %kind, chapter_id = ?chapter_id, error = %source, "write failed; reload required");
        }
        EditError::Persistence {
            write: kind,
            chapter_id,
            source,
            rolled_back,
        }
    }

    fn rebind_chapter_id(&mut self, from: &ChapterId, to: &ChapterId) {
        if let Some(chapter) = self.story.chapter_mut(from) {
            chapter.set_chapter_id(to.clone());
        }
        for chapter in self.story.chapters_mut() {
            chapter.retarget_choices(from, to);
        }
        if self.story.start_chapter_id() == Some(from) {
            self.story.set_start_chapter_id(Some(to.clone()));
        }
        self.state.rebind_chapter_id(from, to);
        for write in self.outbox.iter_mut() {
            write.rebind_chapter_id(from, to);
        }
        for write in self.deferred.iter_mut() {
            write.rebind_chapter_id(from, to);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{GraphEvent, StoryEditor};
    use crate::config::EditorConfig;
    use crate::model::fixtures::{cid, story_three_chapter_chain};
    use crate::model::{ChoiceRef, Position};
    use crate::ops::{EditError, Op, OpOutcome, PendingWrite, WriteKind};
    use crate::store::{PersistOutcome, PersistReport, StoreError, StoreOperation};

    fn editor() -> StoryEditor {
        StoryEditor::new(story_three_chapter_chain(), EditorConfig::default())
    }

    fn created(write: PendingWrite, id: &str) -> PersistReport {
        PersistReport {
            write,
            result: Ok(PersistOutcome::Created {
                chapter_id: cid(id),
            }),
        }
    }

    fn failed(write: PendingWrite) -> PersistReport {
        PersistReport {
            write,
            result: Err(StoreError::Unavailable {
                operation: StoreOperation::UpdateChapter,
                reason: "offline".to_owned(),
            }),
        }
    }

    #[test]
    fn linked_create_defers_the_origin_update_until_the_id_is_known() {
        let mut editor = editor();
        editor
            .apply(Op::CreateChapter {
                after: Some(cid("c")),
            })
            .expect("create");

        let writes = editor.drain_writes();
        assert_eq!(writes.len(), 1, "origin update waits for the create");
        assert_eq!(writes[0].kind(), WriteKind::CreateChapter);
        assert!(editor.is_temporary(&cid("temp-1")));
        assert!(editor.has_pending_writes());

        let create = writes.into_iter().next().expect("create");
        editor.settle(created(create, "ch-42")).expect("settle");

        assert!(!editor.is_temporary(&cid("temp-1")));
        assert!(editor.story().contains_chapter(&cid("ch-42")));
        let c = editor.story().chapter(&cid("c")).expect("c");
        assert_eq!(c.options()[0].next_chapter_id(), Some(&cid("ch-42")));

        let released = editor.drain_writes();
        let [PendingWrite::UpdateChapter {
            chapter_id, patch, ..
        }] = released.as_slice()
        else {
            panic!("expected the released origin update, got {released:?}");
        };
        assert_eq!(chapter_id, &cid("c"));
        let options = patch.options.as_ref().expect("options");
        assert_eq!(options[0].next_chapter_id(), Some(&cid("ch-42")));
        assert!(editor.projection().node(&cid("ch-42")).is_some());
    }

    #[test]
    fn failed_create_settled_first_takes_shared_link_writes_with_it() {
        let mut editor = editor();
        editor.select_chapter(&cid("c")).expect("select c");
        for _ in 0..2 {
            editor
                .apply(Op::CreateChapter {
                    after: Some(cid("c")),
                })
                .expect("create");
        }

        let mut creates = editor.drain_writes().into_iter();
        let first = creates.next().expect("first create");
        let second = creates.next().expect("second create");

        let err = editor.settle(failed(second)).unwrap_err();
        assert!(matches!(
            err,
            EditError::Persistence {
                write: WriteKind::CreateChapter,
                rolled_back: true,
                ..
            }
        ));
        assert!(!editor.story().contains_chapter(&cid("temp-2")));
        let targets = |options: &[crate::model::Choice]| {
            options
                .iter()
                .map(|choice| choice.next_chapter_id().map(|id| id.as_str().to_owned()))
                .collect::<Vec<_>>()
        };
        let c = editor.story().chapter(&cid("c")).expect("c");
        assert_eq!(targets(c.options()), vec![Some("temp-1".to_owned())]);
        let buffer = editor.state().edit_buffer().expect("c still in edit");
        assert_eq!(targets(buffer.options()), vec![Some("temp-1".to_owned())]);

        editor.settle(created(first, "ch-1")).expect("settle first");
        let released = editor.drain_writes();
        assert_eq!(released.len(), 1, "only the first link update survives");
        assert!(released.iter().all(|write| !write
            .referenced_chapter_ids()
            .contains(&&cid("temp-2"))));
        let PendingWrite::UpdateChapter { patch, .. } = &released[0] else {
            panic!("expected the origin update, got {released:?}");
        };
        let options = patch.options.as_ref().expect("options");
        assert_eq!(targets(&options[..]), vec![Some("ch-1".to_owned())]);
        assert!(!editor.has_pending_writes());
    }

    #[test]
    fn failed_create_removes_the_chapter_and_the_link() {
        let mut editor = editor();
        editor
            .apply(Op::CreateChapter {
                after: Some(cid("c")),
            })
            .expect("create");
        let create = editor.drain_writes().into_iter().next().expect("create");

        let err = editor.settle(failed(create)).unwrap_err();
        assert!(matches!(
            err,
            EditError::Persistence {
                write: WriteKind::CreateChapter,
                rolled_back: true,
                ..
            }
        ));
        assert!(!editor.story().contains_chapter(&cid("temp-1")));
        assert!(editor.story().chapter(&cid("c")).expect("c").options().is_empty());
        assert!(!editor.has_pending_writes());
        assert_eq!(editor.projection().nodes.len(), 3);
    }

    #[test]
    fn edits_to_a_temp_chapter_follow_its_new_id() {
        let mut editor = editor();
        let outcome = editor
            .apply(Op::CreateChapter { after: None })
            .expect("create");
        let OpOutcome::Created(new) = outcome else {
            panic!("expected Created");
        };
        editor
            .apply(Op::RenameChapter {
                chapter_id: new.chapter_id.clone(),
                title: "Fresh".to_owned(),
            })
            .expect("rename");
        editor
            .apply(Op::SaveChapter {
                chapter_id: new.chapter_id.clone(),
            })
            .expect("save");
        editor
            .apply(Op::SetStartChapter {
                chapter_id: new.chapter_id.clone(),
                confirmed: true,
            })
            .expect("start");

        let create = editor.drain_writes();
        assert_eq!(create.len(), 1);
        editor
            .settle(created(create.into_iter().next().expect("create"), "ch-9"))
            .expect("settle");

        assert_eq!(editor.state().selected_chapter_id(), Some(&cid("ch-9")));
        assert_eq!(editor.story().start_chapter_id(), Some(&cid("ch-9")));
        let released = editor.drain_writes();
        assert_eq!(released.len(), 2);
        assert_eq!(released[0].chapter_id(), Some(&cid("ch-9")));
        assert!(released
            .iter()
            .all(|write| !write.referenced_chapter_ids().contains(&&cid("temp-1"))));
    }

    #[test]
    fn deleting_a_temp_chapter_deletes_it_remotely_after_create() {
        let mut editor = editor();
        editor
            .apply(Op::CreateChapter { after: None })
            .expect("create");
        editor
            .apply(Op::DeleteChapter {
                chapter_id: cid("temp-1"),
            })
            .expect("delete");
        let create = editor.drain_writes().into_iter().next().expect("create");

        editor.settle(created(create, "ch-5")).expect("settle");
        let released = editor.drain_writes();
        assert!(matches!(
            released.as_slice(),
            [PendingWrite::DeleteChapter { chapter_id, .. }] if chapter_id == &cid("ch-5")
        ));
        assert!(!editor.story().contains_chapter(&cid("ch-5")));
    }

    #[test]
    fn failed_update_rolls_back_and_recomputes() {
        let mut editor = editor();
        editor
            .apply(Op::SetChoiceRemember {
                choice: ChoiceRef::new(cid("a"), 0),
                remember: true,
            })
            .expect("toggle");
        assert!(editor.projection().edges[0].remembered);

        let write = editor.drain_writes().into_iter().next().expect("write");
        let err = editor.settle(failed(write)).unwrap_err();
        assert!(!err.needs_reload());
        assert!(!editor.projection().edges[0].remembered);
    }

    #[test]
    fn graph_events_route_to_selection_and_reposition() {
        let mut editor = editor();
        editor
            .handle_event(GraphEvent::NodeClicked(cid("b")))
            .expect("click");
        assert_eq!(editor.state().selected_chapter_id(), Some(&cid("b")));

        editor
            .handle_event(GraphEvent::EdgeClicked(ChoiceRef::new(cid("a"), 0)))
            .expect("edge");
        assert!(editor.state().edit_buffer().is_none());

        let outcome = editor
            .handle_event(GraphEvent::NodeDragReleased {
                chapter_id: cid("c"),
                position: Position::new(50.0, 60.0),
            })
            .expect("drag");
        assert!(outcome.graph_changed());
        assert_eq!(
            editor.projection().node(&cid("c")).expect("c").position,
            Position::new(50.0, 60.0)
        );

        let err = editor
            .handle_event(GraphEvent::EdgeClicked(ChoiceRef::new(cid("c"), 0)))
            .unwrap_err();
        assert!(matches!(err, EditError::ChoiceIndexOutOfRange { .. }));
    }

    #[test]
    fn selection_changes_do_not_touch_the_projection() {
        let mut editor = editor();
        let before = editor.projection().clone();
        editor.select_chapter(&cid("a")).expect("select");
        editor
            .apply(Op::RenameChapter {
                chapter_id: cid("a"),
                title: "Unsaved".to_owned(),
            })
            .expect("rename");
        editor.close_editor();

        assert_eq!(editor.projection(), &before);
        assert_eq!(editor.story().chapter(&cid("a")).expect("a").title(), "A");
    }

    #[test]
    fn destination_options_label_untitled_chapters() {
        let mut editor = editor();
        editor
            .apply(Op::CreateChapter { after: None })
            .expect("create");

        let options = editor.destination_options();
        assert_eq!(options.len(), 4);
        assert_eq!(options[0], (cid("a"), "A".to_owned()));
        assert_eq!(options[3].1, "Untitled (temp-1)");
    }
}
