// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Talegraph-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Talegraph and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Graph projection: chapters plus a start chapter in, renderable nodes and edges out.
//!
//! The projection is a pure function and is recomputed in full after every committed
//! mutation. Story graphs are small, so there is no incremental path.

use std::collections::HashSet;

use serde::Serialize;

use crate::model::{Chapter, ChapterId, ChoiceRef, ChoiceTarget, Position};

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct GraphProjection {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl GraphProjection {
    pub fn node(&self, chapter_id: &ChapterId) -> Option<&Node> {
        self.nodes.iter().find(|node| &node.id == chapter_id)
    }

    pub fn edges_from(&self, chapter_id: &ChapterId) -> impl Iterator<Item = &Edge> + '_ {
        let chapter_id = chapter_id.clone();
        self.edges
            .iter()
            .filter(move |edge| edge.source == chapter_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: ChapterId,
    pub label: String,
    pub position: Position,
    pub is_start: bool,
    pub is_ending: bool,
    pub is_dead_end: bool,
    pub border: NodeBorder,
    pub badges: Vec<NodeBadge>,
}

/// Border precedence: dead end over start over default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeBorder {
    Default,
    Start,
    Dashed,
}

/// Additive markers that coexist with any border.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeBadge {
    Start,
    Ending,
    /// Some stored choices were dropped at load; saving this chapter makes that permanent.
    ChoicesDropped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    /// `<source>/<target>/<choice index>`. Ids never contain `/`, so this is unambiguous.
    pub id: String,
    pub source: ChapterId,
    pub target: ChapterId,
    pub label: String,
    pub remembered: bool,
    pub choice: ChoiceRef,
    /// The target chapter does not exist; renderers may draw the edge distinctly.
    pub target_missing: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NodeFlags {
    pub is_start: bool,
    pub is_ending: bool,
    pub is_dead_end: bool,
}

impl NodeFlags {
    pub fn border(&self) -> NodeBorder {
        if self.is_dead_end {
            NodeBorder::Dashed
        } else if self.is_start {
            NodeBorder::Start
        } else {
            NodeBorder::Default
        }
    }

    pub fn badges(&self) -> Vec<NodeBadge> {
        let mut badges = Vec::new();
        if self.is_start {
            badges.push(NodeBadge::Start);
        }
        if self.is_ending {
            badges.push(NodeBadge::Ending);
        }
        badges
    }
}

/// Classifies one chapter against the live id set.
///
/// Ending: no choice reaches a live chapter. Dead end: some choice names a chapter that does
/// not exist. A chapter whose only choices are broken is both.
pub fn classify_chapter(
    chapter: &Chapter,
    live: &HashSet<&ChapterId>,
    start_chapter_id: Option<&ChapterId>,
) -> NodeFlags {
    let mut is_ending = true;
    let mut is_dead_end = false;

    for choice in chapter.options() {
        match choice.target(|id| live.contains(id)) {
            ChoiceTarget::Dangling => {}
            ChoiceTarget::Live(_) => is_ending = false,
            ChoiceTarget::Broken(_) => is_dead_end = true,
        }
    }

    NodeFlags {
        is_start: start_chapter_id == Some(chapter.chapter_id()),
        is_ending,
        is_dead_end,
    }
}

pub fn edge_id(source: &ChapterId, target: &ChapterId, index: usize) -> String {
    format!("{source}/{target}/{index}")
}

pub fn recompute_projection(
    chapters: &[Chapter],
    start_chapter_id: Option<&ChapterId>,
) -> GraphProjection {
    let live = chapters
        .iter()
        .map(Chapter::chapter_id)
        .collect::<HashSet<_>>();

    let mut nodes = Vec::with_capacity(chapters.len());
    let mut edges = Vec::new();

    for chapter in chapters {
        let flags = classify_chapter(chapter, &live, start_chapter_id);
        let mut badges = flags.badges();
        if chapter.dropped_choices() > 0 {
            badges.push(NodeBadge::ChoicesDropped);
        }
        nodes.push(Node {
            id: chapter.chapter_id().clone(),
            label: chapter.title().to_owned(),
            position: chapter.position(),
            is_start: flags.is_start,
            is_ending: flags.is_ending,
            is_dead_end: flags.is_dead_end,
            border: flags.border(),
            badges,
        });

        for (index, choice) in chapter.options().iter().enumerate() {
            let Some(target) = choice.next_chapter_id() else {
                continue;
            };
            edges.push(Edge {
                id: edge_id(chapter.chapter_id(), target, index),
                source: chapter.chapter_id().clone(),
                target: target.clone(),
                label: choice.text().to_owned(),
                remembered: choice.remember(),
                choice: ChoiceRef::new(chapter.chapter_id().clone(), index),
                target_missing: !live.contains(target),
            });
        }
    }

    GraphProjection { nodes, edges }
}

#[cfg(test)]
mod tests;
