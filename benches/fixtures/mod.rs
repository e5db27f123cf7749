// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Talegraph-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Talegraph and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

#![allow(dead_code)]

// Shared deterministic benchmark fixtures (no RNG).

use talegraph::model::{Chapter, ChapterId, Choice, Choices, Position, Story, StoryDetails, StoryId};

#[derive(Debug, Clone, Copy)]
pub struct GraphParams {
    pub chapters: usize,
    /// Choices per chapter, capped at three by the model.
    pub fanout: usize,
    /// Every `broken_every`-th choice points at a chapter that does not exist (0 = never).
    pub broken_every: usize,
}

impl GraphParams {
    pub const fn new(chapters: usize, fanout: usize, broken_every: usize) -> Self {
        Self {
            chapters,
            fanout,
            broken_every,
        }
    }
}

pub fn chapter_id(index: usize) -> ChapterId {
    ChapterId::new(format!("ch-{index:05}")).expect("chapter id")
}

/// Chapters laid out on a grid; choice `k` of chapter `i` points `k + 1` chapters ahead,
/// so the last chapters end up as endings.
pub fn story(params: GraphParams) -> Story {
    let mut choice_counter = 0usize;
    let chapters = (0..params.chapters)
        .map(|index| {
            let options = (0..params.fanout.min(3))
                .filter_map(|k| {
                    let target = index + k + 1;
                    if target >= params.chapters {
                        return None;
                    }
                    choice_counter += 1;
                    let next = if params.broken_every > 0 && choice_counter % params.broken_every == 0
                    {
                        ChapterId::new(format!("gone-{choice_counter}")).expect("chapter id")
                    } else {
                        chapter_id(target)
                    };
                    Some(Choice::new(format!("choice {k}"), Some(next)).with_remember(k == 0))
                })
                .collect::<Choices>();

            Chapter::from_parts(
                chapter_id(index),
                format!("Chapter {index}"),
                vec![format!("Body of chapter {index}.")],
                options,
                Position::new((index % 10) as f64 * 250.0, (index / 10) as f64 * 200.0),
                index as u64,
            )
            .expect("fixture chapter")
        })
        .collect::<Vec<_>>();

    Story::with_parts(
        StoryId::new("bench").expect("story id"),
        StoryDetails::default(),
        Some(chapter_id(0)),
        chapters,
    )
}

pub fn checksum_projection(projection: &talegraph::projection::GraphProjection) -> u64 {
    let mut acc = 0u64;
    for node in &projection.nodes {
        acc = acc
            .wrapping_mul(131)
            .wrapping_add(node.id.as_str().len() as u64)
            .wrapping_add(u64::from(node.is_start) + u64::from(node.is_ending) * 2)
            .wrapping_add(u64::from(node.is_dead_end) * 4);
    }
    for edge in &projection.edges {
        acc = acc
            .wrapping_mul(131)
            .wrapping_add(edge.id.len() as u64)
            .wrapping_add(u64::from(edge.target_missing));
    }
    acc
}
