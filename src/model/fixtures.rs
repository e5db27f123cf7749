// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Talegraph-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Talegraph and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use super::chapter::{Chapter, Choice, Choices, Position};
use super::ids::{ChapterId, StoryId};
use super::story::{Story, StoryDetails};

pub(crate) fn cid(value: &str) -> ChapterId {
    ChapterId::new(value).expect("chapter id")
}

pub(crate) fn chapter(id: &str, title: &str, options: Vec<Choice>, y: f64) -> Chapter {
    Chapter::from_parts(
        cid(id),
        title,
        vec![format!("{title} body.")],
        options.into_iter().collect::<Choices>(),
        Position::new(100.0, y),
        0,
    )
    .expect("fixture chapter")
}

/// A(start) -> B -> C, where B -> C is remembered and C has no options.
pub(crate) fn story_three_chapter_chain() -> Story {
    let a = chapter("a", "A", vec![Choice::new("go", Some(cid("b")))], 100.0);
    let b = chapter(
        "b",
        "B",
        vec![Choice::new("onward", Some(cid("c"))).with_remember(true)],
        300.0,
    );
    let c = chapter("c", "C", Vec::new(), 500.0);

    Story::with_parts(
        StoryId::new("s-chain").expect("story id"),
        StoryDetails {
            title: "Chain".to_owned(),
            ..StoryDetails::default()
        },
        Some(cid("a")),
        vec![a, b, c],
    )
}

/// A story where `hub` links to a live chapter, a deleted one, and nowhere.
pub(crate) fn story_with_broken_links() -> Story {
    let hub = chapter(
        "hub",
        "Hub",
        vec![
            Choice::new("left", Some(cid("left"))),
            Choice::new("ghost", Some(cid("ghost"))),
            Choice::new("", None),
        ],
        100.0,
    );
    let left = chapter("left", "Left", vec![Choice::blank()], 300.0);
    let only_broken = chapter(
        "only-broken",
        "Only Broken",
        vec![Choice::new("void", Some(cid("gone")))],
        500.0,
    );

    Story::with_parts(
        StoryId::new("s-broken").expect("story id"),
        StoryDetails::default(),
        Some(cid("hub")),
        vec![hub, left, only_broken],
    )
}
