// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Talegraph-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Talegraph and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use rstest::rstest;

use super::{recompute_projection, NodeBadge, NodeBorder};
use crate::model::fixtures::{chapter, cid, story_three_chapter_chain, story_with_broken_links};
use crate::model::{Choice, Position};

#[test]
fn chain_projects_start_ending_and_remembered_edge() {
    let story = story_three_chapter_chain();
    let projection = recompute_projection(story.chapters(), story.start_chapter_id());

    assert_eq!(projection.nodes.len(), 3);
    assert_eq!(projection.edges.len(), 2);

    let a = projection.node(&cid("a")).expect("node a");
    assert!(a.is_start);
    assert!(!a.is_ending);
    assert_eq!(a.border, NodeBorder::Start);
    assert_eq!(a.badges, vec![NodeBadge::Start]);

    let b = projection.node(&cid("b")).expect("node b");
    assert!(!b.is_start);
    assert!(!b.is_ending);
    assert_eq!(b.border, NodeBorder::Default);
    assert!(b.badges.is_empty());

    let c = projection.node(&cid("c")).expect("node c");
    assert!(c.is_ending);
    assert_eq!(c.border, NodeBorder::Default);
    assert_eq!(c.badges, vec![NodeBadge::Ending]);

    assert!(projection.nodes.iter().all(|node| !node.is_dead_end));
    assert!(projection
        .nodes
        .iter()
        .all(|node| node.border != NodeBorder::Dashed));

    let ab = projection.edges_from(&cid("a")).next().expect("edge a->b");
    assert_eq!(ab.id, "a/b/0");
    assert_eq!(ab.target, cid("b"));
    assert_eq!(ab.label, "go");
    assert!(!ab.remembered);

    let bc = projection.edges_from(&cid("b")).next().expect("edge b->c");
    assert_eq!(bc.target, cid("c"));
    assert!(bc.remembered);
    assert!(!bc.target_missing);
}

#[test]
fn broken_links_still_draw_and_mark_dead_end() {
    let story = story_with_broken_links();
    let projection = recompute_projection(story.chapters(), story.start_chapter_id());

    let hub = projection.node(&cid("hub")).expect("hub");
    assert!(hub.is_start);
    assert!(hub.is_dead_end);
    assert!(!hub.is_ending);
    assert_eq!(hub.border, NodeBorder::Dashed, "dead end wins over start");
    assert_eq!(hub.badges, vec![NodeBadge::Start]);

    let hub_edges = projection.edges_from(&cid("hub")).collect::<Vec<_>>();
    assert_eq!(hub_edges.len(), 2, "dangling choice draws no edge");
    assert_eq!(hub_edges[0].id, "hub/left/0");
    assert!(!hub_edges[0].target_missing);
    assert_eq!(hub_edges[1].id, "hub/ghost/1");
    assert!(hub_edges[1].target_missing);

    let only_broken = projection.node(&cid("only-broken")).expect("only broken");
    assert!(only_broken.is_ending);
    assert!(only_broken.is_dead_end);
    assert_eq!(only_broken.border, NodeBorder::Dashed);
    assert_eq!(only_broken.badges, vec![NodeBadge::Ending]);
}

#[rstest]
#[case::single_dangling(vec![Choice::new("go", None)], true, false)]
#[case::no_options(Vec::new(), true, false)]
#[case::to_live(vec![Choice::new("go", Some(cid("target")))], false, false)]
#[case::to_ghost(vec![Choice::new("go", Some(cid("ghost")))], true, true)]
#[case::live_and_ghost(
    vec![Choice::new("a", Some(cid("target"))), Choice::new("b", Some(cid("ghost")))],
    false,
    true
)]
#[case::dangling_and_live(
    vec![Choice::blank(), Choice::new("b", Some(cid("target")))],
    false,
    false
)]
fn classification_cases(
    #[case] options: Vec<Choice>,
    #[case] is_ending: bool,
    #[case] is_dead_end: bool,
) {
    let subject = chapter("subject", "Subject", options, 100.0);
    let target = chapter("target", "Target", Vec::new(), 300.0);
    let chapters = vec![subject, target];

    let projection = recompute_projection(&chapters, None);
    let node = projection.node(&cid("subject")).expect("subject");

    assert_eq!(node.is_ending, is_ending);
    assert_eq!(node.is_dead_end, is_dead_end);
    assert!(!node.is_start);
}

#[test]
fn projection_is_deterministic() {
    let story = story_with_broken_links();

    let first = recompute_projection(story.chapters(), story.start_chapter_id());
    let second = recompute_projection(story.chapters(), story.start_chapter_id());

    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).expect("json"),
        serde_json::to_string(&second).expect("json")
    );
}

#[test]
fn nodes_follow_chapter_order_and_carry_positions() {
    let chapters = vec![
        chapter("z", "Z", Vec::new(), 100.0),
        chapter("a", "A", Vec::new(), 300.0),
    ];

    let projection = recompute_projection(&chapters, Some(&cid("missing")));

    let ids = projection
        .nodes
        .iter()
        .map(|node| node.id.as_str())
        .collect::<Vec<_>>();
    assert_eq!(ids, vec!["z", "a"]);
    assert_eq!(projection.nodes[1].position, Position::new(100.0, 300.0));
    assert!(projection.nodes.iter().all(|node| !node.is_start));
}

#[test]
fn serialized_node_uses_camel_case_flags() {
    let story = story_three_chapter_chain();
    let projection = recompute_projection(story.chapters(), story.start_chapter_id());

    let json = serde_json::to_value(&projection).expect("json");
    assert_eq!(json["nodes"][0]["isStart"], true);
    assert_eq!(json["nodes"][0]["border"], "start");
    assert_eq!(json["nodes"][2]["badges"][0], "ending");
    assert_eq!(json["edges"][1]["remembered"], true);
    assert_eq!(json["edges"][1]["choice"]["chapterId"], "b");
}

#[test]
fn edge_ids_stay_distinct_when_ids_contain_dashes() {
    let chapters = vec![
        chapter("a", "A", vec![Choice::new("x", Some(cid("b-c")))], 100.0),
        chapter("a-b", "AB", vec![Choice::new("y", Some(cid("c")))], 300.0),
        chapter("b-c", "BC", Vec::new(), 500.0),
        chapter("c", "C", Vec::new(), 700.0),
    ];
    let projection = recompute_projection(&chapters, None);

    let ids = projection
        .edges
        .iter()
        .map(|edge| edge.id.as_str())
        .collect::<Vec<_>>();
    assert_eq!(ids, vec!["a/b-c/0", "a-b/c/0"]);
}

#[test]
fn chapters_with_dropped_choices_carry_a_badge() {
    let mut trimmed = chapter("t", "T", vec![Choice::new("x", None)], 100.0);
    trimmed.set_dropped_choices(1);
    let chapters = vec![trimmed, chapter("u", "U", vec![Choice::new("y", None)], 300.0)];

    let projection = recompute_projection(&chapters, None);
    assert_eq!(
        projection.nodes[0].badges,
        vec![NodeBadge::Ending, NodeBadge::ChoicesDropped]
    );
    assert_eq!(projection.nodes[1].badges, vec![NodeBadge::Ending]);
}
