// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Talegraph-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Talegraph and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

use talegraph::config::EditorConfig;
use talegraph::editor::StoryEditor;
use talegraph::model::Position;
use talegraph::ops::Op;
use talegraph::projection::recompute_projection;

mod fixtures;

use fixtures::GraphParams;

// Benchmark identity (keep stable):
// - Group names in this file: `projection.recompute`, `projection.after_edit`
// - Case IDs must remain stable across refactors so results stay comparable over time.
fn benches_projection(c: &mut Criterion) {
    let cases = [
        ("small", GraphParams::new(12, 2, 0)),
        ("medium_dense", GraphParams::new(200, 3, 0)),
        ("large_broken_links", GraphParams::new(2_000, 3, 7)),
    ];

    {
        let mut group = c.benchmark_group("projection.recompute");

        for (case_id, params) in cases {
            let story = fixtures::story(params);
            group.throughput(Throughput::Elements(story.chapters().len() as u64));
            group.bench_function(case_id, move |b| {
                b.iter(|| {
                    let projection = recompute_projection(
                        black_box(story.chapters()),
                        black_box(story.start_chapter_id()),
                    );
                    black_box(fixtures::checksum_projection(&projection))
                })
            });
        }

        group.finish();
    }

    {
        let mut group = c.benchmark_group("projection.after_edit");

        for (case_id, params) in cases {
            let story = fixtures::story(params);
            let target = fixtures::chapter_id(params.chapters / 2);
            group.throughput(Throughput::Elements(story.chapters().len() as u64));
            group.bench_function(case_id, move |b| {
                let mut editor = StoryEditor::new(story.clone(), EditorConfig::default());
                let mut x = 0.0;
                b.iter(|| {
                    x += 1.0;
                    editor
                        .apply(Op::Reposition {
                            chapter_id: target.clone(),
                            position: Position::new(x, 0.0),
                        })
                        .expect("reposition");
                    editor.drain_writes();
                    black_box(editor.projection().nodes.len())
                })
            });
        }

        group.finish();
    }
}

criterion_group!(benches, benches_projection);
criterion_main!(benches);
