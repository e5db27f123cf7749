// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Talegraph-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Talegraph and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Talegraph: the editing model behind a branching-story graph editor.
//!
//! A story is a set of chapters linked by up to three choices each. [`projection`] turns
//! that into nodes and edges for a canvas, [`ops`] applies edits optimistically, and
//! [`store`] persists them to a document store. [`editor::StoryEditor`] ties the three
//! together for one editing session.

pub mod config;
pub mod editor;
pub mod model;
pub mod ops;
pub mod projection;
pub mod store;
pub mod ui;
