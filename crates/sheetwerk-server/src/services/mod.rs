// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Service layer: where generated files live and how long they stay.

pub mod retention;
pub mod storage;

pub use retention::spawn_retention;
pub use storage::{ArtifactKind, Artifacts, OutputStore};
