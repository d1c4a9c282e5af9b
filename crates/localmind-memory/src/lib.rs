// SPDX-FileCopyrightText: 2026 Local-Mind Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Long-term fact index for Local-Mind.
//!
//! Facts are stored in SQLite with their embeddings as little-endian `f32`
//! BLOBs, grouped into named collections that each have a fixed dimension.
//!
//! - **FactStore**: raw persistence for collections and facts
//! - **SqliteRetrievalIndex**: the `RetrievalIndex` adapter (schema negotiation, cosine search)
//! - **Types**: Fact, ScoredFact, vector helpers

pub mod index;
pub mod store;
pub mod types;

pub use index::SqliteRetrievalIndex;
pub use store::{FactStore, StoredDimension};
pub use types::*;
