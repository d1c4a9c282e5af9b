// SPDX-FileCopyrightText: 2026 Local-Mind Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fact type and vector helpers for the long-term fact index.

use serde::{Deserialize, Serialize};

/// A fact stored in the index. Immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fact {
    /// Unique identifier, assigned on insert.
    pub id: String,
    /// The raw text that was embedded.
    pub text: String,
    /// Embedding vector; its length equals the collection dimension.
    #[serde(skip)]
    pub embedding: Vec<f32>,
    /// Epoch seconds.
    pub created_at: i64,
}

/// A fact text paired with its similarity to a query.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredFact {
    pub text: String,
    pub score: f32,
}

/// Convert f32 vector to bytes for SQLite BLOB storage.
pub fn vec_to_blob(vec: &[f32]) -> Vec<u8> {
    vec.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Convert SQLite BLOB back to f32 vector.
///
/// Trailing bytes that do not form a whole `f32` are ignored; callers compare
/// the decoded length against the collection dimension.
pub fn blob_to_vec(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

/// Cosine similarity of two equal-length vectors.
///
/// Vectors are not assumed to be normalized. A zero vector has similarity 0
/// with everything, and so do vectors of different lengths.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let (mut dot, mut norm_a, mut norm_b) = (0.0_f32, 0.0_f32, 0.0_f32);
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Rank `candidates` against `query`, most similar first, keeping at most `limit`.
pub fn rank_by_similarity(
    query: &[f32],
    candidates: Vec<(String, Vec<f32>)>,
    limit: usize,
) -> Vec<ScoredFact> {
    let mut scored: Vec<ScoredFact> = candidates
        .into_iter()
        .map(|(text, embedding)| ScoredFact {
            score: cosine_similarity(query, &embedding),
            text,
        })
        .collect();
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored.truncate(limit);
    scored
}
