// SPDX-FileCopyrightText: 2026 Local-Mind Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions for the Local-Mind backends.
//!
//! All adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod generation;
pub mod retrieval;
pub mod session_log;
pub mod storage;
pub mod transport;

pub use adapter::PluginAdapter;
pub use generation::{GenerationClient, ModelAdmin, TokenStream};
pub use retrieval::RetrievalIndex;
pub use session_log::SessionLog;
pub use storage::StorageAdapter;
pub use transport::ChatTransport;
