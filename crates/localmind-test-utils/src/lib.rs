// SPDX-FileCopyrightText: 2026 Local-Mind Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Local-Mind integration tests.
//!
//! Provides mock adapters and test harness infrastructure for fast,
//! deterministic tests without a running Ollama.
//!
//! # Components
//!
//! - [`MockGeneration`] - Mock generation backend with scripted replies
//! - [`ScriptedTransport`] - Chat transport with frame injection and capture
//! - [`TestHarness`] - The full chat stack over a temp database

pub mod harness;
pub mod mock_generation;
pub mod transport;

pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_generation::{text_vector, ChatCall, MockGeneration};
pub use transport::ScriptedTransport;
