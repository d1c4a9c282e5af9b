// SPDX-FileCopyrightText: 2026 Local-Mind Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat turn orchestration for Local-Mind.
//!
//! The [`ChatOrchestrator`] is the central coordinator that:
//! - Persists each user message and reads back the session history
//! - Embeds the message and retrieves related facts as context
//! - Streams the generated reply to the client token by token
//! - Persists the reply and stores the message as a new fact
//! - Hands first messages to the [`SessionEnricher`] for titling
//!
//! Background work goes through a [`TaskPool`] so shutdown can drain it.

pub mod enricher;
pub mod locks;
pub mod orchestrator;
pub mod shutdown;
pub mod tasks;

pub use enricher::SessionEnricher;
pub use locks::SessionLocks;
pub use orchestrator::{ChatOrchestrator, TurnOutcome, TurnState};
pub use tasks::TaskPool;
