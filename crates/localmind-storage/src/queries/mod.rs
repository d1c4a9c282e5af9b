// SPDX-FileCopyrightText: 2026 Local-Mind Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules for session metadata and message logs.
//!
//! Every function takes the current time explicitly so expiry can be tested
//! without sleeping.

pub mod messages;
pub mod sessions;
