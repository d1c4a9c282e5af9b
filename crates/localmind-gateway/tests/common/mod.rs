// SPDX-FileCopyrightText: 2026 Local-Mind Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::sync::Arc;

use localmind_core::PluginAdapter;
use localmind_gateway::GatewayState;
use localmind_test_utils::TestHarness;

/// Gateway state wired to a test harness.
pub fn state_for(harness: &TestHarness) -> GatewayState {
    GatewayState {
        app_name: harness.config.app.name.clone(),
        orchestrator: harness.orchestrator.clone(),
        sessions: harness.storage.clone(),
        index: harness.index.clone(),
        generation: harness.generation.clone(),
        models: harness.generation.clone(),
        active_model: harness.active_model.clone(),
        tasks: harness.tasks.clone(),
        adapters: vec![
            harness.storage.clone() as Arc<dyn PluginAdapter>,
            harness.index.clone() as Arc<dyn PluginAdapter>,
            harness.generation.clone() as Arc<dyn PluginAdapter>,
        ],
    }
}
