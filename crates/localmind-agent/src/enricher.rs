// SPDX-FileCopyrightText: 2026 Local-Mind Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Background titling of new sessions.
//!
//! After a session's first message is persisted, the orchestrator submits
//! [`SessionEnricher::summarize`] to the task pool. It asks the generation
//! backend for a short title and writes it to the session metadata.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use localmind_config::model::EnricherConfig;
use localmind_core::{ActiveModel, ChatMessage, GenerationClient, LocalMindError, SessionLog};
use tracing::{debug, info};

/// Prefix of terminal error tokens produced by the generation backend.
const ERROR_TOKEN_PREFIX: &str = "[Error]";

/// Derives session titles from first messages.
pub struct SessionEnricher {
    log: Arc<dyn SessionLog>,
    generation: Arc<dyn GenerationClient>,
    active_model: Arc<ActiveModel>,
    config: EnricherConfig,
}

impl SessionEnricher {
    pub fn new(
        log: Arc<dyn SessionLog>,
        generation: Arc<dyn GenerationClient>,
        active_model: Arc<ActiveModel>,
        config: EnricherConfig,
    ) -> Self {
        Self {
            log,
            generation,
            active_model,
            config,
        }
    }

    pub fn enabled(&self) -> bool {
        self.config.enabled
    }

    /// Titles `session_id` from its first message.
    ///
    /// Waits `delay_ms` first so the reply stream gets the backend to itself.
    /// Returns the title written, or `None` when the backend produced nothing
    /// usable.
    pub async fn summarize(
        &self,
        session_id: &str,
        first_message: &str,
    ) -> Result<Option<String>, LocalMindError> {
        if self.config.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.delay_ms)).await;
        }

        let model = self.active_model.get();
        let prompt = vec![ChatMessage::user(title_prompt(first_message))];
        let raw: String = self
            .generation
            .stream_chat(&model, prompt, None)
            .await
            .collect::<Vec<String>>()
            .await
            .concat();

        let Some(title) = clean_title(&raw, self.config.max_title_chars) else {
            debug!(session_id, raw = %raw, "no usable title produced");
            return Ok(None);
        };

        self.log.update_title(session_id, &title).await?;
        info!(session_id, title = %title, "session titled");
        Ok(Some(title))
    }
}

/// The instruction sent to the backend to produce a title.
pub fn title_prompt(first_message: &str) -> String {
    format!(
        "Write a short title of at most five words for a conversation that starts with the \
         message below. Reply with the title only, without quotes or punctuation.\n\n\
         Message: {first_message}"
    )
}

/// Normalize a raw model reply into a display title.
///
/// Returns `None` for empty output and for backend error tokens.
pub fn clean_title(raw: &str, max_chars: usize) -> Option<String> {
    let mut s = raw.trim();
    if s.starts_with(ERROR_TOKEN_PREFIX) {
        return None;
    }

    if let Some(label) = s.get(..6)
        && label.eq_ignore_ascii_case("title:")
    {
        s = s[6..].trim_start();
    }

    let s = s.trim_matches(|c: char| {
        c.is_whitespace() || matches!(c, '"' | '\'' | '`' | '*' | '\u{201c}' | '\u{201d}')
    });

    let collapsed = s.split_whitespace().collect::<Vec<_>>().join(" ");
    let without_period = collapsed.strip_suffix('.').unwrap_or(&collapsed).trim_end();

    let title: String = without_period.chars().take(max_chars).collect();
    let title = title.trim_end();
    if title.is_empty() {
        None
    } else {
        Some(title.to_string())
    }
}
