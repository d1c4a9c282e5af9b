// SPDX-FileCopyrightText: 2026 Local-Mind Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The chat turn state machine.
//!
//! Each turn goes through: Received -> Persisted -> ContextGathered ->
//! Streaming -> Completed. A connection runs its turns one at a time;
//! different connections run in parallel, serialized only when they share a
//! session id.
//!
//! Only a closed transport aborts a turn. Every other failure degrades the
//! affected sub-result (history, retrieval context, persistence, fact upsert)
//! and is logged.

use std::sync::Arc;

use futures::StreamExt;
use localmind_core::{
    ActiveModel, ChatMessage, ChatTransport, GenerationClient, LocalMindError, RetrievalIndex,
    SessionLog,
};
use tracing::{debug, info, warn};

use crate::enricher::SessionEnricher;
use crate::locks::SessionLocks;
use crate::tasks::TaskPool;

/// States in the turn FSM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    /// Raw text taken off the transport.
    Received,
    /// User message appended to the session log.
    Persisted,
    /// History and retrieval context are in hand.
    ContextGathered,
    /// Tokens are being forwarded to the client.
    Streaming,
    /// Reply persisted; the next frame may be read.
    Completed,
}

impl std::fmt::Display for TurnState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TurnState::Received => write!(f, "received"),
            TurnState::Persisted => write!(f, "persisted"),
            TurnState::ContextGathered => write!(f, "context_gathered"),
            TurnState::Streaming => write!(f, "streaming"),
            TurnState::Completed => write!(f, "completed"),
        }
    }
}

/// What a completed turn produced.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    /// Concatenation of every token sent to the client.
    pub reply: String,
    /// Facts injected as context, nearest first.
    pub context_facts: Vec<String>,
    /// Whether the user text was embedded (and so will be upserted).
    pub embedded: bool,
}

/// Drives chat turns against the session log, retrieval index, and generation backend.
pub struct ChatOrchestrator {
    log: Arc<dyn SessionLog>,
    index: Arc<dyn RetrievalIndex>,
    generation: Arc<dyn GenerationClient>,
    active_model: Arc<ActiveModel>,
    enricher: Arc<SessionEnricher>,
    tasks: TaskPool,
    locks: SessionLocks,
    search_limit: usize,
}

impl ChatOrchestrator {
    pub fn new(
        log: Arc<dyn SessionLog>,
        index: Arc<dyn RetrievalIndex>,
        generation: Arc<dyn GenerationClient>,
        active_model: Arc<ActiveModel>,
        enricher: Arc<SessionEnricher>,
        tasks: TaskPool,
        search_limit: usize,
    ) -> Self {
        Self {
            log,
            index,
            generation,
            active_model,
            enricher,
            tasks,
            locks: SessionLocks::new(),
            search_limit,
        }
    }

    /// The pool background work from turns is submitted to.
    pub fn tasks(&self) -> &TaskPool {
        &self.tasks
    }

    /// Sessions with a turn currently in flight.
    pub fn sessions_in_flight(&self) -> usize {
        self.locks.len()
    }

    /// Serves one client connection until the client goes away.
    ///
    /// Blank frames are ignored. Returns once the transport is closed, either
    /// between turns or in the middle of a streamed reply.
    pub async fn run_connection<T>(&self, session_id: &str, transport: &mut T)
    where
        T: ChatTransport + ?Sized,
    {
        info!(session_id, "chat connection opened");

        while let Some(frame) = transport.recv().await {
            if frame.trim().is_empty() {
                debug!(session_id, "ignoring empty frame");
                continue;
            }

            match self.run_turn(session_id, &frame, transport).await {
                Ok(outcome) => debug!(
                    session_id,
                    reply_len = outcome.reply.len(),
                    context_facts = outcome.context_facts.len(),
                    embedded = outcome.embedded,
                    "turn completed"
                ),
                Err(e) if e.is_transport_closed() => {
                    info!(session_id, "client disconnected mid-turn");
                    break;
                }
                Err(e) => warn!(session_id, error = %e, "turn failed"),
            }
        }

        info!(session_id, "chat connection closed");
    }

    /// Runs one turn: persist, gather context, stream, persist the reply.
    ///
    /// Fails only with [`LocalMindError::TransportClosed`]; the partial reply
    /// is then discarded and no fact is stored.
    pub async fn run_turn<T>(
        &self,
        session_id: &str,
        text: &str,
        transport: &mut T,
    ) -> Result<TurnOutcome, LocalMindError>
    where
        T: ChatTransport + ?Sized,
    {
        let _turn = self.locks.acquire(session_id).await;
        trace_state(session_id, TurnState::Received);

        // Snapshot once so a concurrent model switch cannot split this turn.
        let model = self.active_model.get();
        let user_message = ChatMessage::user(text);

        if let Err(e) = self.log.append(session_id, user_message.clone()).await {
            warn!(session_id, error = %e, "failed to persist user message, continuing");
        }
        trace_state(session_id, TurnState::Persisted);

        let (history, embedding) = tokio::join!(
            self.log.history(session_id),
            self.generation.embed(&model, text)
        );

        if history.len() == 1 {
            self.spawn_enrichment(session_id, text);
        }

        let embedding = match embedding {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(session_id, error = %e, "embedding failed, continuing without retrieval");
                None
            }
        };

        let context_facts = match &embedding {
            Some(vector) => {
                let trimmed = text.trim();
                self.index
                    .search(vector, self.search_limit)
                    .await
                    .into_iter()
                    .filter(|fact| fact.trim() != trimmed)
                    .collect()
            }
            None => Vec::new(),
        };
        let context = (!context_facts.is_empty()).then(|| context_facts.join("\n"));
        trace_state(session_id, TurnState::ContextGathered);

        let mut messages = history;
        if messages.last() != Some(&user_message) {
            // The log lost the append or the read; the model still needs the question.
            messages.push(user_message);
        }

        trace_state(session_id, TurnState::Streaming);
        let mut tokens = self.generation.stream_chat(&model, messages, context).await;
        let mut reply = String::new();
        while let Some(token) = tokens.next().await {
            reply.push_str(&token);
            transport.send(token).await?;
        }

        if let Err(e) = self
            .log
            .append(session_id, ChatMessage::assistant(reply.clone()))
            .await
        {
            warn!(session_id, error = %e, "failed to persist assistant reply");
        }

        let embedded = embedding.is_some();
        if let Some(vector) = embedding {
            let index = self.index.clone();
            let fact = text.to_string();
            self.tasks.spawn("fact-upsert", async move {
                index.upsert(&fact, &vector).await
            });
        }

        trace_state(session_id, TurnState::Completed);
        Ok(TurnOutcome {
            reply,
            context_facts,
            embedded,
        })
    }

    fn spawn_enrichment(&self, session_id: &str, first_message: &str) {
        if !self.enricher.enabled() {
            return;
        }
        let enricher = self.enricher.clone();
        let session_id = session_id.to_string();
        let first_message = first_message.to_string();
        self.tasks.spawn("session-title", async move {
            enricher.summarize(&session_id, &first_message).await.map(|_| ())
        });
    }
}

fn trace_state(session_id: &str, state: TurnState) {
    debug!(session_id, state = %state, "turn state");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turn_state_display_is_snake_case() {
        assert_eq!(TurnState::Received.to_string(), "received");
        assert_eq!(TurnState::ContextGathered.to_string(), "context_gathered");
        assert_eq!(TurnState::Completed.to_string(), "completed");
    }
}
