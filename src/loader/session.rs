//! Batch-draining of one paged source, gated by a generation counter.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::models::RawEntry;
use crate::source::PagedQuery;

/// Generation counter shared by a loader and every session it started.
///
/// Advancing the gate retires all outstanding sessions at once.
#[derive(Debug, Clone, Default)]
pub struct GenerationGate(Arc<AtomicU64>);

impl GenerationGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }

    /// Starts a new generation and returns it.
    pub fn advance(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst).wrapping_add(1)
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.current() == generation
    }

    pub fn liveness(&self, generation: u64) -> Liveness {
        Liveness {
            gate: self.clone(),
            generation,
        }
    }
}

/// A session's view of the gate. Once dead it never becomes live again.
#[derive(Debug, Clone)]
pub struct Liveness {
    gate: GenerationGate,
    generation: u64,
}

impl Liveness {
    pub fn is_live(&self) -> bool {
        self.gate.is_current(self.generation)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Fetching,
    Appending,
    Exhausted,
    Aborted,
}

/// Outcome of one step of a session.
#[derive(Debug)]
pub enum Batch {
    Entries(Vec<RawEntry>),
    Exhausted,
    Aborted,
}

pub struct EnumerationSession {
    query: Arc<dyn PagedQuery>,
    liveness: Liveness,
    batch_size: usize,
    cursor: usize,
    files_only: bool,
    state: SessionState,
}

impl EnumerationSession {
    pub fn new(query: Arc<dyn PagedQuery>, liveness: Liveness, batch_size: usize) -> Self {
        Self {
            query,
            liveness,
            batch_size: batch_size.max(1),
            cursor: 0,
            files_only: false,
            state: SessionState::Idle,
        }
    }

    /// Drops folder entries from every batch.
    pub fn files_only(mut self, files_only: bool) -> Self {
        self.files_only = files_only;
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Fetches the next batch.
    ///
    /// Liveness is checked before the fetch and again after it returns; a
    /// batch that arrives for a dead session is discarded. A failed fetch
    /// ends the session like an empty batch would.
    pub async fn next_batch(&mut self) -> Batch {
        if matches!(self.state, SessionState::Exhausted | SessionState::Aborted) {
            return self.terminal();
        }
        if !self.liveness.is_live() {
            return self.abort();
        }

        self.state = SessionState::Fetching;
        trace!(
            source = %self.query.describe(),
            offset = self.cursor,
            count = self.batch_size,
            "Fetching batch"
        );
        let result = self.query.fetch(self.cursor, self.batch_size).await;

        if !self.liveness.is_live() {
            debug!(
                generation = self.liveness.generation(),
                "Discarding batch for abandoned session"
            );
            return self.abort();
        }

        match result {
            Ok(entries) if entries.is_empty() => {
                debug!(
                    source = %self.query.describe(),
                    total = self.cursor,
                    "Source exhausted"
                );
                self.state = SessionState::Exhausted;
                Batch::Exhausted
            }
            Ok(mut entries) => {
                self.cursor += entries.len();
                if self.files_only {
                    entries.retain(|e| !e.is_folder());
                }
                self.state = SessionState::Appending;
                Batch::Entries(entries)
            }
            Err(e) => {
                warn!(
                    source = %self.query.describe(),
                    offset = self.cursor,
                    error = %e,
                    "Batch fetch failed, ending listing"
                );
                self.state = SessionState::Exhausted;
                Batch::Exhausted
            }
        }
    }

    fn abort(&mut self) -> Batch {
        self.state = SessionState::Aborted;
        Batch::Aborted
    }

    fn terminal(&self) -> Batch {
        match self.state {
            SessionState::Aborted => Batch::Aborted,
            _ => Batch::Exhausted,
        }
    }
}
