use chrono::Utc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::chunk::{SyncState, TranscriptChunk};
use super::stats::ChunkStats;
use crate::config::PersistenceConfig;
use crate::diarize::Speaker;
use crate::remote::ChunkPersistence;

/// Ceiling on how many times the retry delay doubles.
const MAX_BACKOFF_DOUBLINGS: u32 = 6;

struct StoreInner {
    /// Append-only arena; index equals sequence number.
    chunks: Vec<TranscriptChunk>,
    /// Add-to-saved latencies for successfully persisted chunks.
    latencies: Vec<Duration>,
}

/// Buffers, orders, and durably persists transcript chunks for one session.
///
/// `add_chunk` is optimistic: the chunk is readable from the in-memory list
/// immediately, while a background task upserts it with exponential-backoff
/// retry. Persist completions may land in any order; transcript projections
/// always follow sequence order.
pub struct TranscriptChunkStore {
    session_id: String,
    persistence: Arc<dyn ChunkPersistence>,
    retry: PersistenceConfig,
    inner: Arc<Mutex<StoreInner>>,
    persist_tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl TranscriptChunkStore {
    pub fn new(
        session_id: impl Into<String>,
        persistence: Arc<dyn ChunkPersistence>,
        retry: PersistenceConfig,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            persistence,
            retry,
            inner: Arc::new(Mutex::new(StoreInner {
                chunks: Vec::new(),
                latencies: Vec::new(),
            })),
            persist_tasks: Mutex::new(Vec::new()),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Append a labeled fragment and schedule its persist.
    ///
    /// The next sequence number is assigned under the store lock, so chunk
    /// creation is strictly ordered even though persist completion is not.
    pub async fn add_chunk(&self, speaker: Speaker, text: impl Into<String>) -> TranscriptChunk {
        let chunk = {
            let mut inner = self.inner.lock().await;
            let chunk = TranscriptChunk {
                sequence: inner.chunks.len() as u64,
                speaker,
                text: text.into(),
                created_at: Utc::now(),
                sync_state: SyncState::Pending,
            };
            inner.chunks.push(chunk.clone());
            chunk
        };

        let task = tokio::spawn(Self::persist_with_retry(
            self.session_id.clone(),
            chunk.clone(),
            Arc::clone(&self.persistence),
            self.retry.clone(),
            Arc::clone(&self.inner),
        ));

        self.persist_tasks.lock().await.push(task);

        chunk
    }

    async fn persist_with_retry(
        session_id: String,
        chunk: TranscriptChunk,
        persistence: Arc<dyn ChunkPersistence>,
        retry: PersistenceConfig,
        inner: Arc<Mutex<StoreInner>>,
    ) {
        let added_at = Instant::now();
        let mut attempt: u32 = 0;

        loop {
            match persistence.upsert_chunk(&session_id, &chunk).await {
                Ok(()) => {
                    let latency = added_at.elapsed();
                    let mut inner = inner.lock().await;
                    inner.chunks[chunk.sequence as usize].sync_state = SyncState::Saved;
                    inner.latencies.push(latency);
                    return;
                }
                Err(e) => {
                    if attempt >= retry.max_retries {
                        warn!(
                            session_id = %session_id,
                            sequence = chunk.sequence,
                            "chunk persist failed after {} retries: {e:#}",
                            retry.max_retries
                        );
                        let mut inner = inner.lock().await;
                        inner.chunks[chunk.sequence as usize].sync_state = SyncState::Failed;
                        return;
                    }

                    // Exponent is capped so extreme retry budgets neither
                    // overflow the shift nor stretch a single wait past ~64x.
                    let factor = 1u64 << attempt.min(MAX_BACKOFF_DOUBLINGS);
                    let delay =
                        Duration::from_millis(retry.backoff_base_ms.saturating_mul(factor));
                    warn!(
                        session_id = %session_id,
                        sequence = chunk.sequence,
                        "chunk persist attempt {} failed, retrying in {:?}: {e:#}",
                        attempt + 1,
                        delay
                    );
                    attempt += 1;
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// Wait for every in-flight persist to settle (saved or failed).
    ///
    /// Called before stopping capture so the note pipeline never sees a
    /// transcript with writes still in flight.
    pub async fn save_all_pending_chunks(&self) {
        let tasks: Vec<JoinHandle<()>> = {
            let mut pending = self.persist_tasks.lock().await;
            pending.drain(..).collect()
        };

        let count = tasks.len();
        for task in tasks {
            if let Err(e) = task.await {
                warn!("chunk persist task panicked: {e}");
            }
        }

        if count > 0 {
            info!(session_id = %self.session_id, "flushed {count} chunk persist tasks");
        }
    }

    /// Transcript text without speaker labels, in sequence order.
    pub async fn get_full_transcript(&self) -> String {
        let inner = self.inner.lock().await;
        inner
            .chunks
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Transcript with `Speaker: text` lines, in sequence order.
    pub async fn get_diarized_transcript(&self) -> String {
        let inner = self.inner.lock().await;
        inner
            .chunks
            .iter()
            .map(|c| format!("{}: {}", c.speaker, c.text))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Snapshot of the chunk list, in sequence order.
    pub async fn chunks(&self) -> Vec<TranscriptChunk> {
        self.inner.lock().await.chunks.clone()
    }

    /// Aggregate persistence statistics.
    pub async fn stats(&self) -> ChunkStats {
        let inner = self.inner.lock().await;

        let mut stats = ChunkStats {
            total_chunks: inner.chunks.len(),
            ..Default::default()
        };

        for chunk in &inner.chunks {
            match chunk.sync_state {
                SyncState::Saved => stats.saved_chunks += 1,
                SyncState::Pending => stats.pending_chunks += 1,
                SyncState::Failed => stats.failed_chunks += 1,
            }
        }

        if !inner.latencies.is_empty() {
            let total_ms: f64 = inner.latencies.iter().map(|d| d.as_secs_f64() * 1000.0).sum();
            stats.average_latency_ms = total_ms / inner.latencies.len() as f64;
        }

        stats
    }
}
