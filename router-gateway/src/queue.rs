//! # Priority Request Queue
//!
//! An ordered set of pending requests keyed by priority score: lower score
//! dispatches first. The score is `-(priorityWeight * tierMultiplier +
//! ageBonusSeconds)`, so aging promotes older low-priority items above newer
//! higher-priority ones at a rate of one unit per second of wait time.
//!
//! The age term depends on the wall clock, so the ordering between two
//! pending entries can flip while both sit untouched in the queue — a
//! `BinaryHeap`'s invariant assumes comparisons never change after an
//! element is pushed, so one can't be used here. Instead pending entries
//! live in a plain `Vec` guarded by a `tokio::sync::Mutex`, and `scoring`
//! is recomputed against the current clock every time a batch is popped,
//! standing in for the coordination store's sorted set named in the
//! persisted-state layout.

use router_sdk::request::{Priority, RouterRequest, UserTier};
use std::cmp::Ordering;
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

fn tier_multiplier(tier: UserTier) -> f64 {
    match tier {
        UserTier::Basic => 1.0,
        UserTier::Premium => 1.5,
        UserTier::Enterprise => 2.0,
    }
}

/// Status of a queued request as tracked by the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

/// A request waiting in the priority queue, plus the bookkeeping needed to
/// compute and recompute its score as it ages.
pub struct QueuedRequest {
    pub request: RouterRequest,
    pub enqueued_at: Instant,
    pub scheduled_at: Instant,
    pub status: QueueStatus,
}

impl QueuedRequest {
    fn new(request: RouterRequest) -> Self {
        let now = Instant::now();
        Self {
            request,
            enqueued_at: now,
            scheduled_at: now,
            status: QueueStatus::Pending,
        }
    }

    /// `-(priorityWeight * tierMultiplier + ageBonusSeconds)`. Lower is
    /// dispatched sooner. Entries scheduled in the future (retry backoff)
    /// are penalized so the batch loop skips them until their time arrives.
    fn score(&self, now: Instant) -> f64 {
        let age_bonus = now.saturating_duration_since(self.enqueued_at).as_secs_f64();
        let base = self.request.priority.weight() * tier_multiplier(self.request.tier) + age_bonus;
        let mut score = -base;
        if self.scheduled_at > now {
            score += self.scheduled_at.duration_since(now).as_secs_f64();
        }
        score
    }

    fn is_eligible(&self, now: Instant) -> bool {
        self.scheduled_at <= now
    }
}

/// Orders two pending entries by score against `now` (lower first), tying
/// on enqueue time (older first) exactly like the frozen `HeapEntry`
/// ordering this replaced, except recomputed on every comparison instead of
/// once at insertion.
fn by_current_score(now: Instant) -> impl Fn(&QueuedRequest, &QueuedRequest) -> Ordering {
    move |a, b| {
        a.score(now)
            .partial_cmp(&b.score(now))
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.enqueued_at.cmp(&b.enqueued_at))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("queue is at capacity ({0} entries)")]
    Full(usize),
    #[error("request {0} not found in queue")]
    NotFound(uuid::Uuid),
}

/// Bounded history of terminal requests, standing in for the coordination
/// store's TTL'd sorted sets of completed/failed ids.
struct TerminalHistory {
    capacity: usize,
    entries: VecDeque<uuid::Uuid>,
}

impl TerminalHistory {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    fn push(&mut self, id: uuid::Uuid) {
        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(id);
    }
}

struct QueueState {
    pending: Vec<QueuedRequest>,
    processing: std::collections::HashMap<uuid::Uuid, QueuedRequest>,
    completed: TerminalHistory,
    failed: TerminalHistory,
    cancelled: std::collections::HashSet<uuid::Uuid>,
}

/// The priority request queue shared across the gateway's worker pool.
pub struct PriorityRequestQueue {
    state: Mutex<QueueState>,
    queue_length_limit: usize,
}

impl PriorityRequestQueue {
    pub fn new(queue_length_limit: usize) -> Self {
        Self {
            state: Mutex::new(QueueState {
                pending: Vec::new(),
                processing: std::collections::HashMap::new(),
                completed: TerminalHistory::new(1000),
                failed: TerminalHistory::new(1000),
                cancelled: std::collections::HashSet::new(),
            }),
            queue_length_limit,
        }
    }

    /// Insert a new request. Rejects with `QueueError::Full` once
    /// `queueLengthLimit` pending entries are already held.
    pub async fn enqueue(&self, request: RouterRequest) -> Result<(), QueueError> {
        let mut state = self.state.lock().await;
        if state.pending.len() >= self.queue_length_limit {
            return Err(QueueError::Full(self.queue_length_limit));
        }
        state.pending.push(QueuedRequest::new(request));
        Ok(())
    }

    /// Pop up to `min(batch_size, max_concurrent - in_flight)` eligible
    /// entries, lowest score first. Entries whose `scheduled_at` is still in
    /// the future are left in the queue. Scores are recomputed against the
    /// current clock on every call, so the age bonus actually accrues while
    /// an entry waits rather than being frozen at enqueue time.
    pub async fn process_batch(&self, batch_size: usize, in_flight: usize, max_concurrent: usize) -> Vec<QueuedRequest> {
        let slots = max_concurrent.saturating_sub(in_flight).min(batch_size);
        if slots == 0 {
            return Vec::new();
        }

        let mut state = self.state.lock().await;
        let now = Instant::now();

        let mut eligible: Vec<usize> = state
            .pending
            .iter()
            .enumerate()
            .filter(|(_, item)| item.is_eligible(now))
            .map(|(i, _)| i)
            .collect();
        eligible.sort_by(|&a, &b| by_current_score(now)(&state.pending[a], &state.pending[b]));
        eligible.truncate(slots);

        // Remove the selected indices highest-first so earlier indices stay
        // valid, then reorder the removed items back into priority order.
        let mut to_remove = eligible.clone();
        to_remove.sort_unstable_by(|a, b| b.cmp(a));
        let mut removed: std::collections::HashMap<usize, QueuedRequest> =
            std::collections::HashMap::with_capacity(to_remove.len());
        for idx in to_remove {
            removed.insert(idx, state.pending.remove(idx));
        }

        let mut dispatched = Vec::with_capacity(eligible.len());
        for idx in eligible {
            let mut item = removed.remove(&idx).expect("index was just removed above");
            item.status = QueueStatus::Processing;
            state.processing.insert(item.request.id, QueuedRequest {
                request: item.request.clone(),
                enqueued_at: item.enqueued_at,
                scheduled_at: item.scheduled_at,
                status: QueueStatus::Processing,
            });
            dispatched.push(item);
        }

        dispatched
    }

    /// Re-insert a request after a retryable failure, not eligible again
    /// until `now + delay`. `item.enqueued_at` is left untouched by the
    /// caller so the age bonus keeps accruing from the original enqueue
    /// time, not from this reschedule.
    pub async fn schedule_retry(&self, mut item: QueuedRequest, delay: Duration) {
        let mut state = self.state.lock().await;
        state.processing.remove(&item.request.id);
        item.scheduled_at = Instant::now() + delay;
        item.status = QueueStatus::Pending;
        state.pending.push(item);
    }

    pub async fn complete(&self, id: uuid::Uuid) {
        let mut state = self.state.lock().await;
        state.processing.remove(&id);
        state.completed.push(id);
    }

    pub async fn fail(&self, id: uuid::Uuid) {
        let mut state = self.state.lock().await;
        state.processing.remove(&id);
        state.failed.push(id);
    }

    /// Cancel a pending or in-flight request. Pending entries are marked and
    /// filtered out on their next pop; in-flight ones rely on the
    /// orchestrator observing `RouterRequest::is_cancelled()` at its next
    /// `.await` point.
    pub async fn cancel(&self, id: uuid::Uuid) -> Result<(), QueueError> {
        let mut state = self.state.lock().await;
        if let Some(processing) = state.processing.get(&id) {
            processing.request.cancellation.cancel();
            state.cancelled.insert(id);
            return Ok(());
        }
        let found = state.pending.iter().any(|item| item.request.id == id);
        if !found {
            return Err(QueueError::NotFound(id));
        }
        state.cancelled.insert(id);
        state.pending.retain(|item| item.request.id != id);
        Ok(())
    }

    pub async fn status(&self, id: uuid::Uuid) -> Option<QueueStatus> {
        let state = self.state.lock().await;
        if state.cancelled.contains(&id) {
            return Some(QueueStatus::Cancelled);
        }
        if state.processing.contains_key(&id) {
            return Some(QueueStatus::Processing);
        }
        if state.pending.iter().any(|item| item.request.id == id) {
            return Some(QueueStatus::Pending);
        }
        if state.completed.entries.contains(&id) {
            return Some(QueueStatus::Completed);
        }
        if state.failed.entries.contains(&id) {
            return Some(QueueStatus::Failed);
        }
        None
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use router_sdk::models::{ChatRequest, Message};
    use router_sdk::request::{Capability, GenerationParams};
    use std::collections::HashSet;

    fn request(priority: Priority, tier: UserTier) -> RouterRequest {
        RouterRequest::new(
            "user-1",
            tier,
            priority,
            HashSet::from([Capability::TextGeneration]),
            ChatRequest {
                model: "gpt-4".to_string(),
                messages: vec![Message::user("hi")],
                ..Default::default()
            },
            GenerationParams::default(),
            Duration::from_secs(30),
        )
    }

    #[tokio::test]
    async fn higher_priority_dispatches_before_lower_priority() {
        let queue = PriorityRequestQueue::new(100);
        queue
            .enqueue(request(Priority::Low, UserTier::Basic))
            .await
            .unwrap();
        queue
            .enqueue(request(Priority::Critical, UserTier::Basic))
            .await
            .unwrap();

        let batch = queue.process_batch(10, 0, 10).await;
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].request.priority, Priority::Critical);
    }

    #[tokio::test]
    async fn batch_size_is_bounded_by_available_slots() {
        let queue = PriorityRequestQueue::new(100);
        for _ in 0..5 {
            queue
                .enqueue(request(Priority::Medium, UserTier::Basic))
                .await
                .unwrap();
        }
        let batch = queue.process_batch(10, 3, 5).await;
        assert_eq!(batch.len(), 2);
    }

    #[tokio::test]
    async fn enqueue_fails_once_queue_length_limit_is_reached() {
        let queue = PriorityRequestQueue::new(1);
        queue
            .enqueue(request(Priority::Low, UserTier::Basic))
            .await
            .unwrap();
        let result = queue.enqueue(request(Priority::Low, UserTier::Basic)).await;
        assert!(matches!(result, Err(QueueError::Full(1))));
    }

    #[tokio::test]
    async fn scheduled_retry_is_not_eligible_until_its_time() {
        let queue = PriorityRequestQueue::new(100);
        queue
            .enqueue(request(Priority::Critical, UserTier::Basic))
            .await
            .unwrap();
        let batch = queue.process_batch(10, 0, 10).await;
        let item = batch.into_iter().next().unwrap();

        queue.schedule_retry(item, Duration::from_secs(60)).await;
        let batch = queue.process_batch(10, 0, 10).await;
        assert!(batch.is_empty());
    }

    #[tokio::test]
    async fn aging_promotes_an_older_low_priority_request_over_a_newer_critical_one() {
        let queue = PriorityRequestQueue::new(100);
        queue
            .enqueue(request(Priority::Low, UserTier::Basic))
            .await
            .unwrap();
        let mut aged = queue.process_batch(10, 0, 10).await.into_iter().next().unwrap();
        // Simulate this entry having waited long enough for its age bonus to
        // exceed the Critical/Low weight gap, then put it straight back.
        aged.enqueued_at = Instant::now() - Duration::from_secs(2000);
        queue.schedule_retry(aged, Duration::from_secs(0)).await;

        queue
            .enqueue(request(Priority::Critical, UserTier::Basic))
            .await
            .unwrap();

        let batch = queue.process_batch(10, 0, 10).await;
        assert_eq!(batch[0].request.priority, Priority::Low);
        assert_eq!(batch[1].request.priority, Priority::Critical);
    }

    #[tokio::test]
    async fn cancelling_a_pending_request_removes_it_from_the_queue() {
        let queue = PriorityRequestQueue::new(100);
        queue
            .enqueue(request(Priority::Medium, UserTier::Basic))
            .await
            .unwrap();
        let batch = queue.process_batch(0, 0, 0).await;
        assert!(batch.is_empty());

        // Grab the id by peeking at a batch with enough slots, then put it
        // back via schedule_retry so cancel has something pending to find.
        let batch = queue.process_batch(10, 0, 10).await;
        let item = batch.into_iter().next().unwrap();
        let id = item.request.id;
        queue.schedule_retry(item, Duration::from_secs(0)).await;

        queue.cancel(id).await.unwrap();
        assert_eq!(queue.status(id).await, Some(QueueStatus::Cancelled));
    }
}
