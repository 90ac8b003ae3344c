//! Bounded outbound queue for rendered actions.
//!
//! FIFO per channel, at most one action in flight per channel, and an
//! append-only log of everything that was accepted. When the queue is full
//! the lowest-priority queued action (oldest first) makes room, unless the
//! newcomer ranks below all of them, in which case the newcomer is dropped.

use anima_core::{Action, ActionChannel};
use std::collections::{HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard};
use tokio::sync::Notify;

#[derive(Debug, Clone, PartialEq)]
pub enum PushOutcome {
    Queued,
    /// Queued after evicting this action.
    Evicted(Action),
    /// Queue full of higher-priority work; the new action was discarded.
    Dropped,
}

#[derive(Debug, Default)]
struct SinkState {
    queue: VecDeque<Action>,
    in_flight: HashSet<ActionChannel>,
    log: Vec<Action>,
    evicted: u64,
    dropped: u64,
    closed: bool,
}

#[derive(Debug)]
pub struct ActionSink {
    capacity: usize,
    state: Mutex<SinkState>,
    notify: Notify,
}

impl ActionSink {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            state: Mutex::new(SinkState::default()),
            notify: Notify::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SinkState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn push(&self, action: Action) -> PushOutcome {
        let mut state = self.lock();
        if state.closed {
            state.dropped += 1;
            tracing::debug!("Action sink closed, dropped {:?}", action.intent);
            return PushOutcome::Dropped;
        }
        let outcome = if state.queue.len() < self.capacity {
            PushOutcome::Queued
        } else {
            // min_by_key keeps the first minimum, which is the oldest.
            let victim = state
                .queue
                .iter()
                .enumerate()
                .min_by_key(|(_, queued)| queued.priority)
                .filter(|(_, queued)| queued.priority <= action.priority)
                .map(|(idx, _)| idx);
            match victim.and_then(|idx| state.queue.remove(idx)) {
                Some(evicted) => {
                    state.evicted += 1;
                    tracing::warn!(
                        "Action queue full, evicted {:?} {:?}",
                        evicted.priority,
                        evicted.intent
                    );
                    PushOutcome::Evicted(evicted)
                }
                None => {
                    state.dropped += 1;
                    tracing::warn!(
                        "Action queue full, dropped {:?} {:?}",
                        action.priority,
                        action.intent
                    );
                    return PushOutcome::Dropped;
                }
            }
        };
        state.log.push(action.clone());
        state.queue.push_back(action);
        drop(state);
        self.notify.notify_one();
        outcome
    }

    /// Take the oldest action whose channel is free and mark that channel busy.
    pub fn try_recv(&self) -> Option<Action> {
        let mut state = self.lock();
        let state = &mut *state;
        let idx = state
            .queue
            .iter()
            .position(|a| !state.in_flight.contains(&a.channel))?;
        let action = state.queue.remove(idx)?;
        state.in_flight.insert(action.channel);
        Some(action)
    }

    /// Wait for the next deliverable action. `None` once closed and drained.
    pub async fn recv(&self) -> Option<Action> {
        loop {
            if let Some(action) = self.try_recv() {
                return Some(action);
            }
            {
                let state = self.lock();
                if state.closed && state.queue.is_empty() {
                    return None;
                }
            }
            self.notify.notified().await;
        }
    }

    /// Delivery on `channel` finished; the next action there may go out.
    pub fn complete(&self, channel: ActionChannel) {
        self.lock().in_flight.remove(&channel);
        self.notify.notify_one();
    }

    pub fn close(&self) {
        self.lock().closed = true;
        self.notify.notify_one();
    }

    pub fn len(&self) -> usize {
        self.lock().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().queue.is_empty()
    }

    pub fn is_in_flight(&self, channel: ActionChannel) -> bool {
        self.lock().in_flight.contains(&channel)
    }

    /// Every action ever accepted, in acceptance order.
    pub fn log(&self) -> Vec<Action> {
        self.lock().log.clone()
    }

    /// `(evicted, dropped)` counts since creation.
    pub fn losses(&self) -> (u64, u64) {
        let state = self.lock();
        (state.evicted, state.dropped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anima_core::Priority;
    use chrono::Utc;
    use std::sync::Arc;
    use std::time::Duration;

    fn action(channel: ActionChannel, priority: Priority, text: &str) -> Action {
        Action::new(channel, priority, None, text, Utc::now())
    }

    #[test]
    fn test_full_queue_evicts_lowest_priority() {
        let sink = ActionSink::new(2);
        sink.push(action(ActionChannel::Speech, Priority::Medium, "a"));
        sink.push(action(ActionChannel::Speech, Priority::Low, "b"));

        let outcome = sink.push(action(ActionChannel::Speech, Priority::High, "c"));
        match outcome {
            PushOutcome::Evicted(evicted) => assert_eq!(evicted.rendered_payload, "b"),
            other => panic!("expected eviction, got {:?}", other),
        }
        assert_eq!(sink.len(), 2);
        assert_eq!(sink.losses(), (1, 0));
    }

    #[test]
    fn test_oldest_of_equal_priority_goes_first() {
        let sink = ActionSink::new(2);
        sink.push(action(ActionChannel::Speech, Priority::Low, "old"));
        sink.push(action(ActionChannel::Status, Priority::Low, "new"));
        match sink.push(action(ActionChannel::Speech, Priority::Low, "newest")) {
            PushOutcome::Evicted(evicted) => assert_eq!(evicted.rendered_payload, "old"),
            other => panic!("expected eviction, got {:?}", other),
        }
    }

    #[test]
    fn test_lower_priority_newcomer_is_dropped() {
        let sink = ActionSink::new(1);
        sink.push(action(ActionChannel::Notification, Priority::Urgent, "battery"));
        let outcome = sink.push(action(ActionChannel::Speech, Priority::Low, "chatter"));
        assert_eq!(outcome, PushOutcome::Dropped);
        assert_eq!(sink.len(), 1);
        assert_eq!(sink.log().len(), 1);
        assert_eq!(sink.losses(), (0, 1));
    }

    #[test]
    fn test_capacity_never_exceeded() {
        let sink = ActionSink::new(3);
        for i in 0..20 {
            let priority = if i % 3 == 0 { Priority::High } else { Priority::Low };
            sink.push(action(ActionChannel::Speech, priority, &i.to_string()));
            assert!(sink.len() <= 3);
        }
    }

    #[test]
    fn test_one_in_flight_per_channel() {
        let sink = ActionSink::new(8);
        sink.push(action(ActionChannel::Speech, Priority::Medium, "s1"));
        sink.push(action(ActionChannel::Speech, Priority::Medium, "s2"));
        sink.push(action(ActionChannel::Notification, Priority::Medium, "n1"));

        assert_eq!(sink.try_recv().unwrap().rendered_payload, "s1");
        // speech busy: the notification overtakes s2
        assert_eq!(sink.try_recv().unwrap().rendered_payload, "n1");
        assert!(sink.try_recv().is_none());

        sink.complete(ActionChannel::Speech);
        assert_eq!(sink.try_recv().unwrap().rendered_payload, "s2");
    }

    #[tokio::test]
    async fn test_recv_wakes_on_push() {
        let sink = Arc::new(ActionSink::new(4));
        let reader = {
            let sink = sink.clone();
            tokio::spawn(async move { sink.recv().await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        sink.push(action(ActionChannel::Status, Priority::Low, "hello"));
        let got = reader.await.unwrap().unwrap();
        assert_eq!(got.rendered_payload, "hello");
    }

    #[tokio::test]
    async fn test_recv_ends_after_close() {
        let sink = ActionSink::new(4);
        sink.push(action(ActionChannel::Status, Priority::Low, "last"));
        sink.close();
        assert!(sink.recv().await.is_some());
        sink.complete(ActionChannel::Status);
        assert!(sink.recv().await.is_none());
    }

    #[test]
    fn test_push_after_close_is_dropped() {
        let sink = ActionSink::new(4);
        sink.close();
        let outcome = sink.push(action(ActionChannel::Speech, Priority::Urgent, "late"));
        assert!(matches!(outcome, PushOutcome::Dropped));
        assert!(sink.is_empty());
        assert!(sink.log().is_empty());
        assert_eq!(sink.losses(), (0, 1));
    }
}
