//! Adaptive concurrency gate for outbound target calls.
//!
//! AIMD: a streak of successes widens the limit by one, any failure halves
//! it. The limit is mutable at runtime, which a `tokio::sync::Semaphore`
//! cannot express directly, so admission is tracked explicitly with FIFO
//! oneshot waiters. The mutex is never held across an await point.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::Mutex;

use tokio::sync::oneshot;
use tracing::debug;

/// Tuning knobs for one target's queue.
#[derive(Debug, Clone, Copy)]
pub struct QueueSettings {
    /// Concurrency at the start of a run.
    pub initial: usize,
    /// Hard floor after repeated failures.
    pub min: usize,
    /// Hard ceiling after sustained success.
    pub max: usize,
    /// Consecutive successes required before widening by one.
    pub ramp_after: u32,
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            initial: 2,
            min: 1,
            max: 10,
            ramp_after: 5,
        }
    }
}

#[derive(Debug)]
struct QueueState {
    limit: usize,
    running: usize,
    streak: u32,
    waiters: VecDeque<oneshot::Sender<()>>,
}

/// Task gate with a mutable concurrency limit.
#[derive(Debug)]
pub struct AdaptiveQueue {
    settings: QueueSettings,
    state: Mutex<QueueState>,
}

impl AdaptiveQueue {
    pub fn new(settings: QueueSettings) -> Self {
        let initial = settings.initial.clamp(settings.min, settings.max);
        Self {
            settings,
            state: Mutex::new(QueueState {
                limit: initial,
                running: 0,
                streak: 0,
                waiters: VecDeque::new(),
            }),
        }
    }

    /// Current concurrency limit.
    pub fn limit(&self) -> usize {
        self.state.lock().expect("queue state poisoned").limit
    }

    /// Run one task through the gate. Admission is FIFO; the task's own
    /// result feeds the AIMD accounting and is returned unchanged.
    pub async fn run<T, E, Fut>(&self, task: Fut) -> Result<T, E>
    where
        Fut: Future<Output = Result<T, E>>,
    {
        self.acquire().await;
        let outcome = task.await;
        self.release(outcome.is_ok());
        outcome
    }

    async fn acquire(&self) {
        let waiter = {
            let mut state = self.state.lock().expect("queue state poisoned");
            if state.running < state.limit && state.waiters.is_empty() {
                state.running += 1;
                None
            } else {
                let (tx, rx) = oneshot::channel();
                state.waiters.push_back(tx);
                Some(rx)
            }
        };

        if let Some(rx) = waiter {
            // The releasing side increments `running` before waking us.
            let _ = rx.await;
        }
    }

    fn release(&self, success: bool) {
        let mut state = self.state.lock().expect("queue state poisoned");
        state.running = state.running.saturating_sub(1);

        if success {
            state.streak += 1;
            if state.streak >= self.settings.ramp_after && state.limit < self.settings.max {
                state.limit += 1;
                state.streak = 0;
                debug!(limit = state.limit, "queue concurrency widened");
            }
        } else {
            state.streak = 0;
            let halved = (state.limit / 2).max(self.settings.min);
            if halved != state.limit {
                debug!(limit = halved, "queue concurrency halved after failure");
            }
            state.limit = halved;
        }

        // Completion immediately admits queued tasks up to the new limit.
        while state.running < state.limit {
            match state.waiters.pop_front() {
                Some(tx) => {
                    if tx.send(()).is_ok() {
                        state.running += 1;
                    }
                }
                None => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    async fn ok_task(queue: &AdaptiveQueue) {
        let _: Result<(), ()> = queue.run(async { Ok(()) }).await;
    }

    async fn failing_task(queue: &AdaptiveQueue) {
        let _: Result<(), ()> = queue.run(async { Err(()) }).await;
    }

    #[tokio::test]
    async fn ramps_up_after_success_streak() {
        let queue = AdaptiveQueue::new(QueueSettings::default());
        assert_eq!(queue.limit(), 2);

        for _ in 0..6 {
            ok_task(&queue).await;
        }
        // Widened once at the fifth success, streak reset afterwards.
        assert_eq!(queue.limit(), 3);
    }

    #[tokio::test]
    async fn failure_halves_to_floor_and_resets_streak() {
        let queue = AdaptiveQueue::new(QueueSettings::default());
        for _ in 0..6 {
            ok_task(&queue).await;
        }
        assert_eq!(queue.limit(), 3);

        failing_task(&queue).await;
        assert_eq!(queue.limit(), 1);

        // The streak restarts from zero after a failure.
        for _ in 0..4 {
            ok_task(&queue).await;
        }
        assert_eq!(queue.limit(), 1);
        ok_task(&queue).await;
        assert_eq!(queue.limit(), 2);
    }

    #[tokio::test]
    async fn never_drops_below_min() {
        let queue = AdaptiveQueue::new(QueueSettings::default());
        for _ in 0..5 {
            failing_task(&queue).await;
        }
        assert_eq!(queue.limit(), 1);
    }

    #[tokio::test]
    async fn respects_ceiling() {
        let queue = AdaptiveQueue::new(QueueSettings {
            initial: 2,
            min: 1,
            max: 3,
            ramp_after: 1,
        });
        for _ in 0..10 {
            ok_task(&queue).await;
        }
        assert_eq!(queue.limit(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn in_flight_tasks_never_exceed_limit() {
        let queue = Arc::new(AdaptiveQueue::new(QueueSettings {
            initial: 2,
            min: 1,
            max: 2,
            ramp_after: 100,
        }));
        let current = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let queue = Arc::clone(&queue);
            let current = Arc::clone(&current);
            let peak = Arc::clone(&peak);
            handles.push(tokio::spawn(async move {
                let _: Result<(), ()> = queue
                    .run(async {
                        let now = current.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(5)).await;
                        current.fetch_sub(1, Ordering::SeqCst);
                        Ok(())
                    })
                    .await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert!(peak.load(Ordering::SeqCst) <= 2);
    }
}
