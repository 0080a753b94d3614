//! Per-key recurring probe timers.
//!
//! Every registered key owns one ticker task. Each tick spawns the key's
//! probe as a separate task, so a slow probe never delays the next tick and
//! probes for the same key may overlap. Stopping a key aborts its ticker but
//! leaves probes already spawned to run to completion; whoever commits their
//! results decides whether they are still wanted.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::hash::Hash;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, trace};

use crate::targets;

/// Shortest cadence a ticker accepts.
pub const MIN_INTERVAL: Duration = Duration::from_millis(100);

pub type ProbeFuture = Pin<Box<dyn Future<Output = ()> + Send>>;
pub type ProbeTask = Arc<dyn Fn() -> ProbeFuture + Send + Sync>;

pub fn probe_task<F, Fut>(probe: F) -> ProbeTask
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(move || -> ProbeFuture { Box::pin(probe()) })
}

struct Slot {
    probe: ProbeTask,
    interval: Duration,
    ticker: JoinHandle<()>,
}

/// Must be driven from inside a tokio runtime.
pub struct PollingScheduler<K> {
    slots: HashMap<K, Slot>,
}

impl<K> PollingScheduler<K>
where
    K: Eq + Hash + Clone + fmt::Display + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            slots: HashMap::new(),
        }
    }

    /// Probes immediately, then every `interval`. Replaces any timer `key` had.
    pub fn start(&mut self, key: K, interval: Duration, probe: ProbeTask) {
        self.stop(&key);

        let interval = clamp_interval(interval);
        let ticker = spawn_ticker(key.clone(), interval, Arc::clone(&probe), Instant::now());
        debug!(
            target: targets::POLLING,
            key = %key,
            interval_ms = interval.as_millis(),
            "poller started"
        );
        self.slots.insert(
            key,
            Slot {
                probe,
                interval,
                ticker,
            },
        );
    }

    pub fn stop(&mut self, key: &K) -> bool {
        match self.slots.remove(key) {
            Some(slot) => {
                slot.ticker.abort();
                debug!(target: targets::POLLING, key = %key, "poller stopped");
                true
            }
            None => false,
        }
    }

    pub fn stop_all(&mut self) {
        let count = self.slots.len();
        for (_, slot) in self.slots.drain() {
            slot.ticker.abort();
        }
        if count > 0 {
            debug!(target: targets::POLLING, count, "all pollers stopped");
        }
    }

    /// Restarts `key`'s timer with a new cadence and the same probe.
    ///
    /// The first tick lands one full `interval` from now; nothing is probed
    /// on the spot.
    pub fn reschedule(&mut self, key: &K, interval: Duration) -> bool {
        let Some(slot) = self.slots.get_mut(key) else {
            return false;
        };

        let interval = clamp_interval(interval);
        slot.ticker.abort();
        slot.interval = interval;
        slot.ticker = spawn_ticker(
            key.clone(),
            interval,
            Arc::clone(&slot.probe),
            Instant::now() + interval,
        );
        debug!(
            target: targets::POLLING,
            key = %key,
            interval_ms = interval.as_millis(),
            "poller rescheduled"
        );
        true
    }

    pub fn reschedule_all(&mut self, interval: Duration) {
        let keys = self.active_keys();
        for key in &keys {
            self.reschedule(key, interval);
        }
    }

    /// Runs `key`'s probe once right now without touching its timer.
    pub fn fire(&self, key: &K) -> bool {
        match self.slots.get(key) {
            Some(slot) => {
                trace!(target: targets::POLLING, key = %key, "manual probe");
                tokio::spawn((slot.probe)());
                true
            }
            None => false,
        }
    }

    pub fn is_active(&self, key: &K) -> bool {
        self.slots.contains_key(key)
    }

    pub fn interval(&self, key: &K) -> Option<Duration> {
        self.slots.get(key).map(|slot| slot.interval)
    }

    pub fn active_keys(&self) -> Vec<K> {
        self.slots.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl<K> Default for PollingScheduler<K>
where
    K: Eq + Hash + Clone + fmt::Display + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K> Drop for PollingScheduler<K> {
    fn drop(&mut self) {
        for slot in self.slots.values() {
            slot.ticker.abort();
        }
    }
}

fn clamp_interval(interval: Duration) -> Duration {
    interval.max(MIN_INTERVAL)
}

fn spawn_ticker<K>(key: K, period: Duration, probe: ProbeTask, first_tick: Instant) -> JoinHandle<()>
where
    K: fmt::Display + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(first_tick, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            trace!(target: targets::POLLING, key = %key, "poll tick");
            tokio::spawn(probe());
        }
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tokio::sync::Notify;

    use super::*;

    fn counting_probe(counter: &Arc<AtomicUsize>) -> ProbeTask {
        let counter = Arc::clone(counter);
        probe_task(move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        })
    }

    async fn wait(millis: u64) {
        tokio::time::sleep(Duration::from_millis(millis)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn start_probes_immediately_then_every_interval() {
        let mut scheduler = PollingScheduler::new();
        let counter = Arc::new(AtomicUsize::new(0));

        scheduler.start("a".to_string(), Duration::from_secs(1), counting_probe(&counter));
        wait(10).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        wait(2_500).await;
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_cancels_future_ticks() {
        let mut scheduler = PollingScheduler::new();
        let counter = Arc::new(AtomicUsize::new(0));

        scheduler.start("a".to_string(), Duration::from_secs(1), counting_probe(&counter));
        wait(10).await;
        assert!(scheduler.stop(&"a".to_string()));
        assert!(!scheduler.is_active(&"a".to_string()));

        wait(5_000).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(!scheduler.stop(&"a".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn restarting_a_key_keeps_a_single_timer() {
        let mut scheduler = PollingScheduler::new();
        let counter = Arc::new(AtomicUsize::new(0));

        scheduler.start("a".to_string(), Duration::from_secs(1), counting_probe(&counter));
        scheduler.start("a".to_string(), Duration::from_secs(1), counting_probe(&counter));
        assert_eq!(scheduler.len(), 1);

        wait(1_500).await;
        // one immediate tick from the surviving timer plus one interval tick
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn reschedule_waits_a_full_interval() {
        let mut scheduler = PollingScheduler::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let key = "a".to_string();

        scheduler.start(key.clone(), Duration::from_secs(1), counting_probe(&counter));
        wait(10).await;
        assert!(scheduler.reschedule(&key, Duration::from_secs(5)));
        assert_eq!(scheduler.interval(&key), Some(Duration::from_secs(5)));

        wait(4_000).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        wait(1_500).await;
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn reschedule_unknown_key_is_rejected() {
        let mut scheduler: PollingScheduler<String> = PollingScheduler::new();
        assert!(!scheduler.reschedule(&"ghost".to_string(), Duration::from_secs(1)));
        assert!(scheduler.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_probe_does_not_delay_next_tick() {
        let mut scheduler = PollingScheduler::new();
        let started = Arc::new(AtomicUsize::new(0));
        let gate = Arc::new(Notify::new());

        let task = {
            let started = Arc::clone(&started);
            let gate = Arc::clone(&gate);
            probe_task(move || {
                let started = Arc::clone(&started);
                let gate = Arc::clone(&gate);
                async move {
                    started.fetch_add(1, Ordering::SeqCst);
                    gate.notified().await;
                }
            })
        };

        scheduler.start("a".to_string(), Duration::from_secs(1), task);
        wait(3_500).await;
        assert_eq!(started.load(Ordering::SeqCst), 4);
        gate.notify_waiters();
    }

    #[tokio::test(start_paused = true)]
    async fn stopping_lets_in_flight_probe_finish() {
        let mut scheduler = PollingScheduler::new();
        let finished = Arc::new(AtomicUsize::new(0));
        let gate = Arc::new(Notify::new());

        let task = {
            let finished = Arc::clone(&finished);
            let gate = Arc::clone(&gate);
            probe_task(move || {
                let finished = Arc::clone(&finished);
                let gate = Arc::clone(&gate);
                async move {
                    gate.notified().await;
                    finished.fetch_add(1, Ordering::SeqCst);
                }
            })
        };

        scheduler.start("a".to_string(), Duration::from_secs(10), task);
        wait(10).await;
        scheduler.stop_all();
        gate.notify_waiters();
        wait(10).await;

        assert_eq!(finished.load(Ordering::SeqCst), 1);
        assert!(scheduler.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn fire_runs_probe_without_touching_timer() {
        let mut scheduler = PollingScheduler::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let key = "a".to_string();

        scheduler.start(key.clone(), Duration::from_secs(60), counting_probe(&counter));
        wait(10).await;
        assert!(scheduler.fire(&key));
        wait(10).await;

        assert_eq!(counter.load(Ordering::SeqCst), 2);
        assert_eq!(scheduler.interval(&key), Some(Duration::from_secs(60)));
        assert!(!scheduler.fire(&"ghost".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn zero_interval_is_clamped() {
        let mut scheduler = PollingScheduler::new();
        let counter = Arc::new(AtomicUsize::new(0));

        scheduler.start("a".to_string(), Duration::ZERO, counting_probe(&counter));
        assert_eq!(scheduler.interval(&"a".to_string()), Some(MIN_INTERVAL));
        scheduler.stop_all();
    }
}
