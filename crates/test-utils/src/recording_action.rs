use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use startorder::exec::{StartAction, StartFuture};
use startorder::types::Unit;
use tokio_util::sync::CancellationToken;

/// Something the recording action observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// `start` was called for the unit.
    Started(String),
    /// The unit's start succeeded.
    Finished(String),
    /// The unit's start failed (configured failure or cancellation).
    Failed(String),
}

/// A fake start action that:
/// - records every start / finish / failure in call order
/// - optionally sleeps per unit before finishing
/// - fails for units configured with [`RecordingAction::fail`]
/// - tracks the highest number of simultaneously running starts.
#[derive(Clone, Default)]
pub struct RecordingAction {
    events: Arc<Mutex<Vec<Event>>>,
    failing: HashSet<String>,
    delays: HashMap<String, Duration>,
    hold_until_cancelled: HashSet<String>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl RecordingAction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make starting `unit` fail.
    pub fn fail(mut self, unit: &str) -> Self {
        self.failing.insert(unit.to_string());
        self
    }

    /// Make starting `unit` take `delay`.
    pub fn delay(mut self, unit: &str, delay: Duration) -> Self {
        self.delays.insert(unit.to_string(), delay);
        self
    }

    /// Make starting `unit` block until the run is cancelled, then fail.
    pub fn hold_until_cancelled(mut self, unit: &str) -> Self {
        self.hold_until_cancelled.insert(unit.to_string());
        self
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    /// Units in the order their start was invoked.
    pub fn started(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Started(name) => Some(name),
                _ => None,
            })
            .collect()
    }

    /// Number of times `start` was invoked for `unit`.
    pub fn calls(&self, unit: &str) -> usize {
        self.started().iter().filter(|n| *n == unit).count()
    }

    /// Whether `first` finished successfully before `second` was started.
    pub fn finished_before_start(&self, first: &str, second: &str) -> bool {
        let events = self.events();
        let finished = events
            .iter()
            .position(|e| *e == Event::Finished(first.to_string()));
        let started = events
            .iter()
            .position(|e| *e == Event::Started(second.to_string()));

        matches!((finished, started), (Some(f), Some(s)) if f < s)
    }

    /// Highest number of starts that were running at the same time.
    pub fn max_concurrency(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

impl<U: Unit> StartAction<U> for RecordingAction {
    fn start(&self, ctx: CancellationToken, unit: Arc<U>) -> StartFuture {
        let this = self.clone();
        let name = unit.name().to_string();

        Box::pin(async move {
            this.push(Event::Started(name.clone()));
            let now = this.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            this.max_in_flight.fetch_max(now, Ordering::SeqCst);

            if let Some(delay) = this.delays.get(&name) {
                tokio::time::sleep(*delay).await;
            }

            let outcome = if this.hold_until_cancelled.contains(&name) {
                ctx.cancelled().await;
                Err(anyhow::anyhow!("{name} interrupted by cancellation"))
            } else if this.failing.contains(&name) {
                Err(anyhow::anyhow!("{name} refused to start"))
            } else {
                Ok(())
            };

            this.in_flight.fetch_sub(1, Ordering::SeqCst);
            match &outcome {
                Ok(()) => this.push(Event::Finished(name)),
                Err(_) => this.push(Event::Failed(name)),
            }
            outcome
        })
    }
}
