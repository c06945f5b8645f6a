// src/engine/runner.rs

use std::sync::Arc;
use std::time::Instant;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::dag::{check_acyclic, DependencyGraph, Frontier};
use crate::engine::RunOptions;
use crate::errors::{Result, StartOrderError};
use crate::exec::StartAction;
use crate::types::{Unit, UnitStatus};

/// Build a graph from `units`, validate it and start every unit in
/// dependency order.
///
/// Construction errors (unknown dependency, duplicate name) and cycles are
/// reported before `action` is ever called.
pub async fn in_dependency_order<U, A>(
    ctx: &CancellationToken,
    units: impl IntoIterator<Item = U>,
    action: A,
) -> Result<()>
where
    U: Unit,
    A: StartAction<U>,
{
    let graph = Arc::new(DependencyGraph::from_units(units)?);
    Runner::new(graph).run(ctx, action).await
}

/// Drives one startup pass over a dependency graph.
///
/// A single coordinating loop owns every launch decision. Each unit runs in
/// its own task; a finished task reports which dependents it made ready and
/// the loop launches them. Status changes go through the graph, so the caller
/// can inspect per-unit status through its own `Arc` after the run.
#[derive(Debug)]
pub struct Runner<U> {
    graph: Arc<DependencyGraph<U>>,
    options: RunOptions,
}

impl<U: Unit> Runner<U> {
    pub fn new(graph: Arc<DependencyGraph<U>>) -> Self {
        Self {
            graph,
            options: RunOptions::default(),
        }
    }

    pub fn with_options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    /// Start every unit once, dependencies before dependents.
    ///
    /// Returns the first error observed. Once an error is observed, or `ctx`
    /// is cancelled, or the deadline passes, no further unit is launched and
    /// the token handed to in-flight actions is cancelled; the call still
    /// waits for every launched task before returning.
    pub async fn run<A>(&self, ctx: &CancellationToken, action: A) -> Result<()>
    where
        A: StartAction<U>,
    {
        check_acyclic(self.graph.as_ref())?;

        let started_at = Instant::now();
        let total = self.graph.len();
        let action = Arc::new(action);
        let frontier = Arc::new(Frontier::new(self.graph.as_ref()));
        let run_token = ctx.child_token();

        let mut run = RunState {
            tasks: JoinSet::new(),
            launched: 0,
            stop: None,
        };

        info!(units = total, "starting units in dependency order");

        for name in frontier.initial() {
            self.launch(&mut run, &run_token, &frontier, &action, name);
        }

        let timeout = self.options.timeout;
        let deadline = async move {
            match timeout {
                Some(t) => tokio::time::sleep(t).await,
                None => std::future::pending().await,
            }
        };
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                joined = run.tasks.join_next() => {
                    let Some(joined) = joined else { break };
                    match joined {
                        Ok(Ok(ready)) => {
                            for name in ready {
                                self.launch(&mut run, &run_token, &frontier, &action, name);
                            }
                        }
                        Ok(Err(err)) => {
                            // An action that failed because the caller cancelled
                            // must not mask the cancellation itself.
                            run.note_external_cancel(ctx);
                            run.record_stop(err, &run_token);
                        }
                        Err(join_err) => run.record_stop(StartOrderError::from(join_err), &run_token),
                    }
                }

                _ = run_token.cancelled(), if run.stop.is_none() => run.note_external_cancel(ctx),

                _ = &mut deadline, if run.stop.is_none() => {
                    let t = timeout.unwrap_or_default();
                    warn!(timeout = ?t, in_flight = run.tasks.len(), "run deadline exceeded");
                    run.record_stop(StartOrderError::DeadlineExceeded(t), &run_token);
                }
            }
        }

        let started = self
            .graph
            .statuses()
            .values()
            .filter(|s| **s == UnitStatus::Started)
            .count();

        match run.stop {
            // Cancellation that raced with the last completions did not
            // actually prevent anything from starting.
            Some(StartOrderError::Cancelled | StartOrderError::DeadlineExceeded(_))
                if started == total =>
            {
                info!(units = total, elapsed = ?started_at.elapsed(), "all units started");
                Ok(())
            }
            Some(err) => {
                error!(error = %err, started, units = total, "run aborted");
                Err(err)
            }
            None if started == total => {
                info!(units = total, elapsed = ?started_at.elapsed(), "all units started");
                Ok(())
            }
            None => {
                error!(started, launched = run.launched, units = total, "run ended with units never ready");
                Err(StartOrderError::Other(anyhow::anyhow!(
                    "{} of {} units were never ready to start",
                    total - started,
                    total
                )))
            }
        }
    }

    fn launch<A>(
        &self,
        run: &mut RunState,
        run_token: &CancellationToken,
        frontier: &Arc<Frontier>,
        action: &Arc<A>,
        name: String,
    ) where
        A: StartAction<U>,
    {
        if run.stop.is_some() {
            debug!(unit = %name, "run is stopping; not launching unit");
            return;
        }
        if run_token.is_cancelled() {
            run.stop = Some(StartOrderError::Cancelled);
            debug!(unit = %name, "run cancelled; not launching unit");
            return;
        }

        let Some(unit) = self.graph.unit(&name) else {
            run.record_stop(StartOrderError::UnitNotFound(name), run_token);
            return;
        };

        debug!(unit = %name, "dependencies started; launching unit");
        run.launched += 1;
        run.tasks.spawn(start_unit(
            name,
            unit,
            Arc::clone(&self.graph),
            Arc::clone(frontier),
            Arc::clone(action),
            run_token.clone(),
        ));
    }
}

/// Mutable bookkeeping owned by the coordinating loop.
struct RunState {
    tasks: JoinSet<Result<Vec<String>>>,
    launched: usize,
    stop: Option<StartOrderError>,
}

impl RunState {
    fn note_external_cancel(&mut self, ctx: &CancellationToken) {
        if self.stop.is_none() && ctx.is_cancelled() {
            warn!(in_flight = self.tasks.len(), "run cancelled; no further units will be launched");
            self.stop = Some(StartOrderError::Cancelled);
        }
    }

    /// Keep the first reason to stop and tell in-flight actions about it.
    fn record_stop(&mut self, err: StartOrderError, run_token: &CancellationToken) {
        if self.stop.is_none() {
            self.stop = Some(err);
            run_token.cancel();
        } else {
            debug!(error = %err, "error after run was already stopping");
        }
    }
}

/// Body of a single unit's task.
///
/// Starts the unit, marks it `Started`, then returns the dependents for
/// which this was the last outstanding dependency.
async fn start_unit<U, A>(
    name: String,
    unit: Arc<U>,
    graph: Arc<DependencyGraph<U>>,
    frontier: Arc<Frontier>,
    action: Arc<A>,
    token: CancellationToken,
) -> Result<Vec<String>>
where
    U: Unit,
    A: StartAction<U>,
{
    debug_assert!(
        graph
            .unsatisfied_dependencies(&name)
            .is_ok_and(|deps| deps.is_empty()),
        "unit {name} launched before its dependencies started"
    );

    info!(unit = %name, "starting unit");

    if let Err(err) = action.start(token, unit).await {
        warn!(unit = %name, error = %err, "unit failed to start");
        return Err(StartOrderError::activation(name, err));
    }

    graph.set_status(&name, UnitStatus::Started)?;
    info!(unit = %name, "unit started");

    let mut ready = Vec::new();
    for dependent in graph.dependents_of(&name)? {
        if frontier.release(&dependent)? {
            ready.push(dependent);
        }
    }

    Ok(ready)
}
