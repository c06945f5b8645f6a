// tests/cancellation.rs

mod common;
use crate::common::builders::units;
use crate::common::{init_tracing, with_timeout, Event, RecordingAction};

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use startorder::dag::DependencyGraph;
use startorder::engine::{RunOptions, Runner};
use startorder::exec::action_fn;
use startorder::{CancellationToken, StartOrderError, UnitSpec, UnitStatus};

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test]
async fn external_cancellation_stops_new_launches() -> TestResult {
    with_timeout(async {
        init_tracing();

        let graph = Arc::new(DependencyGraph::from_units(units(&[
            ("db", &[]),
            ("api", &["db"]),
        ]))?);
        let action = RecordingAction::new().hold_until_cancelled("db");
        let ctx = CancellationToken::new();

        let canceller = {
            let ctx = ctx.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                ctx.cancel();
            })
        };

        let err = Runner::new(Arc::clone(&graph))
            .run(&ctx, action.clone())
            .await
            .unwrap_err();
        canceller.await?;

        assert!(matches!(err, StartOrderError::Cancelled), "got {err:?}");
        assert_eq!(action.events(), vec![
            Event::Started("db".to_string()),
            Event::Failed("db".to_string()),
        ]);
        assert_eq!(graph.status_of("api"), Some(UnitStatus::Stopped));

        Ok(())
    })
    .await
}

#[tokio::test]
async fn first_failure_cancels_in_flight_siblings() -> TestResult {
    with_timeout(async {
        init_tracing();

        // `broken` fails quickly; `slow` is still running and sees the run's
        // token cancelled. The run reports `broken`, not the follow-up failure.
        let action = RecordingAction::new()
            .delay("broken", Duration::from_millis(10))
            .fail("broken")
            .hold_until_cancelled("slow");

        let graph = Arc::new(DependencyGraph::from_units(units(&[
            ("broken", &[]),
            ("slow", &[]),
            ("after_slow", &["slow"]),
        ]))?);

        let err = Runner::new(Arc::clone(&graph))
            .run(&CancellationToken::new(), action.clone())
            .await
            .unwrap_err();

        assert_eq!(err.unit(), Some("broken"));
        assert!(action.events().contains(&Event::Failed("slow".to_string())));
        assert_eq!(action.calls("after_slow"), 0);

        Ok(())
    })
    .await
}

#[tokio::test]
async fn in_flight_units_run_to_completion_after_failure() -> TestResult {
    with_timeout(async {
        init_tracing();

        // `steady` ignores cancellation and finishes after `broken` failed;
        // the run waits for it, but its dependent is never launched.
        let action = RecordingAction::new()
            .fail("broken")
            .delay("steady", Duration::from_millis(30));

        let graph = Arc::new(DependencyGraph::from_units(units(&[
            ("broken", &[]),
            ("steady", &[]),
            ("needs_steady", &["steady"]),
        ]))?);

        let err = Runner::new(Arc::clone(&graph))
            .run(&CancellationToken::new(), action.clone())
            .await
            .unwrap_err();

        assert_eq!(err.unit(), Some("broken"));
        assert!(action.events().contains(&Event::Finished("steady".to_string())));
        assert_eq!(graph.status_of("steady"), Some(UnitStatus::Started));
        assert_eq!(action.calls("needs_steady"), 0);

        Ok(())
    })
    .await
}

#[tokio::test]
async fn deadline_reports_timeout() -> TestResult {
    with_timeout(async {
        init_tracing();

        let action = RecordingAction::new().hold_until_cancelled("stuck");
        let graph = Arc::new(DependencyGraph::from_units(units(&[
            ("stuck", &[]),
            ("next", &["stuck"]),
        ]))?);

        let err = Runner::new(Arc::clone(&graph))
            .with_options(RunOptions {
                timeout: Some(Duration::from_millis(40)),
            })
            .run(&CancellationToken::new(), action.clone())
            .await
            .unwrap_err();

        assert!(matches!(err, StartOrderError::DeadlineExceeded(_)), "got {err:?}");
        assert_eq!(action.calls("next"), 0);

        Ok(())
    })
    .await
}

#[tokio::test]
async fn deadline_longer_than_run_is_harmless() -> TestResult {
    with_timeout(async {
        init_tracing();

        let action = RecordingAction::new();
        Runner::new(Arc::new(DependencyGraph::from_units(units(&[
            ("a", &[]),
            ("b", &["a"]),
        ]))?))
        .with_options(RunOptions {
            timeout: Some(Duration::from_secs(2)),
        })
        .run(&CancellationToken::new(), action.clone())
        .await?;

        assert_eq!(action.started(), vec!["a".to_string(), "b".to_string()]);
        Ok(())
    })
    .await
}

#[tokio::test]
async fn cancellation_after_every_unit_started_still_succeeds() -> TestResult {
    with_timeout(async {
        init_tracing();

        let graph = Arc::new(DependencyGraph::from_units(units(&[
            ("db", &[]),
            ("api", &["db"]),
        ]))?);
        let ctx = CancellationToken::new();

        // The last unit to start cancels the caller's token once its own work
        // is done, so the cancellation lands after nothing is left to launch.
        let outer = ctx.clone();
        let action = action_fn(move |_run: CancellationToken, unit: Arc<UnitSpec>| {
            let outer = outer.clone();
            async move {
                if unit.name == "api" {
                    outer.cancel();
                }
                Ok(())
            }
        });

        Runner::new(Arc::clone(&graph)).run(&ctx, action).await?;

        assert!(ctx.is_cancelled());
        assert_eq!(graph.status_of("db"), Some(UnitStatus::Started));
        assert_eq!(graph.status_of("api"), Some(UnitStatus::Started));

        Ok(())
    })
    .await
}
