// src/exec/action.rs

//! Pluggable start action abstraction.
//!
//! The runner never knows what "starting a unit" means; it calls a
//! [`StartAction`] once per unit. Production code uses
//! [`ShellAction`](super::ShellAction); tests and embedders can wrap a
//! closure with [`action_fn`].

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

/// Future returned by [`StartAction::start`].
pub type StartFuture = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'static>>;

/// How a single unit is started.
///
/// `start` may be called concurrently for different units, but never twice
/// for the same unit within one run. The token is cancelled when the run is
/// aborted (first failure, caller cancellation or deadline); an
/// implementation that can stop early should watch it.
pub trait StartAction<U>: Send + Sync + 'static {
    fn start(&self, ctx: CancellationToken, unit: Arc<U>) -> StartFuture;
}

impl<U, A> StartAction<U> for Arc<A>
where
    A: StartAction<U> + ?Sized,
{
    fn start(&self, ctx: CancellationToken, unit: Arc<U>) -> StartFuture {
        (**self).start(ctx, unit)
    }
}

/// [`StartAction`] backed by an async closure. Built with [`action_fn`].
#[derive(Clone)]
pub struct FnAction<F> {
    f: F,
}

/// Wrap `f` as a [`StartAction`].
///
/// ```no_run
/// use startorder::exec::action_fn;
/// use startorder::types::UnitSpec;
///
/// let action = action_fn(|_ctx, unit: std::sync::Arc<UnitSpec>| async move {
///     println!("starting {}", unit.name);
///     Ok(())
/// });
/// # let _ = action;
/// ```
pub fn action_fn<U, F, Fut>(f: F) -> FnAction<F>
where
    F: Fn(CancellationToken, Arc<U>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    FnAction { f }
}

impl<U, F, Fut> StartAction<U> for FnAction<F>
where
    U: Send + Sync + 'static,
    F: Fn(CancellationToken, Arc<U>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    fn start(&self, ctx: CancellationToken, unit: Arc<U>) -> StartFuture {
        Box::pin((self.f)(ctx, unit))
    }
}
