//! Behavior trait and chain continuation.
//!
//! A behavior wraps the invocation of everything downstream of it: later
//! behaviors and finally the terminal handler. Behaviors either call
//! [`Next::run`] exactly once or short-circuit with their own result; they
//! never suppress faults from downstream.

use crate::error::Fault;
use crate::pipeline::handler::RequestHandler;
use crate::pipeline::request::Request;
use std::future::Future;
use std::pin::Pin;
use tokio_util::sync::CancellationToken;

/// A boxed future returned by behaviors and handlers.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// One stage in a request type's interceptor chain.
///
/// The chain for a request type is fixed at registration; stages cannot be
/// reordered per invocation.
pub trait Behavior<R: Request>: Send + Sync + 'static {
    /// Stage name used in logs and diagnostics.
    fn name(&self) -> &'static str;

    /// Processes the request, invoking `next` to continue the chain.
    fn handle<'a>(
        &'a self,
        request: R,
        next: Next<'a, R>,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<R::Response, Fault>>;
}

/// Continuation invoking the rest of the chain.
///
/// Consumed by [`run`](Next::run) so a stage can only continue once.
pub struct Next<'a, R: Request> {
    inner: NextInner<'a, R>,
}

enum NextInner<'a, R: Request> {
    Stage {
        stage: &'a dyn Behavior<R>,
        next: Box<Next<'a, R>>,
    },
    Handler(&'a dyn RequestHandler<R>),
}

impl<'a, R: Request> Next<'a, R> {
    /// Creates a continuation that invokes `stage` before the rest.
    pub(crate) fn stage(stage: &'a dyn Behavior<R>, next: Next<'a, R>) -> Self {
        Self {
            inner: NextInner::Stage {
                stage,
                next: Box::new(next),
            },
        }
    }

    /// Creates the terminal continuation invoking the handler.
    pub(crate) fn handler(handler: &'a dyn RequestHandler<R>) -> Self {
        Self {
            inner: NextInner::Handler(handler),
        }
    }

    /// Invokes the next stage or the terminal handler.
    pub async fn run(
        self,
        request: R,
        cancel: &CancellationToken,
    ) -> Result<R::Response, Fault> {
        match self.inner {
            NextInner::Stage { stage, next } => stage.handle(request, *next, cancel).await,
            NextInner::Handler(handler) => handler.handle(request, cancel).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    struct Probe;

    impl Request for Probe {
        type Response = u32;
        const NAME: &'static str = "Probe";
    }

    struct ProbeHandler;

    impl RequestHandler<Probe> for ProbeHandler {
        fn handle<'a>(
            &'a self,
            _request: Probe,
            _cancel: &'a CancellationToken,
        ) -> BoxFuture<'a, Result<u32, Fault>> {
            Box::pin(async { Ok(7) })
        }
    }

    struct Recorder {
        name: &'static str,
        calls: Arc<AtomicUsize>,
        order: Arc<Mutex<Vec<&'static str>>>,
    }

    impl Behavior<Probe> for Recorder {
        fn name(&self) -> &'static str {
            self.name
        }

        fn handle<'a>(
            &'a self,
            request: Probe,
            next: Next<'a, Probe>,
            cancel: &'a CancellationToken,
        ) -> BoxFuture<'a, Result<u32, Fault>> {
            Box::pin(async move {
                self.calls.fetch_add(1, Ordering::SeqCst);
                self.order.lock().unwrap().push(self.name);
                next.run(request, cancel).await
            })
        }
    }

    #[tokio::test]
    async fn terminal_next_invokes_handler() {
        let cancel = CancellationToken::new();
        let next = Next::handler(&ProbeHandler);
        assert_eq!(next.run(Probe, &cancel).await.unwrap(), 7);
    }

    #[tokio::test]
    async fn stages_run_in_wrap_order() {
        let calls = Arc::new(AtomicUsize::new(0));
        let order = Arc::new(Mutex::new(Vec::new()));

        let outer = Recorder {
            name: "outer",
            calls: calls.clone(),
            order: order.clone(),
        };
        let inner = Recorder {
            name: "inner",
            calls: calls.clone(),
            order: order.clone(),
        };

        let cancel = CancellationToken::new();
        let chain = Next::stage(&outer, Next::stage(&inner, Next::handler(&ProbeHandler)));

        assert_eq!(chain.run(Probe, &cancel).await.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(*order.lock().unwrap(), vec!["outer", "inner"]);
    }
}
