//! Terminal handler trait.

use crate::error::Fault;
use crate::pipeline::behavior::BoxFuture;
use crate::pipeline::request::Request;
use tokio_util::sync::CancellationToken;

/// Terminal handler for a typed request.
///
/// Exactly one handler is registered per request type. Handlers receive
/// the request by value plus the operation's cancellation token; any
/// I/O-bearing handler must observe the token and surface
/// [`Fault::cancelled`](crate::Fault::cancelled) instead of a result when
/// it fires.
///
/// # Example
///
/// ```
/// use keel_core::pipeline::{BoxFuture, Request, RequestHandler};
/// use keel_core::Fault;
/// use tokio_util::sync::CancellationToken;
///
/// struct Greet {
///     name: String,
/// }
///
/// impl Request for Greet {
///     type Response = String;
///     const NAME: &'static str = "Greet";
/// }
///
/// struct GreetHandler;
///
/// impl RequestHandler<Greet> for GreetHandler {
///     fn handle<'a>(
///         &'a self,
///         request: Greet,
///         _cancel: &'a CancellationToken,
///     ) -> BoxFuture<'a, Result<String, Fault>> {
///         Box::pin(async move { Ok(format!("Hello, {}!", request.name)) })
///     }
/// }
/// ```
pub trait RequestHandler<R: Request>: Send + Sync + 'static {
    /// Handles the request, producing its typed response or a fault.
    fn handle<'a>(
        &'a self,
        request: R,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<R::Response, Fault>>;
}
