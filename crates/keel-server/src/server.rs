//! HTTP server loop.
//!
//! Binds the configured address, serves each connection on its own task,
//! and drains on shutdown. Every in-flight operation receives a child of
//! the shutdown token so cancellation propagates through the pipeline's
//! I/O-bearing stages.

use crate::boundary;
use crate::state::AppState;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

/// Failure starting or running the listener.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The configured bind address did not parse.
    #[error("invalid bind address '{addr}'")]
    InvalidAddr {
        /// The offending address string.
        addr: String,
    },

    /// Binding the listener failed.
    #[error("failed to bind {addr}")]
    Bind {
        /// The address that could not be bound.
        addr: SocketAddr,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

/// Runs the server until `shutdown` fires.
pub async fn run(state: AppState, shutdown: CancellationToken) -> Result<(), ServerError> {
    let addr: SocketAddr =
        state
            .settings
            .server
            .bind_addr
            .parse()
            .map_err(|_| ServerError::InvalidAddr {
                addr: state.settings.server.bind_addr.clone(),
            })?;

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;

    tracing::info!(%addr, service = %state.settings.service.name, "listening");

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, peer)) => {
                        let state = state.clone();
                        let shutdown = shutdown.clone();
                        tokio::spawn(async move {
                            serve_connection(state, stream, peer, shutdown).await;
                        });
                    }
                    Err(error) => {
                        tracing::error!(%error, "accept failed");
                    }
                }
            }
            () = shutdown.cancelled() => {
                tracing::info!("shutdown signal received, stopping listener");
                break;
            }
        }
    }

    Ok(())
}

/// Serves one connection; each request runs with a child cancellation
/// token so server shutdown reaches in-flight pipelines.
async fn serve_connection(
    state: AppState,
    stream: tokio::net::TcpStream,
    peer: SocketAddr,
    shutdown: CancellationToken,
) {
    let io = TokioIo::new(stream);
    let service = service_fn(move |request| {
        let state = state.clone();
        let cancel = shutdown.child_token();
        async move { Ok::<_, Infallible>(boundary::handle(state, request, peer, cancel).await) }
    });

    if let Err(error) = http1::Builder::new().serve_connection(io, service).await {
        tracing::debug!(%peer, %error, "connection closed with error");
    }
}
