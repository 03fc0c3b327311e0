use axum::{
    Router,
    routing::{patch, post},
};

use std::sync::Arc;

use crate::{balance, transactions};
use engine::Engine;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route(
            "/users/{user_id}/balance",
            patch(balance::change).get(balance::get),
        )
        .route("/users/{user_id}/balance/transfer", patch(balance::transfer))
        .route("/users/{user_id}/transactions", post(transactions::list))
        .with_state(state)
}

/// Serve until `shutdown` resolves, then let in-flight requests finish.
pub async fn run_with_listener<F>(
    engine: Arc<Engine>,
    listener: tokio::net::TcpListener,
    shutdown: F,
) -> Result<(), std::io::Error>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState { engine };

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    tracing::info!("Server stopped");
    Ok(())
}

pub fn spawn_with_listener<F>(
    engine: Arc<Engine>,
    listener: tokio::net::TcpListener,
    shutdown: F,
) -> Result<(std::net::SocketAddr, tokio::task::JoinHandle<()>), std::io::Error>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, listener, shutdown).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok((addr, handle))
}
