//! Ctrl-C is the only shutdown trigger this service needs; `tokio::signal::ctrl_c`
//! supports being awaited from more than one call site; each caller gets its
//! own copy of the event, so both the HTTP server and the bus listener can
//! watch for it independently.

pub async fn signal() {
    tokio::signal::ctrl_c().await.expect("failed to install ctrl-c handler");
    tracing::info!("shutdown signal received");
}
