mod routes;
mod templates;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use regdesk_db::Database;

use crate::routes::{AppState, AppStateInner};
use crate::templates::Templates;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "regdesk=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let host = std::env::var("REGDESK_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("REGDESK_PORT")
        .unwrap_or_else(|_| "8080".into())
        .parse()?;
    let db_path: PathBuf = std::env::var("REGDESK_DB_PATH")
        .unwrap_or_else(|_| "regdesk.db".into())
        .into();
    let template_dir: PathBuf = std::env::var("REGDESK_TEMPLATE_DIR")
        .unwrap_or_else(|_| "templates".into())
        .into();
    let static_dir: PathBuf = std::env::var("REGDESK_STATIC_DIR")
        .unwrap_or_else(|_| "static".into())
        .into();
    let graceful_timeout: Duration = std::env::var("REGDESK_GRACEFUL_TIMEOUT_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .map(Duration::from_secs)
        .unwrap_or(Duration::from_secs(15));

    // Init database and templates; either failing aborts startup before the
    // listener ever opens.
    let db = Arc::new(Database::open(&db_path)?);
    let templates = Templates::load(&template_dir)?;

    let state: AppState = Arc::new(AppStateInner {
        db: db.clone(),
        templates,
    });

    let app = routes::app(state, &static_dir);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let server = tokio::spawn(serve(addr, app, shutdown_rx));

    // Block on SIGINT only. SIGTERM and friends are deliberately not
    // intercepted and terminate the process immediately.
    tokio::signal::ctrl_c().await?;
    info!(
        "interrupt received, draining connections for up to {:?}",
        graceful_timeout
    );

    let _ = shutdown_tx.send(());
    drain(server, graceful_timeout).await;

    // The serve task is gone; reclaim the handle and close it explicitly.
    close_database(db);

    info!("shutting down");
    Ok(())
}

/// Close the database on the way out. Failures here are logged, never
/// propagated: the graceful path always exits with status 0.
fn close_database(db: Arc<Database>) {
    match Arc::into_inner(db) {
        Some(db) => {
            if let Err(e) = db.close() {
                error!("failed to close database on shutdown: {e:#}");
            }
        }
        None => warn!("database handle still shared at shutdown, skipping close"),
    }
}

/// Bind and run the accept loop. Runs on its own task so that a bind failure
/// is observed via the log rather than crashing the main task.
async fn serve(addr: SocketAddr, app: Router, shutdown: oneshot::Receiver<()>) {
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("failed to bind {addr}: {e}");
            return;
        }
    };
    info!("regdesk listening on {addr}");

    let result = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.await;
        })
        .await;
    if let Err(e) = result {
        error!("server error: {e}");
    }
}

/// Wait for the serve task to drain in-flight connections, force-closing
/// whatever remains once the timeout elapses. Both paths end in the same
/// clean exit.
async fn drain(mut server: JoinHandle<()>, timeout: Duration) {
    if tokio::time::timeout(timeout, &mut server).await.is_err() {
        warn!("graceful shutdown timed out after {:?}, closing remaining connections", timeout);
        server.abort();
        let _ = server.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::get;
    use tokio::io::AsyncWriteExt;
    use uuid::Uuid;

    #[tokio::test]
    async fn server_stops_once_shutdown_is_triggered() {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
        let server = tokio::spawn(serve(addr, Router::new(), shutdown_rx));

        shutdown_tx.send(()).unwrap();
        drain(server, Duration::from_secs(5)).await;
    }

    #[tokio::test]
    async fn drain_force_closes_held_connection_within_timeout() {
        // A handler that outlives any reasonable drain window.
        let app = Router::new().route(
            "/",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                "late"
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let server = tokio::spawn(async move {
            let result = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await;
            if let Err(e) = result {
                error!("server error: {e}");
            }
        });

        // Hold a request open so the graceful drain cannot complete.
        let mut client = tokio::net::TcpStream::connect(addr).await.unwrap();
        client
            .write_all(b"GET / HTTP/1.1\r\nhost: localhost\r\n\r\n")
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;

        let timeout = Duration::from_secs(2);
        let started = std::time::Instant::now();
        shutdown_tx.send(()).unwrap();
        drain(server, timeout).await;
        let elapsed = started.elapsed();

        assert!(
            elapsed >= timeout,
            "drain returned while the held request was still running: {elapsed:?}"
        );
        assert!(
            elapsed < timeout + Duration::from_secs(2),
            "drain did not force-close within the timeout plus margin: {elapsed:?}"
        );

        drop(client);
    }

    #[tokio::test]
    async fn bind_failure_is_observed_not_fatal() {
        // Occupy a port, then ask serve() to bind the same one.
        let occupied = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = occupied.local_addr().unwrap();

        let (_shutdown_tx, shutdown_rx) = oneshot::channel();
        let server = tokio::spawn(serve(addr, Router::new(), shutdown_rx));

        // The task returns on its own after logging the bind error.
        tokio::time::timeout(Duration::from_secs(5), server)
            .await
            .expect("serve task should return after bind failure")
            .unwrap();
    }

    #[test]
    fn close_database_never_fails_the_shutdown_path() {
        let path = std::env::temp_dir().join(format!("regdesk-close-{}.db", Uuid::new_v4()));
        let db = Arc::new(Database::open(&path).unwrap());

        // Still shared: the close is skipped, not an error.
        let extra = db.clone();
        close_database(db);

        // Sole owner: closes cleanly.
        close_database(extra);

        let _ = std::fs::remove_file(&path);
    }
}
