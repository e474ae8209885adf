//! HTTP control endpoint for the runtime log level
//!
//! `GET /updateLevel?level=<name>` sets the shared [`LevelController`].
//! A missing or empty `level` resets it to `info`.
//! The server runs on its own thread with a current-thread tokio runtime so
//! it works whether or not the host application is async.

use crate::core::{parse_level, LevelController, LoggerError, Result};
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::thread;
use tokio::sync::oneshot;

#[derive(Debug, Deserialize)]
pub struct LevelQuery {
    level: Option<String>,
}

#[derive(Debug, Serialize)]
struct LevelResponse {
    code: u16,
    message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    level: Option<&'static str>,
}

async fn update_level(
    State(controller): State<LevelController>,
    query: std::result::Result<Query<LevelQuery>, QueryRejection>,
) -> (StatusCode, Json<LevelResponse>) {
    let parsed = query
        .ok()
        .map(|Query(q)| q.level.unwrap_or_default())
        .and_then(|name| parse_level(&name).ok());

    match parsed {
        Some(level) => {
            let previous = controller.level();
            controller.set_level(level);
            tracing::info!(from = %previous, to = %level, "log level updated");
            (
                StatusCode::OK,
                Json(LevelResponse {
                    code: 200,
                    message: "ok",
                    level: Some(level.as_str()),
                }),
            )
        }
        None => (
            StatusCode::BAD_REQUEST,
            Json(LevelResponse {
                code: 400,
                message: "parse level failed",
                level: None,
            }),
        ),
    }
}

/// Routes served by [`LevelServer`], usable on its own when embedding into
/// an existing axum application
pub fn router(controller: LevelController) -> Router {
    Router::new()
        .route("/updateLevel", get(update_level).post(update_level))
        .with_state(controller)
}

/// Handle to a running control endpoint; dropping it stops the server
pub struct LevelServer {
    local_addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl LevelServer {
    /// Bind `addr` synchronously and start serving in the background
    pub fn bind(addr: &str, controller: LevelController) -> Result<Self> {
        let listener = std::net::TcpListener::bind(addr)
            .map_err(|e| LoggerError::server(addr, e.to_string()))?;
        listener
            .set_nonblocking(true)
            .map_err(|e| LoggerError::server(addr, e.to_string()))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| LoggerError::server(addr, e.to_string()))?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let app = router(controller);

        let handle = thread::Builder::new()
            .name("logtee-level-server".to_string())
            .spawn(move || {
                let runtime = match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(rt) => rt,
                    Err(e) => {
                        tracing::error!(addr = %local_addr, error = %e, "level server runtime failed");
                        return;
                    }
                };

                runtime.block_on(async move {
                    let listener = match tokio::net::TcpListener::from_std(listener) {
                        Ok(l) => l,
                        Err(e) => {
                            tracing::error!(addr = %local_addr, error = %e, "level server listener failed");
                            return;
                        }
                    };
                    let signal = async {
                        let _ = shutdown_rx.await;
                    };
                    if let Err(e) = axum::serve(listener, app)
                        .with_graceful_shutdown(signal)
                        .await
                    {
                        tracing::error!(addr = %local_addr, error = %e, "level server stopped");
                    }
                });
            })
            .map_err(|e| LoggerError::server(addr, e.to_string()))?;

        tracing::debug!(addr = %local_addr, "level server listening");
        Ok(Self {
            local_addr,
            shutdown: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting requests and wait for the server thread
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for LevelServer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for LevelServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LevelServer")
            .field("local_addr", &self.local_addr)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LogLevel;

    fn get(url: &str) -> (u16, serde_json::Value) {
        let response = reqwest::blocking::get(url).unwrap();
        let status = response.status().as_u16();
        (status, response.json().unwrap())
    }

    #[test]
    fn test_update_level() {
        let controller = LevelController::new(LogLevel::Info);
        let server = LevelServer::bind("127.0.0.1:0", controller.clone()).unwrap();
        let base = format!("http://{}", server.local_addr());

        let (status, body) = get(&format!("{}/updateLevel?level=debug", base));
        assert_eq!(status, 200);
        assert_eq!(body["code"], 200);
        assert_eq!(body["level"], "debug");
        assert_eq!(controller.level(), LogLevel::Debug);
    }

    #[test]
    fn test_rejects_bad_level() {
        let controller = LevelController::new(LogLevel::Warn);
        let server = LevelServer::bind("127.0.0.1:0", controller.clone()).unwrap();
        let base = format!("http://{}", server.local_addr());

        for query in ["?level=verbose", "?level=trace"] {
            let (status, body) = get(&format!("{}/updateLevel{}", base, query));
            assert_eq!(status, 400);
            assert_eq!(body, serde_json::json!({"code": 400, "message": "parse level failed"}));
        }
        assert_eq!(controller.level(), LogLevel::Warn);
    }

    #[test]
    fn test_empty_level_resets_to_info() {
        let controller = LevelController::new(LogLevel::Error);
        let server = LevelServer::bind("127.0.0.1:0", controller.clone()).unwrap();
        let base = format!("http://{}", server.local_addr());

        for query in ["?level=", ""] {
            controller.set_level(LogLevel::Error);
            let (status, body) = get(&format!("{}/updateLevel{}", base, query));
            assert_eq!(status, 200);
            assert_eq!(body["level"], "info");
            assert_eq!(controller.level(), LogLevel::Info);
        }
    }

    #[test]
    fn test_bind_conflict() {
        let first = LevelServer::bind("127.0.0.1:0", LevelController::default()).unwrap();
        let addr = first.local_addr().to_string();
        assert!(matches!(
            LevelServer::bind(&addr, LevelController::default()),
            Err(LoggerError::ServerError { .. })
        ));
    }

    #[test]
    fn test_shutdown_is_idempotent() {
        let mut server = LevelServer::bind("127.0.0.1:0", LevelController::default()).unwrap();
        server.shutdown();
        server.shutdown();
    }
}
