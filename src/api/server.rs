use std::net::SocketAddr;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{MatchedPath, Request};
use axum::middleware::{Next, from_fn};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use http::StatusCode;
use serde::Serialize;
use sqlx::PgPool;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::instrument;

use crate::api::handler::*;
use crate::db::prelude::{PgError, ScoreRejection};
use crate::games::GameErr;
use crate::util::helix::{Helix, HelixErr};
use crate::util::token::TokenProvider;

pub type JsonResult<T> = core::result::Result<Json<T>, RouteError>;

#[derive(Debug)]
pub struct AppState {
    pub helix: Helix,
    pub tokens: TokenProvider,
    pub db_pool: PgPool,
}

pub fn app(state: Arc<AppState>, cors: CorsLayer) -> Router {
    Router::new()
        .route("/", get(|| async { Response::new(Body::empty()) }))
        //
        // game candidates
        .route("/games/pair", get(game_pair))
        .route("/games/{game_id}/streams", get(game_streams))
        //
        // high scores
        .route("/leaderboard", get(leaderboard).post(save_high_score))
        .layer(
            TraceLayer::new_for_http().make_span_with(|req: &axum::http::Request<_>| {
                let method = req.method();
                let uri = req.uri();

                let matched_path = req
                    .extensions()
                    .get::<MatchedPath>()
                    .map(|matched| matched.as_str());

                tracing::debug_span!("api_request", ?method, ?uri, ?matched_path)
            }),
        )
        .layer(from_fn(log_route_errors))
        .layer(cors)
        .with_state(state)
}

#[instrument(skip(tx, state, cors))]
pub async fn router(
    tx: UnboundedSender<SocketAddr>,
    state: Arc<AppState>,
    cors: CorsLayer,
    port: u16,
) -> std::io::Result<()> {
    let app = app(state, cors);

    let socket_addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)), port);
    let listener = tokio::net::TcpListener::bind(socket_addr).await?;

    if tx.send(socket_addr).is_err() {
        tracing::warn!("server ready receiver dropped before bind completed");
    }

    axum::serve(listener, app).await
}

/// Logs any `RouteError` a handler attached to its response
#[instrument(skip(request, next), fields(uri = request.uri().to_string()))]
async fn log_route_errors(request: Request, next: Next) -> Response {
    let res = next.run(request).await;
    if let Some(err) = res.extensions().get::<Arc<RouteError>>() {
        tracing::error!(error = ?err, "error occurred inside route handler");
    }

    res
}

#[instrument(skip(state, cors))]
pub async fn start_server(
    state: Arc<AppState>,
    cors: CorsLayer,
    port: u16,
) -> Vec<JoinHandle<()>> {
    tracing::info!("starting server");
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<SocketAddr>();

    let server_handle = tokio::task::spawn(async move {
        if let Err(e) = router(tx, state, cors, port).await {
            tracing::error!(error = ?e, "server exited with error");
        }
    });

    let logging_handle = tokio::task::spawn(async move {
        if let Some(addr) = rx.recv().await {
            tracing::info!(
                server_url = &format!("http://127.0.0.1:{}", addr.port()),
                "server ready"
            );
        }
    });

    vec![server_handle, logging_handle]
}

#[derive(Debug, Error)]
pub enum RouteError {
    #[error(transparent)]
    GameError(#[from] GameErr),

    #[error(transparent)]
    QueryError(#[from] PgError),

    #[error(transparent)]
    SqlxError(#[from] sqlx::Error),

    #[error(transparent)]
    InvalidScore(#[from] ScoreRejection),
}

impl IntoResponse for RouteError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            message: String,
        }

        let (status, message, err) = match &self {
            RouteError::GameError(game_err) => match game_err {
                GameErr::Helix(HelixErr::Configuration(_) | HelixErr::HeaderError(_)) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    game_err.to_string(),
                    Some(self),
                ),
                GameErr::Helix(_) => (StatusCode::BAD_GATEWAY, game_err.to_string(), Some(self)),
                GameErr::NoData | GameErr::InsufficientCandidates { .. } => (
                    StatusCode::SERVICE_UNAVAILABLE,
                    game_err.to_string(),
                    Some(self),
                ),
            },

            // the sqlx error stays in the logs, clients only see the generic message
            RouteError::QueryError(PgError::SaveFailed(_)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                String::from("failed to save high score"),
                Some(self),
            ),

            RouteError::QueryError(_) | RouteError::SqlxError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                String::from("failed to load leaderboard"),
                Some(self),
            ),

            RouteError::InvalidScore(rejection) => (
                StatusCode::BAD_REQUEST,
                rejection.to_string(),
                None, // caller mistake, nothing for the server to report
            ),
        };

        let mut response = (status, Json(ErrorResponse { message })).into_response();
        if let Some(err) = err {
            response.extensions_mut().insert(Arc::new(err));
        }

        response
    }
}
