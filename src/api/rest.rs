use crate::config::ApiConfig;
use crate::db::models::ReviewLog;
use crate::db::repositories::review_logs::ReviewLogsRepository;
use crate::detection::monitor::{DetectionMonitor, DetectionState};
use crate::error::Error;
use anyhow::Result;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use log::info;
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub monitor: Arc<DetectionMonitor>,
    pub review_logs: ReviewLogsRepository,
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub message: String,
    pub status: u16,
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::NotFound(_) => ApiError {
                message: err.to_string(),
                status: StatusCode::NOT_FOUND.as_u16(),
            },
            Error::Config(_) | Error::Parse(_) => ApiError {
                message: err.to_string(),
                status: StatusCode::BAD_REQUEST.as_u16(),
            },
            _ => ApiError {
                message: err.to_string(),
                status: StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
            },
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        if let Some(err) = err.downcast_ref::<Error>() {
            return err.clone().into();
        }

        ApiError {
            message: err.to_string(),
            status: StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
        }
    }
}

/// Implement IntoResponse for ApiError
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = Json(self);
        (status, body).into_response()
    }
}

/// REST boundary exposing the detection state to the dashboard
pub struct RestApi {
    config: ApiConfig,
    state: AppState,
}

impl RestApi {
    pub fn new(
        config: &ApiConfig,
        monitor: Arc<DetectionMonitor>,
        review_logs: ReviewLogsRepository,
    ) -> Result<Self> {
        Ok(Self {
            config: config.clone(),
            state: AppState {
                monitor,
                review_logs,
            },
        })
    }

    pub async fn run(&self) -> Result<()> {
        // Local dashboard, allow everything
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
            .max_age(Duration::from_secs(3600));

        let app = Router::new()
            .route("/api/detection", get(get_detection_state))
            .route("/api/detection/alert/dismiss", post(dismiss_alert))
            .route("/api/violations", get(get_violations))
            .with_state(self.state.clone())
            .layer(cors);

        let addr = self.config.address.clone() + ":" + &self.config.port.to_string();
        let addr: SocketAddr = addr.parse()?;

        info!("API server listening on {}", addr);

        let listener = TcpListener::bind(addr).await?;

        axum::Server::from_tcp(listener.into_std()?)?
            .serve(app.into_make_service())
            .await?;

        Ok(())
    }
}

async fn get_detection_state(State(state): State<AppState>) -> Json<DetectionState> {
    Json(state.monitor.state().await)
}

async fn dismiss_alert(State(state): State<AppState>) -> StatusCode {
    state.monitor.dismiss_alert();
    StatusCode::NO_CONTENT
}

async fn get_violations(State(state): State<AppState>) -> ApiResult<Json<Vec<ReviewLog>>> {
    let logs = state.review_logs.get_all().await?;
    Ok(Json(logs))
}
