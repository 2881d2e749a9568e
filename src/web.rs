use crate::{
    app::{App, StatusReport},
    errors::CatalogError,
    matcher::{parse_amount, Constraints, ScoredPattern},
    patterns::AmountUnit,
};
use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tokio::signal;

#[derive(Clone)]
struct SharedState {
    app: Arc<App>,
}

pub fn router(app: Arc<App>) -> Router {
    let shared_state = Arc::new(SharedState { app });

    Router::new()
        .route("/api/status", get(status))
        .route("/api/yarn_types", get(yarn_types))
        .route("/api/match", post(rank))
        .route("/api/refresh", post(refresh))
        .layer(
            tower_http::trace::TraceLayer::new_for_http()
                .make_span_with(
                    tower_http::trace::DefaultMakeSpan::new().level(tracing::Level::INFO),
                )
                .on_response(
                    tower_http::trace::DefaultOnResponse::new().level(tracing::Level::INFO),
                ),
        )
        .with_state(shared_state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            log::error!("failed to install Ctrl+C handler: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => {
                log::error!("failed to install signal handler: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::warn!("shutting down");
}

pub async fn serve(app: Arc<App>, addr: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("listening on {addr}");
    axum::serve(listener, router(app))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

#[derive(Debug)]
struct HttpError(CatalogError);

impl IntoResponse for HttpError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.0 {
            CatalogError::FetchExhausted(_) | CatalogError::LiveCatalogInsufficient { .. } => {
                axum::http::StatusCode::BAD_GATEWAY
            }
            CatalogError::FallbackUnavailable(_) => {
                log::error!("{self:?}");
                axum::http::StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(json!({"error": self.0.to_string()}))).into_response()
    }
}

impl From<CatalogError> for HttpError {
    fn from(err: CatalogError) -> Self {
        Self(err)
    }
}

/// Amount as typed by the user; numbers and strings are both accepted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRequest {
    #[serde(default)]
    pub amount: Option<serde_json::Value>,
    #[serde(default)]
    pub amount_unit: AmountUnit,
    #[serde(default)]
    pub yarn_type: String,
    #[serde(default)]
    pub yarn_weight: String,
}

impl MatchRequest {
    fn amount(&self) -> Option<i64> {
        match self.amount.as_ref()? {
            serde_json::Value::Number(n) => n.as_i64().or_else(|| {
                n.as_f64()
                    .filter(|f| f.is_finite())
                    .map(|f| f.trunc() as i64)
            }),
            serde_json::Value::String(s) => parse_amount(s),
            _ => None,
        }
    }

    pub fn constraints(&self) -> Constraints {
        Constraints::new(
            self.amount(),
            self.amount_unit,
            &self.yarn_type,
            &self.yarn_weight,
        )
    }
}

async fn status(State(state): State<Arc<SharedState>>) -> Json<StatusReport> {
    Json(state.app.status())
}

async fn yarn_types(State(state): State<Arc<SharedState>>) -> Json<Vec<String>> {
    Json(state.app.yarn_types())
}

async fn rank(
    State(state): State<Arc<SharedState>>,
    Json(payload): Json<MatchRequest>,
) -> Json<Vec<ScoredPattern>> {
    log::debug!("payload: {payload:?}");
    Json(state.app.rank(&payload.constraints()))
}

async fn refresh(
    State(state): State<Arc<SharedState>>,
) -> Result<Json<StatusReport>, HttpError> {
    state.app.refresh().await?;
    Ok(Json(state.app.status()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(json: &str) -> MatchRequest {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_match_request_amount_forms() {
        assert_eq!(request(r#"{"amount": 200}"#).amount(), Some(200));
        assert_eq!(request(r#"{"amount": 199.9}"#).amount(), Some(199));
        assert_eq!(request(r#"{"amount": "150g"}"#).amount(), Some(150));
        assert_eq!(request(r#"{"amount": "lots"}"#).amount(), None);
        assert_eq!(request(r#"{}"#).amount(), None);
    }

    #[test]
    fn test_match_request_normalizes_constraints() {
        let constraints = request(
            r#"{"amount": 200, "amountUnit": "m", "yarnType": " Wool ", "yarnWeight": "ARAN"}"#,
        )
        .constraints();
        assert_eq!(
            constraints,
            Constraints::new(Some(200), AmountUnit::Meters, "wool", "aran")
        );
    }
}
