//! Servidor web Axum com endpoints JSON para parsing e score de endereços

mod config;
mod error;

use std::sync::Arc;

use addrmatch_core::pipeline::best_index;
use addrmatch_core::{AddressComponents, EngineKind, MatchPipeline, ScoreBreakdown};
use axum::{
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::WebConfig;
use crate::error::ApiError;

/// Estado compartilhado da aplicação
struct AppState {
    pipeline: MatchPipeline,
    /// Limite por endereço; o custo do score cresce com o tamanho da entrada
    max_input_chars: usize,
}

#[derive(Deserialize)]
struct ParseRequest {
    address: String,
}

#[derive(Deserialize)]
struct PairRequest {
    a: String,
    b: String,
}

#[derive(Deserialize)]
struct BestMatchRequest {
    query: String,
    #[serde(default)]
    candidates: Vec<String>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    engine: EngineKind,
}

#[derive(Serialize)]
struct ScoreResponse {
    score: f64,
    engine: EngineKind,
}

#[derive(Serialize)]
struct BestMatchResponse {
    best: Option<String>,
    score: Option<f64>,
    scores: Vec<f64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = WebConfig::from_env()?;
    let pipeline = config.build_pipeline()?;
    info!(engine = %pipeline.engine_kind(), "pipeline ready");

    let state = Arc::new(AppState {
        pipeline,
        max_input_chars: config.max_input_chars,
    });
    let app = app(state);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    info!("🚀 Servidor addrmatch iniciado em http://{}", config.addr);
    axum::serve(listener, app).await?;
    Ok(())
}

fn app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/parse", post(parse_handler))
        .route("/score", post(score_handler))
        .route("/explain", post(explain_handler))
        .route("/best-match", post(best_match_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn require(field: &str, value: &str, max_chars: usize) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::InvalidRequest(format!("{field} must not be blank")));
    }
    let length = value.chars().count();
    if length > max_chars {
        return Err(ApiError::InvalidRequest(format!(
            "{field} is too long: {length} chars (max {max_chars})"
        )));
    }
    Ok(())
}

async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        engine: state.pipeline.engine_kind(),
    })
}

/// Componentes estruturados de um endereço
async fn parse_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ParseRequest>,
) -> Result<Json<AddressComponents>, ApiError> {
    require("address", &req.address, state.max_input_chars)?;

    // O colaborador é síncrono: roda fora do runtime
    let components =
        tokio::task::spawn_blocking(move || state.pipeline.parse(&req.address)).await?;
    Ok(Json(components))
}

async fn score_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PairRequest>,
) -> Result<Json<ScoreResponse>, ApiError> {
    require("a", &req.a, state.max_input_chars)?;
    require("b", &req.b, state.max_input_chars)?;

    let response = tokio::task::spawn_blocking(move || ScoreResponse {
        score: state.pipeline.score(&req.a, &req.b),
        engine: state.pipeline.engine_kind(),
    })
    .await?;
    Ok(Json(response))
}

/// Decomposição do score (422 se o motor não sabe explicar ou o colaborador falhou)
async fn explain_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PairRequest>,
) -> Result<Json<ScoreBreakdown>, ApiError> {
    require("a", &req.a, state.max_input_chars)?;
    require("b", &req.b, state.max_input_chars)?;

    let breakdown =
        tokio::task::spawn_blocking(move || state.pipeline.explain(&req.a, &req.b)).await??;
    Ok(Json(breakdown))
}

async fn best_match_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BestMatchRequest>,
) -> Result<Json<BestMatchResponse>, ApiError> {
    require("query", &req.query, state.max_input_chars)?;
    for candidate in &req.candidates {
        require("candidate", candidate, state.max_input_chars)?;
    }

    let response = tokio::task::spawn_blocking(move || {
        let scores = state.pipeline.score_candidates(&req.query, &req.candidates);
        let best = best_index(&scores);
        BestMatchResponse {
            best: best.map(|(index, _)| req.candidates[index].clone()),
            score: best.map(|(_, score)| score),
            scores,
        }
    })
    .await?;
    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use addrmatch_core::{CountryAliasTable, SimilarityEngine};

    use super::*;
    use crate::config::DEFAULT_MAX_INPUT_CHARS;

    fn hybrid_app() -> Router {
        app(Arc::new(AppState {
            pipeline: MatchPipeline::default(),
            max_input_chars: DEFAULT_MAX_INPUT_CHARS,
        }))
    }

    fn baseline_app() -> Router {
        app(Arc::new(AppState {
            pipeline: MatchPipeline::new(SimilarityEngine::baseline(), CountryAliasTable::builtin()),
            max_input_chars: DEFAULT_MAX_INPUT_CHARS,
        }))
    }

    async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let response = baseline_app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["engine"], "baseline");
    }

    #[tokio::test]
    async fn test_parse() {
        let (status, json) = post_json(
            hybrid_app(),
            "/parse",
            serde_json::json!({"address": "Hauptstrasse 5, 10115 Berlin, Germany"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["country"], "Germany");
        assert_eq!(json["postal_code"], "10115");
        assert_eq!(json["house_number"], "5");
    }

    #[tokio::test]
    async fn test_score_identical() {
        let (status, json) = post_json(
            hybrid_app(),
            "/score",
            serde_json::json!({"a": "Damrak 1, Amsterdam", "b": "Damrak 1, Amsterdam"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(json["score"].as_f64().unwrap() >= 0.92);
        assert_eq!(json["engine"], "hybrid");
    }

    #[tokio::test]
    async fn test_blank_input_rejected() {
        let (status, json) =
            post_json(hybrid_app(), "/score", serde_json::json!({"a": "  ", "b": "Damrak"})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().contains("a must not be blank"));
    }

    #[tokio::test]
    async fn test_explain_requires_hybrid() {
        let body = serde_json::json!({"a": "Damrak 1", "b": "Damrak 2"});
        let (status, _) = post_json(baseline_app(), "/explain", body.clone()).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, json) = post_json(hybrid_app(), "/explain", body).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["house_match"], false);
    }

    #[tokio::test]
    async fn test_best_match() {
        let (status, json) = post_json(
            hybrid_app(),
            "/best-match",
            serde_json::json!({
                "query": "10 Main St",
                "candidates": ["10 Main St, City A", "11 Main St, City A"]
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["best"], "10 Main St, City A");
        assert_eq!(json["scores"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_best_match_empty_candidates() {
        let (status, json) = post_json(
            baseline_app(),
            "/best-match",
            serde_json::json!({"query": "10 Main St", "candidates": []}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(json["best"].is_null());
        assert!(json["score"].is_null());
    }

    #[tokio::test]
    async fn test_oversized_input_rejected() {
        let long = "Kalverstraat 92, Amsterdam; ".repeat(100);
        let (status, json) = post_json(
            hybrid_app(),
            "/score",
            serde_json::json!({"a": long.clone(), "b": "Kalverstraat 92, Amsterdam"}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().contains("a is too long"));

        let (status, _) = post_json(
            baseline_app(),
            "/best-match",
            serde_json::json!({"query": "Damrak 1", "candidates": ["Damrak 2", long]}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_input_at_limit_accepted() {
        let exact = "a".repeat(DEFAULT_MAX_INPUT_CHARS);
        let (status, _) =
            post_json(baseline_app(), "/score", serde_json::json!({"a": exact, "b": "a"})).await;
        assert_eq!(status, StatusCode::OK);
    }
}
