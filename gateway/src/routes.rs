//! REST handlers and router assembly

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    extract::{Path, Query, State},
    http::{HeaderValue, StatusCode},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use emitter_catalog::{
    recommend_countermeasures, Countermeasure, Emitter, EmitterFilter, NewEmitter, Provenance,
    Scenario,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use threat_sim::{threat_timeline, SignalUpdate, ThreatReport, TimelineEvent};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::chat::ChatContext;
use crate::config::CorsOrigins;
use crate::error::{ApiError, ApiResult};
use crate::realtime::FeedMessage;
use crate::realtime_routes::battlefield_ws;
use crate::sim_state::{AppState, MetricsSnapshot};

const SERVICE_NAME: &str = "EW Gateway";

/// Full application router: REST under `/api`, the live feed at
/// `/ws/battlefield`.
pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/emitters", get(list_emitters).post(create_emitter))
        .route("/emitters/:id", get(get_emitter).delete(delete_emitter))
        .route("/countermeasures", get(list_countermeasures))
        .route(
            "/countermeasures/recommend/:threat_type",
            get(recommend),
        )
        .route("/scenarios", get(list_scenarios))
        .route("/scenarios/:id", get(get_scenario))
        .route("/scenarios/:id/activate", post(activate_scenario))
        .route("/threats/assess", get(assess_threats))
        .route("/threats/timeline", get(timeline))
        .route("/signals/:id", get(signal_for_emitter))
        .route("/ai/chat", post(ai_chat))
        .route("/ai/analyze/:id", get(ai_analyze))
        .route("/metrics", get(metrics));

    let cors = cors_layer(&state.config.cors_origins);

    Router::new()
        .nest("/api", api)
        .route("/ws/battlefield", get(battlefield_ws))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origins: &CorsOrigins) -> CorsLayer {
    match origins {
        CorsOrigins::Any => CorsLayer::permissive(),
        CorsOrigins::List(list) => {
            let parsed: Vec<HeaderValue> = list
                .iter()
                .filter_map(|origin| match HeaderValue::from_str(origin) {
                    Ok(value) => Some(value),
                    Err(_) => {
                        warn!("Ignoring invalid CORS origin {:?}", origin);
                        None
                    }
                })
                .collect();
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(parsed))
                .allow_methods(Any)
                .allow_headers(Any)
        }
    }
}

// ============================================================================
// Service
// ============================================================================

async fn root() -> Json<Value> {
    Json(json!({
        "message": "EW Gateway - Electronic Warfare Decision Support",
        "status": "operational"
    }))
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": Utc::now(),
    }))
}

#[derive(Serialize)]
struct MetricsResponse {
    #[serde(flatten)]
    snapshot: MetricsSnapshot,
    timestamp: DateTime<Utc>,
}

async fn metrics(State(state): State<AppState>) -> Json<MetricsResponse> {
    Json(MetricsResponse {
        snapshot: state.snapshot(),
        timestamp: Utc::now(),
    })
}

// ============================================================================
// Emitters
// ============================================================================

async fn list_emitters(
    State(state): State<AppState>,
    filter: Result<Query<EmitterFilter>, QueryRejection>,
) -> ApiResult<Json<Vec<Emitter>>> {
    let Query(filter) = filter?;
    Ok(Json(state.store.list(&filter)))
}

async fn create_emitter(
    State(state): State<AppState>,
    payload: Result<Json<NewEmitter>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Emitter>)> {
    let Json(payload) = payload?;
    let emitter = payload.into_emitter(Provenance::Operator);
    emitter.validate()?;

    info!("Registered emitter {} ({})", emitter.name, emitter.id);
    state.store.insert(emitter.clone());
    Ok((StatusCode::CREATED, Json(emitter)))
}

async fn get_emitter(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Emitter>> {
    state
        .store
        .get(&id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Emitter not found".into()))
}

async fn delete_emitter(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    if !state.store.remove(&id) {
        return Err(ApiError::NotFound("Emitter not found".into()));
    }
    info!("Deleted emitter {}", id);
    Ok(Json(json!({ "message": "Emitter deleted" })))
}

// ============================================================================
// Countermeasures
// ============================================================================

fn countermeasure_library(state: &AppState) -> Vec<Countermeasure> {
    let stored = state.store.countermeasures();
    if stored.is_empty() {
        state.catalog.countermeasures().to_vec()
    } else {
        stored
    }
}

async fn list_countermeasures(State(state): State<AppState>) -> Json<Vec<Countermeasure>> {
    Json(countermeasure_library(&state))
}

#[derive(Serialize)]
struct Recommendations {
    threat_type: String,
    recommendations: Vec<Countermeasure>,
    timestamp: DateTime<Utc>,
}

async fn recommend(
    State(state): State<AppState>,
    Path(threat_type): Path<String>,
) -> Json<Recommendations> {
    let recommendations = recommend_countermeasures(&countermeasure_library(&state), &threat_type);
    Json(Recommendations {
        threat_type,
        recommendations,
        timestamp: Utc::now(),
    })
}

// ============================================================================
// Scenarios
// ============================================================================

async fn list_scenarios(State(state): State<AppState>) -> Json<Vec<Scenario>> {
    Json(state.catalog.scenarios().to_vec())
}

#[derive(Serialize)]
struct ScenarioDetail {
    #[serde(flatten)]
    scenario: Scenario,
    emitter_data: Vec<Emitter>,
    loaded_at: DateTime<Utc>,
}

async fn get_scenario(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ScenarioDetail>> {
    let scenario = state.catalog.scenario(&id)?;
    Ok(Json(ScenarioDetail {
        emitter_data: state.catalog.scenario_emitters(scenario),
        scenario: scenario.clone(),
        loaded_at: Utc::now(),
    }))
}

#[derive(Serialize)]
struct Activation {
    scenario_id: String,
    status: String,
    emitters_loaded: usize,
    subscribers_notified: usize,
    timestamp: DateTime<Utc>,
}

async fn activate_scenario(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Activation>> {
    let scenario = state.catalog.scenario(&id)?;
    let emitters_loaded = state
        .store
        .replace_simulation(&state.catalog.scenario_emitters(scenario));
    let timestamp = Utc::now();

    let report = state.subscribers.broadcast(FeedMessage::ScenarioActivated {
        scenario_id: scenario.id.clone(),
        emitters_loaded,
        timestamp,
    });

    info!(
        "Scenario {} activated: {} emitters, {} subscribers notified",
        scenario.id, emitters_loaded, report.delivered
    );

    Ok(Json(Activation {
        scenario_id: scenario.id.clone(),
        status: "activated".to_string(),
        emitters_loaded,
        subscribers_notified: report.delivered,
        timestamp,
    }))
}

// ============================================================================
// Threats & signals
// ============================================================================

async fn assess_threats(State(state): State<AppState>) -> ApiResult<Json<ThreatReport>> {
    let hostile = state.store.list(&EmitterFilter::hostile());
    let mut rng = state.rng.next_rng();

    let assessments = hostile
        .iter()
        .map(|emitter| state.scorer.assess(emitter, &mut rng))
        .collect::<Result<Vec<_>, _>>()?;
    state.metrics.record_assessments(assessments.len());

    Ok(Json(ThreatReport::from_assessments(assessments)))
}

#[derive(Serialize)]
struct Timeline {
    timeline: Vec<TimelineEvent>,
}

async fn timeline() -> Json<Timeline> {
    Json(Timeline {
        timeline: threat_timeline(Utc::now()),
    })
}

async fn signal_for_emitter(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<SignalUpdate>> {
    let emitter = state
        .store
        .get(&id)
        .ok_or_else(|| ApiError::NotFound("Emitter not found".into()))?;
    let mut rng = state.rng.next_rng();
    Ok(Json(state.generator.observe(&emitter, &mut rng)?))
}

// ============================================================================
// AI assistant
// ============================================================================

#[derive(Deserialize)]
struct ChatRequest {
    message: String,
}

#[derive(Serialize)]
struct ChatReply {
    response: String,
    context: ChatContext,
}

async fn ai_chat(
    State(state): State<AppState>,
    request: Result<Json<ChatRequest>, JsonRejection>,
) -> ApiResult<Json<ChatReply>> {
    let Json(request) = request?;
    if request.message.trim().is_empty() {
        return Err(ApiError::BadRequest("message must not be empty".into()));
    }

    let context = ChatContext::from_emitters(&state.store.list(&EmitterFilter::default()));
    let response = state.chat.complete(&request.message, Some(&context)).await;
    Ok(Json(ChatReply { response, context }))
}

#[derive(Serialize)]
struct Analysis {
    emitter_id: String,
    emitter_name: String,
    analysis: String,
    timestamp: DateTime<Utc>,
}

async fn ai_analyze(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Analysis>> {
    let emitter = state
        .store
        .get(&id)
        .ok_or_else(|| ApiError::NotFound("Emitter not found".into()))?;

    let query = format!(
        "Analyze this emitter and give a tactical assessment.\n\
         Name: {}\nType: {}\nOrigin: {}\nFrequency: {}-{} MHz\nPlatform: {}\nThreat level: {}\n\n\
         Cover: threat assessment, likely mission, recommended countermeasures, kill chain position.",
        emitter.name,
        emitter.emitter_type,
        emitter.origin,
        emitter.frequency_min,
        emitter.frequency_max,
        emitter.platform,
        emitter.threat_level,
    );
    let analysis = state.chat.complete(&query, None).await;

    Ok(Json(Analysis {
        emitter_id: emitter.id,
        emitter_name: emitter.name,
        analysis,
        timestamp: Utc::now(),
    }))
}
