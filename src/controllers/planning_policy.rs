/*
 * src/controllers/planning_policy.rs
 *
 * File for Planning Policy Controller API Endpoints
 *
 * Purpose:
 *   Serve the deterministic itinerary-planning engine (policy compilation, day scheduling,
 *   robustness evaluation, the What-If Engine, and the Replanner) over HTTP.
 */

use axum::{
    Extension, Json,
    extract::Path,
    routing::{get, post},
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;
use utoipa::OpenApi;

use crate::collaborators::PlacesClient;
use crate::controllers::AxumRouter;
use crate::error::{AppError, ApiResult, DataEnvelope, ok};
use crate::http_models::planning_policy::*;
use crate::models::poi::Poi;
use crate::models::schedule::DaySchedule;
use crate::planning::policy::compile_policy;
use crate::planning::replan::{replan_day, ReplanRequest};
use crate::planning::robustness::evaluate_day_robustness;
use crate::planning::rng::seed_for_candidate;
use crate::planning::scheduler::{schedule_day, DayRequest};
use crate::planning::whatif::evaluate_what_if;
use crate::state::AppState;

async fn resolve_pois(source: &PoiSource, places: &dyn PlacesClient) -> ApiResult<HashMap<String, Poi>> {
    source.validate().map_err(AppError::validation)?;
    if let Some(pois) = &source.pois {
        return Ok(pois.clone());
    }
    let ids = source.place_ids.clone().unwrap_or_default();
    let facts = places.get_poi_facts(&ids).await;
    serde_json::from_value::<HashMap<String, Poi>>(facts).map_err(|_| {
        AppError::validation(
            "place_ids could not be resolved to POI facts by the configured places collaborator",
        )
    })
}

/// Compile traveler/context/trip-type inputs into a full planning [`crate::models::policy::Policy`].
///
/// # Method
/// `POST /api/planning-policy/policy/compile`
#[utoipa::path(post, path = "/compile", request_body = CompilePolicyRequest, responses((status = 200, body = CompilePolicyResponse)))]
async fn api_compile_policy(Json(payload): Json<CompilePolicyRequest>) -> ApiResult<Json<DataEnvelope<CompilePolicyResponse>>> {
    info!("HANDLER ->> /api/planning-policy/policy/compile");
    if payload.travelers.is_empty() {
        return Err(AppError::validation("travelers must not be empty"));
    }
    let policy = compile_policy(
        &payload.travelers,
        payload.context,
        payload.trip_type,
        payload.budget_per_person_per_day,
    );
    Ok(ok(CompilePolicyResponse { policy }))
}

/// Build a single day's itinerary with the greedy, fatigue-aware Day Scheduler.
///
/// # Method
/// `POST /api/planning-policy/schedule/day`
#[utoipa::path(post, path = "/day", request_body = ScheduleDayRequest, responses((status = 200, body = ScheduleDayResponse)))]
async fn api_schedule_day(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<ScheduleDayRequest>,
) -> ApiResult<Json<DataEnvelope<ScheduleDayResponse>>> {
    info!("HANDLER ->> /api/planning-policy/schedule/day");
    if payload.start_min >= payload.end_min {
        return Err(AppError::validation("start_min must be less than end_min"));
    }
    let mut req = DayRequest::new(payload.date_ctx, payload.start_min, payload.end_min, payload.start_location);
    req.pois = payload.pois;
    req.rest_stops = payload.rest_stops;
    req.must_see_poi_ids = payload.must_see_poi_ids.into_iter().collect();
    req.buffer_min = payload.buffer_min;
    req.initial_hp = payload.initial_hp;

    let schedule = schedule_day(&payload.policy, req, state.transit.as_ref()).await;
    Ok(ok(ScheduleDayResponse { schedule }))
}

/// Run the Monte Carlo Robustness Evaluator over a proposed day.
///
/// # Method
/// `POST /api/planning-policy/robustness/evaluate-day`
#[utoipa::path(post, path = "/evaluate-day", request_body = EvaluateDayRequest, responses((status = 200, body = crate::models::robustness::RobustnessReport)))]
async fn api_evaluate_day(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<EvaluateDayRequest>,
) -> ApiResult<Json<DataEnvelope<crate::models::robustness::RobustnessReport>>> {
    info!("HANDLER ->> /api/planning-policy/robustness/evaluate-day");
    let pois = resolve_pois(&payload.poi_source, state.places.as_ref()).await?;
    let config = payload.config.map(|c| c.resolve()).unwrap_or_default();
    let report = evaluate_day_robustness(&payload.policy, &payload.schedule, payload.day_end_min, payload.date_ctx, &pois, config);
    Ok(ok(report))
}

/// Derive, re-evaluate, and rank perturbed candidate schedules for a day (the What-If Engine).
///
/// # Method
/// `POST /api/planning-policy/what-if/evaluate`
#[utoipa::path(post, path = "/evaluate", request_body = WhatIfEvaluateRequest, responses((status = 200, body = WhatIfEvaluateResponse)))]
async fn api_what_if_evaluate(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<WhatIfEvaluateRequest>,
) -> ApiResult<Json<DataEnvelope<WhatIfEvaluateResponse>>> {
    info!("HANDLER ->> /api/planning-policy/what-if/evaluate");
    let pois = resolve_pois(&payload.poi_source, state.places.as_ref()).await?;
    let budget = payload.budget.map(|b| b.resolve()).unwrap_or_default();
    let report = evaluate_what_if(
        &payload.policy,
        &payload.base_schedule,
        payload.day_end_min,
        payload.date_ctx,
        &pois,
        &payload.suggestions,
        payload.base_seed,
        budget,
    );
    Ok(ok(WhatIfEvaluateResponse { report }))
}

/// Re-run the What-If Engine, e.g. after new suggestions or a larger confirm sample budget.
///
/// Shares its implementation with `what-if/evaluate`: the endpoint exists as a distinct route
/// because callers treat "first look" and "re-evaluate after a user tweak" as separate steps,
/// but both resolve to the same core evaluation.
///
/// # Method
/// `POST /api/planning-policy/what-if/re-evaluate`
#[utoipa::path(post, path = "/re-evaluate", request_body = WhatIfEvaluateRequest, responses((status = 200, body = WhatIfEvaluateResponse)))]
async fn api_what_if_re_evaluate(
    state: Extension<Arc<AppState>>,
    payload: Json<WhatIfEvaluateRequest>,
) -> ApiResult<Json<DataEnvelope<WhatIfEvaluateResponse>>> {
    api_what_if_evaluate(state, payload).await
}

/// Return only the candidate list and winner id from a What-If evaluation.
///
/// `generate-candidates` and `evaluate-candidates` both run the same `evaluate_what_if` core
/// and slice its output, since the underlying engine only exposes candidate generation fused
/// with evaluation (its internal `generate_raw_candidates` step is not separately callable).
///
/// # Method
/// `POST /api/planning-policy/what-if/generate-candidates`
#[utoipa::path(post, path = "/generate-candidates", request_body = WhatIfEvaluateRequest, responses((status = 200, body = WhatIfCandidatesResponse)))]
async fn api_what_if_generate_candidates(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<WhatIfEvaluateRequest>,
) -> ApiResult<Json<DataEnvelope<WhatIfCandidatesResponse>>> {
    info!("HANDLER ->> /api/planning-policy/what-if/generate-candidates");
    let pois = resolve_pois(&payload.poi_source, state.places.as_ref()).await?;
    let budget = payload.budget.map(|b| b.resolve()).unwrap_or_default();
    let report = evaluate_what_if(
        &payload.policy,
        &payload.base_schedule,
        payload.day_end_min,
        payload.date_ctx,
        &pois,
        &payload.suggestions,
        payload.base_seed,
        budget,
    );
    Ok(ok(WhatIfCandidatesResponse {
        candidates: report.candidates,
        winner_candidate_id: report.winner_candidate_id,
    }))
}

/// Identical response shape to `generate-candidates`; kept as a separate route so a caller can
/// ask for "evaluate the candidates I already generated" without re-reading the naming as a
/// generation step.
///
/// # Method
/// `POST /api/planning-policy/what-if/evaluate-candidates`
#[utoipa::path(post, path = "/evaluate-candidates", request_body = WhatIfEvaluateRequest, responses((status = 200, body = WhatIfCandidatesResponse)))]
async fn api_what_if_evaluate_candidates(
    state: Extension<Arc<AppState>>,
    payload: Json<WhatIfEvaluateRequest>,
) -> ApiResult<Json<DataEnvelope<WhatIfCandidatesResponse>>> {
    api_what_if_generate_candidates(state, payload).await
}

/// Surface just the winner's risk warning from an already-computed What-If report.
///
/// # Method
/// `POST /api/planning-policy/what-if/risk-warning`
#[utoipa::path(post, path = "/risk-warning", request_body = RiskWarningRequest, responses((status = 200, body = RiskWarningResponse)))]
async fn api_what_if_risk_warning(Json(payload): Json<RiskWarningRequest>) -> ApiResult<Json<DataEnvelope<RiskWarningResponse>>> {
    info!("HANDLER ->> /api/planning-policy/what-if/risk-warning");
    Ok(ok(RiskWarningResponse {
        winner_candidate_id: payload.report.winner_candidate_id,
        risk_warning: payload.report.risk_warning,
    }))
}

/// Persist the winning What-If candidate's schedule to the trip store.
///
/// # Method
/// `POST /api/planning-policy/what-if/apply`
#[utoipa::path(post, path = "/apply", request_body = WhatIfApplyRequest, responses((status = 200, body = WhatIfApplyResponse)))]
async fn api_what_if_apply(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<WhatIfApplyRequest>,
) -> ApiResult<Json<DataEnvelope<WhatIfApplyResponse>>> {
    info!("HANDLER ->> /api/planning-policy/what-if/apply");
    let schedule: DaySchedule = payload
        .report
        .candidates
        .into_iter()
        .find(|c| c.candidate_id == payload.candidate_id)
        .map(|c| c.schedule)
        .ok_or_else(|| AppError::not_found(format!("no candidate with id {}", payload.candidate_id)))?;

    state
        .trips
        .persist_plan(&payload.trip_id, schedule.stops.clone())
        .await
        .map_err(AppError::internal)?;

    Ok(ok(WhatIfApplyResponse { success: true, schedule }))
}

/// Look up the deterministic per-candidate PRNG seed derived from a base seed and candidate id.
///
/// # Method
/// `GET /api/planning-policy/seed-for-candidate/{baseSeed}/{candidateId}`
#[utoipa::path(get, path = "/seed-for-candidate/{base_seed}/{candidate_id}", responses((status = 200, body = SeedForCandidateResponse)))]
async fn api_seed_for_candidate(Path((base_seed, candidate_id)): Path<(u32, String)>) -> ApiResult<Json<DataEnvelope<SeedForCandidateResponse>>> {
    info!("HANDLER ->> /api/planning-policy/seed-for-candidate/{base_seed}/{candidate_id}");
    let seed = seed_for_candidate(base_seed, &candidate_id);
    Ok(ok(SeedForCandidateResponse { seed }))
}

/// Repair a day's remaining schedule around a disruption event under an explicit change budget.
///
/// # Method
/// `POST /api/planning-policy/replan`
#[utoipa::path(post, path = "/replan", request_body = ReplanRequestBody, responses((status = 200, body = crate::models::whatif::ReplanResult)))]
async fn api_replan(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<ReplanRequestBody>,
) -> ApiResult<Json<DataEnvelope<crate::models::whatif::ReplanResult>>> {
    info!("HANDLER ->> /api/planning-policy/replan");
    let mut req = ReplanRequest::new(
        payload.now_min,
        payload.current_location,
        payload.previous_schedule,
        payload.fresh_pois,
        payload.event,
        payload.date_ctx,
        payload.day_end_min,
    );
    req.rest_stops = payload.rest_stops;
    req.pinned_poi_ids = payload.pinned_poi_ids;
    if let Some(budget) = payload.change_budget {
        req.change_budget = budget;
    }
    if let Some(lock_window) = payload.lock_window_min {
        req.lock_window_min = lock_window;
    }

    let result = replan_day(&payload.policy, req, state.transit.as_ref()).await;
    Ok(ok(result))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        api_compile_policy,
        api_schedule_day,
        api_evaluate_day,
        api_what_if_evaluate,
        api_what_if_re_evaluate,
        api_what_if_generate_candidates,
        api_what_if_evaluate_candidates,
        api_what_if_risk_warning,
        api_what_if_apply,
        api_seed_for_candidate,
        api_replan,
    ),
    info(title = "Planning Policy Routes", description = "Itinerary-planning core: policy compilation, day scheduling, robustness evaluation, what-if exploration, and replanning."),
    tags((name = "PlanningPolicy"))
)]
pub struct PlanningPolicyApiDoc;

/// Assemble the planning-policy routes under their shared prefix.
///
/// # Routes
/// - `POST /policy/compile`
/// - `POST /schedule/day`
/// - `POST /robustness/evaluate-day`
/// - `POST /what-if/evaluate`
/// - `POST /what-if/re-evaluate`
/// - `POST /what-if/generate-candidates`
/// - `POST /what-if/evaluate-candidates`
/// - `POST /what-if/risk-warning`
/// - `POST /what-if/apply`
/// - `GET /seed-for-candidate/{baseSeed}/{candidateId}`
/// - `POST /replan`
pub fn planning_policy_routes() -> AxumRouter {
    AxumRouter::new()
        .route("/policy/compile", post(api_compile_policy))
        .route("/schedule/day", post(api_schedule_day))
        .route("/robustness/evaluate-day", post(api_evaluate_day))
        .route("/what-if/evaluate", post(api_what_if_evaluate))
        .route("/what-if/re-evaluate", post(api_what_if_re_evaluate))
        .route("/what-if/generate-candidates", post(api_what_if_generate_candidates))
        .route("/what-if/evaluate-candidates", post(api_what_if_evaluate_candidates))
        .route("/what-if/risk-warning", post(api_what_if_risk_warning))
        .route("/what-if/apply", post(api_what_if_apply))
        .route("/seed-for-candidate/{base_seed}/{candidate_id}", get(api_seed_for_candidate))
        .route("/replan", post(api_replan))
}
