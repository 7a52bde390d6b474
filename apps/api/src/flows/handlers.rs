//! Axum route handlers for the Flow API and the coaching endpoints.

use axum::{
    body::Bytes,
    extract::{FromRequest, Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::AppError;
use crate::flows::coaching::{self, LearningPlan};
use crate::flows::contracts::{DigitalTwinResponse, GuidanceResponse, InterviewResponse};
use crate::models::profile::UserProfile;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowSummary {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
    pub output_schema: Value,
}

#[derive(Debug, Serialize)]
pub struct FlowListResponse {
    pub flows: Vec<FlowSummary>,
}

/// `Json` extractor whose rejection renders as an `AppError` body.
#[derive(FromRequest)]
#[from_request(via(Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DigitalTwinBody {
    pub user_id: String,
    pub profile: UserProfile,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningPlanBody {
    pub digital_twin: String,
    pub target_role: String,
    #[serde(default)]
    pub user_preferences: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GuidanceBody {
    #[serde(default)]
    pub profile: Option<UserProfile>,
    pub query: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewBody {
    pub profile: UserProfile,
    pub target_job: String,
    pub skill: String,
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub answer: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Flow API
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/flows
pub async fn handle_list_flows(State(state): State<AppState>) -> Json<FlowListResponse> {
    let flows = state
        .executor
        .flow_names()
        .into_iter()
        .filter_map(|name| state.executor.definition(name))
        .map(|def| FlowSummary {
            name: def.name,
            description: def.description,
            input_schema: def.input_schema.to_json_schema(),
            output_schema: def.output_schema.to_json_schema(),
        })
        .collect();
    Json(FlowListResponse { flows })
}

/// POST /api/v1/flows/:name
///
/// Runs a flow with the raw JSON body as input. An empty body means `{}`.
pub async fn handle_run_flow(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: Bytes,
) -> Result<Json<Map<String, Value>>, AppError> {
    let input = parse_flow_input(&body)?;
    let output = state.executor.run(&name, &input).await?;
    Ok(Json(output))
}

fn parse_flow_input(body: &[u8]) -> Result<Value, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Map::new()));
    }
    serde_json::from_slice(body)
        .map_err(|e| AppError::Validation(format!("request body is not valid JSON: {e}")))
}

// ────────────────────────────────────────────────────────────────────────────
// Coaching endpoints
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/coach/digital-twin
pub async fn handle_digital_twin(
    State(state): State<AppState>,
    AppJson(body): AppJson<DigitalTwinBody>,
) -> Result<Json<DigitalTwinResponse>, AppError> {
    let twin = coaching::digital_twin_for_profile(&state.executor, &body.user_id, &body.profile)
        .await?;
    Ok(Json(twin))
}

/// POST /api/v1/coach/learning-plan
pub async fn handle_learning_plan(
    State(state): State<AppState>,
    AppJson(body): AppJson<LearningPlanBody>,
) -> Result<Json<LearningPlan>, AppError> {
    let plan = coaching::learning_plan(
        &state.executor,
        &body.digital_twin,
        &body.target_role,
        body.user_preferences,
    )
    .await?;
    Ok(Json(plan))
}

/// POST /api/v1/coach/guidance
pub async fn handle_guidance(
    State(state): State<AppState>,
    AppJson(body): AppJson<GuidanceBody>,
) -> Result<Json<GuidanceResponse>, AppError> {
    let response =
        coaching::guidance_for_profile(&state.executor, body.profile.as_ref(), &body.query)
            .await?;
    Ok(Json(response))
}

/// POST /api/v1/coach/interview
///
/// With `question` and `answer` the answer is evaluated; with neither a new
/// question is generated. An answer without its question is rejected.
pub async fn handle_interview(
    State(state): State<AppState>,
    AppJson(body): AppJson<InterviewBody>,
) -> Result<Json<InterviewResponse>, AppError> {
    let response = match (body.question, body.answer) {
        (Some(question), Some(answer)) => {
            coaching::evaluate_interview_answer(
                &state.executor,
                &body.profile,
                &body.target_job,
                &body.skill,
                &question,
                &answer,
            )
            .await?
        }
        (None, Some(_)) => {
            return Err(AppError::Validation(
                "answer: required 'question' is missing".to_string(),
            ))
        }
        (_, None) => {
            coaching::interview_question(
                &state.executor,
                &body.profile,
                &body.target_job,
                &body.skill,
            )
            .await?
        }
    };
    Ok(Json(response))
}
