//! Typed request/response contracts for the catalog flows.
//!
//! Each request type names its flow; `call()` serializes it into the flow's
//! value bag, runs the executor, and decodes the validated output.

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::flows::catalog::{
    AI_GUIDANCE, ANALYZE_SKILL_GAPS, GENERATE_DIGITAL_TWIN, LEARNING_RECOMMENDATIONS,
    ORAL_FLUENCY_PROMPT_FLOW, SIMULATE_CAREER_PATHS, SIMULATE_INTERVIEW,
};
use crate::flows::registry::{FlowError, FlowExecutor};

/// Binds a request type to a flow name and its response type.
pub trait FlowContract: Serialize {
    const FLOW: &'static str;
    type Response: DeserializeOwned;
}

pub async fn call<R: FlowContract>(
    executor: &FlowExecutor,
    request: &R,
) -> Result<R::Response, FlowError> {
    let input = serde_json::to_value(request)?;
    let output = executor.run(R::FLOW, &input).await?;
    Ok(serde_json::from_value(serde_json::Value::Object(output))?)
}

// ────────────────────────────────────────────────────────────────────────────
// Digital twin
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DigitalTwinRequest {
    /// Comma-separated skill list.
    pub skills: String,
    pub career_status: String,
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DigitalTwinResponse {
    pub digital_twin_description: String,
}

impl FlowContract for DigitalTwinRequest {
    const FLOW: &'static str = GENERATE_DIGITAL_TWIN;
    type Response = DigitalTwinResponse;
}

// ────────────────────────────────────────────────────────────────────────────
// Skill gaps & learning
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillGapRequest {
    pub digital_twin: String,
    pub target_role: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillGapResponse {
    pub skill_gaps: String,
    pub recommendations: String,
}

impl FlowContract for SkillGapRequest {
    const FLOW: &'static str = ANALYZE_SKILL_GAPS;
    type Response = SkillGapResponse;
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningRecommendationsRequest {
    pub skill_gaps: String,
    pub career_path_simulations: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_preferences: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningRecommendationsResponse {
    pub recommendations: Vec<String>,
}

impl FlowContract for LearningRecommendationsRequest {
    const FLOW: &'static str = LEARNING_RECOMMENDATIONS;
    type Response = LearningRecommendationsResponse;
}

// ────────────────────────────────────────────────────────────────────────────
// Career paths
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CareerPathRequest {
    pub user_skills: Vec<String>,
    pub career_goals: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CareerPathResponse {
    pub suggested_roles: Vec<String>,
    pub career_path_simulations: Vec<String>,
}

impl FlowContract for CareerPathRequest {
    const FLOW: &'static str = SIMULATE_CAREER_PATHS;
    type Response = CareerPathResponse;
}

// ────────────────────────────────────────────────────────────────────────────
// Guidance & oral fluency
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuidanceRequest {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digital_twin: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuidanceResponse {
    pub response: String,
}

impl FlowContract for GuidanceRequest {
    const FLOW: &'static str = AI_GUIDANCE;
    type Response = GuidanceResponse;
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct OralFluencyPromptRequest {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OralFluencyPromptResponse {
    pub prompt: String,
}

impl FlowContract for OralFluencyPromptRequest {
    const FLOW: &'static str = ORAL_FLUENCY_PROMPT_FLOW;
    type Response = OralFluencyPromptResponse;
}

// ────────────────────────────────────────────────────────────────────────────
// Interview
// ────────────────────────────────────────────────────────────────────────────

/// Who is being interviewed, for what, on which skill.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewTopic {
    pub digital_twin: String,
    pub target_job: String,
    pub skill: String,
}

/// The two interview modes as distinct variants: an evaluation cannot be
/// built without both the question and the answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum InterviewRequest {
    Question(InterviewTopic),
    Evaluation {
        #[serde(flatten)]
        topic: InterviewTopic,
        question: String,
        answer: String,
    },
}

impl InterviewRequest {
    pub fn is_evaluation(&self) -> bool {
        matches!(self, InterviewRequest::Evaluation { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterviewResponse {
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluation: Option<String>,
}

impl FlowContract for InterviewRequest {
    const FLOW: &'static str = SIMULATE_INTERVIEW;
    type Response = InterviewResponse;
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
