//! Flow Catalog — the seven coaching flows, declared as data.
//!
//! `default_registry()` is called once at startup; the resulting registry is
//! frozen inside the executor and never mutated afterwards.

use crate::flows::prompts::{
    CAREER_PATHS_PROMPT, DIGITAL_TWIN_PROMPT, GUIDANCE_PROMPT, INTERVIEW_PROMPT,
    LEARNING_RECOMMENDATIONS_PROMPT, ORAL_FLUENCY_PROMPT, SKILL_GAP_PROMPT,
};
use crate::flows::registry::{FlowDefinition, FlowRegistry, RegistryError};
use crate::flows::schema::{Field, FieldKind, Schema};

pub const GENERATE_DIGITAL_TWIN: &str = "generateDigitalTwin";
pub const ANALYZE_SKILL_GAPS: &str = "analyzeSkillGaps";
pub const LEARNING_RECOMMENDATIONS: &str = "getPersonalizedLearningRecommendations";
pub const SIMULATE_CAREER_PATHS: &str = "simulateCareerPaths";
pub const AI_GUIDANCE: &str = "getAIGuidance";
pub const ORAL_FLUENCY_PROMPT_FLOW: &str = "getOralFluencyPrompt";
pub const SIMULATE_INTERVIEW: &str = "simulateInterview";

/// Builds a registry holding every catalog flow.
pub fn default_registry() -> Result<FlowRegistry, RegistryError> {
    let mut registry = FlowRegistry::new();
    for definition in definitions()? {
        registry.register(definition)?;
    }
    Ok(registry)
}

fn definitions() -> Result<Vec<FlowDefinition>, RegistryError> {
    Ok(vec![
        digital_twin()?,
        skill_gaps()?,
        learning_recommendations()?,
        career_paths()?,
        guidance()?,
        oral_fluency_prompt()?,
        interview()?,
    ])
}

fn digital_twin() -> Result<FlowDefinition, RegistryError> {
    FlowDefinition::new(
        GENERATE_DIGITAL_TWIN,
        "Summarises a user's skills and career status into a digital twin.",
        Schema::new(vec![
            Field::required(
                "skills",
                FieldKind::String,
                "Comma-separated list of the user's current skills.",
            ),
            Field::required(
                "careerStatus",
                FieldKind::String,
                "The user's education and job preferences.",
            ),
            Field::required("userId", FieldKind::String, "The ID of the user."),
        ]),
        Schema::new(vec![Field::required(
            "digitalTwinDescription",
            FieldKind::String,
            "An analytical markdown summary of the user's professional profile.",
        )]),
        DIGITAL_TWIN_PROMPT,
    )
}

fn skill_gaps() -> Result<FlowDefinition, RegistryError> {
    FlowDefinition::new(
        ANALYZE_SKILL_GAPS,
        "Compares a digital twin with a target role.",
        Schema::new(vec![
            Field::required(
                "digitalTwin",
                FieldKind::String,
                "The user's current skills and experience.",
            ),
            Field::required(
                "targetRole",
                FieldKind::String,
                "The role or skills the user is aiming for.",
            ),
        ]),
        Schema::new(vec![
            Field::required(
                "skillGaps",
                FieldKind::String,
                "The gaps between the digital twin and the target role.",
            ),
            Field::required(
                "recommendations",
                FieldKind::String,
                "How to close the skill gaps.",
            ),
        ]),
        SKILL_GAP_PROMPT,
    )
}

fn learning_recommendations() -> Result<FlowDefinition, RegistryError> {
    FlowDefinition::new(
        LEARNING_RECOMMENDATIONS,
        "Turns skill gaps and career paths into learning steps.",
        Schema::new(vec![
            Field::required(
                "skillGaps",
                FieldKind::String,
                "The skill gaps identified for the user.",
            ),
            Field::required(
                "careerPathSimulations",
                FieldKind::String,
                "The career paths the user is considering.",
            ),
            Field::optional(
                "userPreferences",
                FieldKind::String,
                "Learning preferences to filter and tone the output.",
            ),
        ]),
        Schema::new(vec![Field::required(
            "recommendations",
            FieldKind::StringArray,
            "Personalized learning recommendations, most important first.",
        )]),
        LEARNING_RECOMMENDATIONS_PROMPT,
    )
}

fn career_paths() -> Result<FlowDefinition, RegistryError> {
    FlowDefinition::new(
        SIMULATE_CAREER_PATHS,
        "Suggests roles and simulates career paths.",
        Schema::new(vec![
            Field::required(
                "userSkills",
                FieldKind::StringArray,
                "The user's current skills.",
            ),
            Field::required(
                "careerGoals",
                FieldKind::String,
                "The user's career goals and aspirations.",
            ),
        ]),
        Schema::new(vec![
            Field::required(
                "suggestedRoles",
                FieldKind::StringArray,
                "Roles suggested from the user's goals.",
            ),
            Field::required(
                "careerPathSimulations",
                FieldKind::StringArray,
                "Simulated career paths based on skill development.",
            ),
        ]),
        CAREER_PATHS_PROMPT,
    )
}

fn guidance() -> Result<FlowDefinition, RegistryError> {
    FlowDefinition::new(
        AI_GUIDANCE,
        "Answers a career question, personalized when a digital twin is supplied.",
        Schema::new(vec![
            Field::required(
                "query",
                FieldKind::String,
                "The user's career guidance question.",
            ),
            Field::optional(
                "digitalTwin",
                FieldKind::String,
                "The user's digital twin description.",
            ),
        ]),
        Schema::new(vec![Field::required(
            "response",
            FieldKind::String,
            "The assistant's answer to the query.",
        )]),
        GUIDANCE_PROMPT,
    )
}

fn oral_fluency_prompt() -> Result<FlowDefinition, RegistryError> {
    FlowDefinition::new(
        ORAL_FLUENCY_PROMPT_FLOW,
        "Produces a short question for oral fluency practice.",
        Schema::empty(),
        Schema::new(vec![Field::required(
            "prompt",
            FieldKind::String,
            "A question to test oral fluency.",
        )]),
        ORAL_FLUENCY_PROMPT,
    )
}

fn interview() -> Result<FlowDefinition, RegistryError> {
    FlowDefinition::new(
        SIMULATE_INTERVIEW,
        "Asks an interview question, or evaluates an answer when one is supplied.",
        Schema::new(vec![
            Field::required(
                "digitalTwin",
                FieldKind::String,
                "The user's full profile, including the digital twin description.",
            ),
            Field::required(
                "targetJob",
                FieldKind::String,
                "The target job role for the interview.",
            ),
            Field::required(
                "skill",
                FieldKind::String,
                "The specific skill to test.",
            ),
            Field::optional(
                "question",
                FieldKind::String,
                "The question previously asked, when submitting an answer.",
            ),
            Field::optional(
                "answer",
                FieldKind::String,
                "The user's spoken answer to the question.",
            ),
        ])
        .with_dependency("answer", "question"),
        Schema::new(vec![
            Field::required(
                "question",
                FieldKind::String,
                "The interview question (echoed back when evaluating).",
            ),
            Field::optional(
                "evaluation",
                FieldKind::String,
                "Feedback on the user's answer. Present only when an answer was supplied.",
            ),
        ]),
        INTERVIEW_PROMPT,
    )
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
