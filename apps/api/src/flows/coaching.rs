//! Coaching compositions: profile-aware wrappers that chain catalog flows
//! the way the product screens use them.

use serde::Serialize;
use tracing::info;

use crate::flows::contracts::{
    call, DigitalTwinRequest, DigitalTwinResponse, GuidanceRequest, GuidanceResponse,
    InterviewRequest, InterviewResponse, InterviewTopic, LearningRecommendationsRequest,
    SkillGapRequest, SkillGapResponse,
};
use crate::flows::registry::{FlowError, FlowExecutor};
use crate::flows::schema::ValidationErrors;
use crate::models::profile::UserProfile;

/// Output of the two-step learning plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningPlan {
    pub skill_gaps: String,
    pub gap_recommendations: String,
    pub learning_steps: Vec<String>,
}

/// Builds the digital twin for a stored profile.
pub async fn digital_twin_for_profile(
    executor: &FlowExecutor,
    user_id: &str,
    profile: &UserProfile,
) -> Result<DigitalTwinResponse, FlowError> {
    let request = DigitalTwinRequest {
        skills: profile.skills_line(),
        career_status: profile.career_status(),
        user_id: user_id.to_string(),
    };
    let twin = call(executor, &request).await?;
    info!("digital twin generated for user {}", user_id);
    Ok(twin)
}

/// Skill-gap analysis followed by personalized learning steps. The gap
/// analysis recommendations feed the second step as career path context.
pub async fn learning_plan(
    executor: &FlowExecutor,
    digital_twin: &str,
    target_role: &str,
    user_preferences: Option<String>,
) -> Result<LearningPlan, FlowError> {
    let SkillGapResponse {
        skill_gaps,
        recommendations,
    } = call(
        executor,
        &SkillGapRequest {
            digital_twin: digital_twin.to_string(),
            target_role: target_role.to_string(),
        },
    )
    .await?;

    let learning = call(
        executor,
        &LearningRecommendationsRequest {
            skill_gaps: skill_gaps.clone(),
            career_path_simulations: recommendations.clone(),
            user_preferences: user_preferences.filter(|p| !p.trim().is_empty()),
        },
    )
    .await?;

    Ok(LearningPlan {
        skill_gaps,
        gap_recommendations: recommendations,
        learning_steps: learning.recommendations,
    })
}

/// Answers a guidance query, personalized when the profile carries a twin.
pub async fn guidance_for_profile(
    executor: &FlowExecutor,
    profile: Option<&UserProfile>,
    query: &str,
) -> Result<GuidanceResponse, FlowError> {
    let digital_twin = profile
        .and_then(|p| p.digital_twin_description.clone())
        .filter(|d| !d.trim().is_empty());
    call(
        executor,
        &GuidanceRequest {
            query: query.to_string(),
            digital_twin,
        },
    )
    .await
}

pub async fn interview_question(
    executor: &FlowExecutor,
    profile: &UserProfile,
    target_job: &str,
    skill: &str,
) -> Result<InterviewResponse, FlowError> {
    let topic = interview_topic(profile, target_job, skill)?;
    call(executor, &InterviewRequest::Question(topic)).await
}

/// Evaluates a spoken answer. A blank transcript is rejected before any model call.
pub async fn evaluate_interview_answer(
    executor: &FlowExecutor,
    profile: &UserProfile,
    target_job: &str,
    skill: &str,
    question: &str,
    transcript: &str,
) -> Result<InterviewResponse, FlowError> {
    let answer = transcript.trim();
    if answer.is_empty() {
        return Err(FlowError::InputInvalid(ValidationErrors::single(
            "answer",
            "transcript is empty",
        )));
    }
    let request = InterviewRequest::Evaluation {
        topic: interview_topic(profile, target_job, skill)?,
        question: question.to_string(),
        answer: answer.to_string(),
    };
    call(executor, &request).await
}

/// The interviewer sees the whole profile, serialized as JSON.
fn interview_topic(
    profile: &UserProfile,
    target_job: &str,
    skill: &str,
) -> Result<InterviewTopic, FlowError> {
    Ok(InterviewTopic {
        digital_twin: serde_json::to_string(profile)?,
        target_job: target_job.to_string(),
        skill: skill.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::flows::catalog::{
        default_registry, AI_GUIDANCE, ANALYZE_SKILL_GAPS, LEARNING_RECOMMENDATIONS,
    };
    use crate::flows::invoker::{ModelErrorKind, ModelError, ModelInvoker, RetryPolicy};
    use crate::flows::stub::StubBackend;

    fn executor(stub: &Arc<StubBackend>) -> FlowExecutor {
        FlowExecutor::new(
            default_registry().unwrap(),
            ModelInvoker::new(stub.clone(), RetryPolicy::default()),
        )
    }

    fn profile() -> UserProfile {
        UserProfile {
            skills: vec!["React".to_string(), "Node.js".to_string()],
            education: "BSc Computer Science".to_string(),
            job_preferences: "Remote full-stack".to_string(),
            digital_twin_description: Some("Full-stack developer with a frontend lean.".to_string()),
        }
    }

    #[tokio::test]
    async fn test_digital_twin_uses_profile_fields() {
        let stub = Arc::new(StubBackend::new(vec![Ok(
            json!({"digitalTwinDescription": "**Professional Synopsis:** ..."}),
        )]));
        let twin = digital_twin_for_profile(&executor(&stub), "user-1", &profile())
            .await
            .unwrap();
        assert!(twin.digital_twin_description.starts_with("**Professional"));

        let prompt = stub.last_request().unwrap().prompt;
        assert!(prompt.contains("Skills: React, Node.js"));
        assert!(prompt.contains(
            "Education: BSc Computer Science. Job Preferences: Remote full-stack."
        ));
    }

    #[tokio::test]
    async fn test_learning_plan_chains_two_flows() {
        let stub = Arc::new(StubBackend::new(vec![
            Ok(json!({"skillGaps": "No Kubernetes", "recommendations": "Learn k8s basics"})),
            Ok(json!({"recommendations": ["Take a k8s course", "Deploy a side project"]})),
        ]));
        let plan = learning_plan(
            &executor(&stub),
            "Backend dev",
            "Platform Engineer",
            Some("short videos".to_string()),
        )
        .await
        .unwrap();

        assert_eq!(plan.skill_gaps, "No Kubernetes");
        assert_eq!(plan.learning_steps.len(), 2);

        let requests = stub.requests();
        assert_eq!(requests[0].flow, ANALYZE_SKILL_GAPS);
        assert_eq!(requests[1].flow, LEARNING_RECOMMENDATIONS);
        assert!(requests[1].prompt.contains("Learn k8s basics"));
        assert!(requests[1].prompt.contains("short videos"));
    }

    #[tokio::test]
    async fn test_learning_plan_stops_after_failed_first_step() {
        let stub = Arc::new(StubBackend::new(vec![Err(ModelError::refused("no"))]));
        let err = learning_plan(&executor(&stub), "twin", "role", None)
            .await
            .unwrap_err();
        assert!(matches!(err, FlowError::Model(e) if e.kind == ModelErrorKind::Refused));
        assert_eq!(stub.calls(), 1);
    }

    #[tokio::test]
    async fn test_guidance_without_profile_is_generic() {
        let stub = Arc::new(StubBackend::new(vec![
            Ok(json!({"response": "- Learn SQL"})),
            Ok(json!({"response": "- Lean into React"})),
        ]));
        let executor = executor(&stub);

        guidance_for_profile(&executor, None, "What next?").await.unwrap();
        let generic = stub.last_request().unwrap();
        assert_eq!(generic.flow, AI_GUIDANCE);
        assert!(!generic.prompt.contains("digital twin"));

        let profile = profile();
        guidance_for_profile(&executor, Some(&profile), "What next?")
            .await
            .unwrap();
        assert!(stub
            .last_request()
            .unwrap()
            .prompt
            .contains("Full-stack developer with a frontend lean."));
    }

    #[tokio::test]
    async fn test_blank_transcript_never_reaches_model() {
        let stub = Arc::new(StubBackend::new(vec![]));
        let err = evaluate_interview_answer(
            &executor(&stub),
            &profile(),
            "Frontend Engineer",
            "React",
            "Explain hooks.",
            "   ",
        )
        .await
        .unwrap_err();
        assert!(matches!(err, FlowError::InputInvalid(e) if e.paths() == vec!["answer"]));
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn test_evaluation_sends_profile_json_and_answer() {
        let stub = Arc::new(StubBackend::new(vec![Ok(json!({
            "question": "Explain hooks.",
            "evaluation": "Clear and accurate; add an example."
        }))]));
        let response = evaluate_interview_answer(
            &executor(&stub),
            &profile(),
            "Frontend Engineer",
            "React",
            "Explain hooks.",
            " Hooks let function components hold state. ",
        )
        .await
        .unwrap();
        assert_eq!(
            response.evaluation.as_deref(),
            Some("Clear and accurate; add an example.")
        );

        let prompt = stub.last_request().unwrap().prompt;
        assert!(prompt.contains("&quot;skills&quot;:[&quot;React&quot;,&quot;Node.js&quot;]"));
        assert!(prompt.contains("Hooks let function components hold state."));
    }

    #[tokio::test]
    async fn test_interview_question_mode() {
        let stub = Arc::new(StubBackend::new(vec![Ok(
            json!({"question": "How do you structure a large React app?"}),
        )]));
        let response = interview_question(&executor(&stub), &profile(), "Frontend Engineer", "React")
            .await
            .unwrap();
        assert!(response.evaluation.is_none());
        assert!(stub
            .last_request()
            .unwrap()
            .prompt
            .contains("Generate a single open-ended interview question"));
    }
}
