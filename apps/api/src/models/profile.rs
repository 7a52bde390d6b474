use serde::{Deserialize, Serialize};

/// Read-only user profile supplied by the profile store. Never written by the flows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub education: String,
    #[serde(default)]
    pub job_preferences: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digital_twin_description: Option<String>,
}

impl UserProfile {
    /// `"Education: <e>. Job Preferences: <j>."` — the career status line fed to twin generation.
    pub fn career_status(&self) -> String {
        format!(
            "Education: {}. Job Preferences: {}.",
            self.education.trim(),
            self.job_preferences.trim()
        )
    }

    /// Skills as a single comma-separated string, blanks dropped.
    pub fn skills_line(&self) -> String {
        self.skills
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}
