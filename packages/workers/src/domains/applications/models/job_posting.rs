use serde_json::Value;

/// The parts of a job posting the scorer reads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobRequirements {
    pub description: String,
    pub skills: Vec<String>,
    pub required_skills: Vec<String>,
}

impl JobRequirements {
    /// Build from raw `job` columns. A missing posting yields empty requirements.
    pub fn from_columns(
        jd_text: Option<&str>,
        skills_json: Option<&Value>,
        required_skills_json: Option<&Value>,
    ) -> Self {
        Self {
            description: jd_text.unwrap_or_default().to_string(),
            skills: skills_json.map(skill_names).unwrap_or_default(),
            required_skills: required_skills_json.map(skill_names).unwrap_or_default(),
        }
    }
}

/// Extract skill names from a `skills_json` value.
///
/// Accepts an array of strings or of `{ "name": ... }` objects. Every entry
/// counts as a skill: one without a usable name becomes the empty skill,
/// which matches any text. A non-array value has no skills.
pub fn skill_names(value: &Value) -> Vec<String> {
    let Some(items) = value.as_array() else {
        return Vec::new();
    };

    items
        .iter()
        .map(|item| match item {
            Value::String(name) => name.clone(),
            Value::Object(obj) => obj
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            _ => String::new(),
        })
        .collect()
}
