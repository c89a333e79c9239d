use serde_json::Value;

/// Representative text of a parse result, used as scoring input.
///
/// Preference order:
/// 1. `data.professionalSummary` when it is a non-empty string
/// 2. the `name` of every entry in `data.skills`, space separated, when that
///    is non-empty
/// 3. the whole parse result serialised as JSON
pub fn resume_text(parsed: &Value) -> String {
    let data = parsed.get("data");

    if let Some(summary) = data
        .and_then(|d| d.get("professionalSummary"))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
    {
        return summary.to_string();
    }

    let skills = data
        .and_then(|d| d.get("skills"))
        .and_then(Value::as_array)
        .map(|skills| {
            skills
                .iter()
                .map(|s| s.get("name").and_then(Value::as_str).unwrap_or_default())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default();

    if !skills.is_empty() {
        return skills;
    }

    parsed.to_string()
}
