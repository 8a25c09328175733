//! Parsing of model-suggested follow-up questions.

/// Extract up to `limit` questions from a completion that should contain a
/// JSON array of strings.
///
/// Models often wrap the array in prose or code fences, so the outermost
/// `[...]` span is parsed. Returns an empty list when nothing usable is found.
pub fn parse_followups(content: &str, limit: usize) -> Vec<String> {
    let (Some(start), Some(end)) = (content.find('['), content.rfind(']')) else {
        return Vec::new();
    };
    if end < start {
        return Vec::new();
    }

    match serde_json::from_str::<Vec<String>>(&content[start..=end]) {
        Ok(items) => items
            .into_iter()
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty())
            .take(limit)
            .collect(),
        Err(e) => {
            tracing::debug!(error = %e, "Follow-up completion was not a string array");
            Vec::new()
        }
    }
}
