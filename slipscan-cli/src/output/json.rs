use slipscan_common::{ExtractionResult, ResultSet};

/// Results as pretty-printed `{ "results": [...] }`
pub fn render(results: &[ExtractionResult]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&ResultSet::new(results.to_vec()))
}
