use serde::{Deserialize, Serialize};

/// A synthesis response split into its summary and insight bullets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchSummary {
    pub summary: String,
    pub insights: Vec<String>,
}

impl ResearchSummary {
    /// Parses a response following the `SUMMARY:` / `INSIGHTS:` template.
    ///
    /// Models do not always follow the template. Without a `SUMMARY:`
    /// marker the whole trimmed response becomes the summary; without an
    /// `INSIGHTS:` marker the insight list is empty.
    pub fn parse(response: &str) -> Self {
        let response = response.trim();

        let (head, insights_block) = match find_marker(response, "INSIGHTS:") {
            Some((before, after)) => (before, Some(after)),
            None => (response, None),
        };

        let summary = match find_marker(head, "SUMMARY:") {
            Some((_, after)) => after.trim(),
            None => head.trim(),
        };

        let insights = insights_block
            .map(|block| {
                block
                    .lines()
                    .map(str::trim)
                    .filter_map(|line| {
                        line.strip_prefix("- ")
                            .or_else(|| line.strip_prefix("* "))
                            .or_else(|| line.strip_prefix("• "))
                    })
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Self {
            summary: summary.to_string(),
            insights,
        }
    }
}

/// Splits around the first occurrence of `marker`, ignoring ASCII case and
/// markdown bold.
fn find_marker<'a>(text: &'a str, marker: &str) -> Option<(&'a str, &'a str)> {
    let haystack = text.to_ascii_uppercase();
    let marker = marker.to_ascii_uppercase();

    let bold = format!("**{}**", marker);
    if let Some(pos) = haystack.find(&bold) {
        return Some((&text[..pos], &text[pos + bold.len()..]));
    }
    let pos = haystack.find(&marker)?;
    Some((&text[..pos], &text[pos + marker.len()..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_template() {
        let response = "SUMMARY: Rust enforces ownership at compile time.\n\nINSIGHTS:\n- Each value has one owner\n- Borrows are checked\n- Drops are deterministic";
        let parsed = ResearchSummary::parse(response);

        assert_eq!(parsed.summary, "Rust enforces ownership at compile time.");
        assert_eq!(
            parsed.insights,
            vec![
                "Each value has one owner",
                "Borrows are checked",
                "Drops are deterministic"
            ]
        );
    }

    #[test]
    fn test_parse_bold_markers_and_preamble() {
        let response = "Here is the analysis.\n\n**SUMMARY:** Short.\n\n**INSIGHTS:**\n* one\n* two";
        let parsed = ResearchSummary::parse(response);
        assert_eq!(parsed.summary, "Short.");
        assert_eq!(parsed.insights, vec!["one", "two"]);
    }

    #[test]
    fn test_parse_lowercase_markers() {
        let response = "Summary: Lifetimes bound references.\n\ninsights:\n- Elision covers most cases";
        let parsed = ResearchSummary::parse(response);
        assert_eq!(parsed.summary, "Lifetimes bound references.");
        assert_eq!(parsed.insights, vec!["Elision covers most cases"]);
    }

    #[test]
    fn test_parse_freeform() {
        let parsed = ResearchSummary::parse("  Just some prose.  ");
        assert_eq!(parsed.summary, "Just some prose.");
        assert!(parsed.insights.is_empty());
    }
}
