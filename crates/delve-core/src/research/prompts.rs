use super::Source;

/// Instructions appended after the sources. The response template is
/// parsed by [`super::ResearchSummary::parse`] and by frontends.
pub const SYNTHESIS_INSTRUCTIONS: &str = r#"Based on these sources, provide:
1. A comprehensive summary (2-3 sentences)
2. Three key insights as bullet points

Format your response exactly like this:
SUMMARY: [your summary here]

INSIGHTS:
- [insight 1]
- [insight 2]
- [insight 3]"#;

/// The query and its sources, rendered once into the synthesis prompt.
#[derive(Debug, Clone)]
pub struct ResearchContext<'a> {
    query: &'a str,
    sources: &'a [Source],
}

impl<'a> ResearchContext<'a> {
    pub fn new(query: &'a str, sources: &'a [Source]) -> Self {
        Self { query, sources }
    }

    /// Renders the query and sources without the instructions.
    pub fn to_context_string(&self) -> String {
        let mut context = format!("Research query: {}\n\nSources:\n", self.query);

        for (i, source) in self.sources.iter().enumerate() {
            context.push_str(&format!(
                "\nSource {}:\nTitle: {}\n\n{}\n\n",
                i + 1,
                source.title,
                source.content
            ));
        }

        context
    }

    /// Builds the full synthesis prompt.
    pub fn to_prompt(&self) -> String {
        format!("{}\n\n{}", self.to_context_string(), SYNTHESIS_INSTRUCTIONS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(title: &str, content: &str, index: usize) -> Source {
        Source {
            title: title.to_string(),
            url: format!("https://example.com/{index}"),
            content: content.to_string(),
            index,
            total: 3,
        }
    }

    #[test]
    fn test_prompt_layout() {
        let sources = vec![source("Borrowing", "Body one", 1), source("Lifetimes", "Body two", 3)];
        let prompt = ResearchContext::new("rust ownership", &sources).to_prompt();

        let expected_head = "Research query: rust ownership\n\nSources:\n\
            \nSource 1:\nTitle: Borrowing\n\nBody one\n\n\
            \nSource 2:\nTitle: Lifetimes\n\nBody two\n\n\n\n\
            Based on these sources, provide:\n";
        assert!(prompt.starts_with(expected_head), "{prompt}");
        assert!(prompt.ends_with("- [insight 1]\n- [insight 2]\n- [insight 3]"));
    }

    #[test]
    fn test_sources_numbered_by_position_not_raw_index() {
        let sources = vec![source("Only", "content", 3)];
        let prompt = ResearchContext::new("q", &sources).to_prompt();
        assert!(prompt.contains("Source 1:\nTitle: Only"));
        assert!(!prompt.contains("Source 3:"));
    }

    #[test]
    fn test_instructions_template() {
        assert!(SYNTHESIS_INSTRUCTIONS.contains("SUMMARY: [your summary here]\n\nINSIGHTS:\n"));
        assert_eq!(SYNTHESIS_INSTRUCTIONS.matches("\n- [insight").count(), 3);
    }
}
