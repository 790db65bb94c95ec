//! Prompt template for turning page text into an image-generation prompt.
//!
//! Callers can override the template via
//! [`crate::config::PikbookConfig::prompt_template`]; the constant here is
//! used only when no override is provided.

/// Default instruction sent ahead of each page's text.
///
/// The `{image prompt}` slot is left literal: it shows the model the shape
/// of the answer, it is not substituted.
pub const DEFAULT_PROMPT_TEMPLATE: &str = r#"
Prompt: {image prompt}
Summarize the following text and, using the template above, write an image-generation prompt for a picture to accompany the text:
"#;

/// Build the completion request for one page.
pub fn synthesis_request(template: &str, page_text: &str) -> String {
    format!("{template} {page_text}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_appends_page_text_after_template() {
        let req = synthesis_request(DEFAULT_PROMPT_TEMPLATE, "Hello world");
        assert!(req.starts_with(DEFAULT_PROMPT_TEMPLATE));
        assert!(req.ends_with(" Hello world"));
    }

    #[test]
    fn empty_page_still_yields_template() {
        let req = synthesis_request("T", "");
        assert_eq!(req, "T ");
    }
}
