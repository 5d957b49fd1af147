// Markup stripping for user-supplied text. Every title and body passes
// through here before it is stored; text that is empty once stripped is
// rejected by the stores.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{AppError, AppResult};

static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());

/// Strip HTML tags and trim surrounding whitespace.
pub fn sanitize(input: &str) -> String {
    HTML_TAG.replace_all(input, "").trim().to_string()
}

/// Sanitize a required field, rejecting values that are empty afterwards.
pub fn sanitize_required(input: &str, field: &str) -> AppResult<String> {
    let cleaned = sanitize(input);
    if cleaned.is_empty() {
        return Err(AppError::Validation(format!("{} is required", field)));
    }
    Ok(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_tags_and_trims() {
        assert_eq!(sanitize("  hello  "), "hello");
        assert_eq!(sanitize("<b>bold</b> text"), "bold text");
        assert_eq!(sanitize("<script>alert(1)</script>hi"), "alert(1)hi");
    }

    #[test]
    fn rejects_empty_after_sanitization() {
        assert!(sanitize_required("<p></p>", "Content").is_err());
        assert!(sanitize_required("   ", "Content").is_err());
        assert_eq!(sanitize_required("ok", "Content").unwrap(), "ok");
    }
}
