//! Line-level recognizers
//!
//! Each recognizer looks at a single line of text. Patterns are compiled
//! once; a pattern that failed to compile simply never matches.

use crate::structure::UserStory;
use once_cell::sync::Lazy;
use regex::Regex;

macro_rules! line_pattern {
    ($name:ident, $regex_str:expr) => {
        static $name: Lazy<Option<Regex>> = Lazy::new(|| Regex::new($regex_str).ok());
    };
}

line_pattern!(
    RE_USER_STORY,
    r"(?i)^[\s>*_\-+\d.]*as\s+an?\s+(.+?),?\s+i\s+want(?:\s+to)?\s+(.+?),?\s+so\s+that\s+(.+?)[\s.*_]*$"
);
line_pattern!(RE_GHERKIN, r"(?i)\bgiven\b.+\bwhen\b.+\bthen\b.+");
line_pattern!(RE_CHECKBOX, r"^\s*[-*+]\s+\[[ xX]\]\s+(.+?)\s*$");
line_pattern!(
    RE_ENDPOINT,
    r#"\b(GET|POST|PUT|PATCH|DELETE)\s+(/[^\s`'"<>(),;]*)"#
);
line_pattern!(
    RE_REQUIRES,
    r"(?i)\brequires\s+(?:the\s+)?(.+?)\s*(?:[.,;:!?()]|$)"
);
line_pattern!(
    RE_AFTER_COMPLETE,
    r"(?i)\bafter\s+(?:the\s+)?(.+?)\s+is\s+(?:complete|completed|done)\b"
);
line_pattern!(RE_LIST_MARKER, r"^\s*(?:[-*+]|\d+[.)])\s+(?:\[[ xX]\]\s+)?");

/// HTTP methods recognized in endpoint mentions
pub const HTTP_METHODS: [&str; 5] = ["GET", "POST", "PUT", "PATCH", "DELETE"];

/// Parse a user story line
#[must_use]
pub fn parse_user_story(line: &str) -> Option<UserStory> {
    let caps = RE_USER_STORY.as_ref()?.captures(line)?;
    let part = |i: usize| caps.get(i).map(|m| clean_phrase(m.as_str()));
    let story = UserStory {
        role: part(1)?,
        capability: part(2)?,
        benefit: part(3)?,
    };
    (!story.role.is_empty() && !story.capability.is_empty()).then_some(story)
}

/// Whether a line reads as a Given/When/Then criterion
#[must_use]
pub fn is_gherkin_criterion(line: &str) -> bool {
    RE_GHERKIN.as_ref().is_some_and(|re| re.is_match(line))
}

/// Text of a `- [ ]` / `- [x]` checkbox item
#[must_use]
pub fn checkbox_item(line: &str) -> Option<&str> {
    RE_CHECKBOX
        .as_ref()?
        .captures(line)?
        .get(1)
        .map(|m| m.as_str())
}

/// All `METHOD /path` mentions on a line, normalized to `METHOD /path`
#[must_use]
pub fn endpoints(line: &str) -> Vec<String> {
    let Some(re) = RE_ENDPOINT.as_ref() else {
        return Vec::new();
    };
    re.captures_iter(line)
        .filter_map(|caps| {
            let method = caps.get(1)?.as_str();
            let path = caps.get(2)?.as_str().trim_end_matches(['.', ':']);
            Some(format!("{method} {path}"))
        })
        .collect()
}

/// Terms named by explicit dependency phrases on a line
#[must_use]
pub fn dependency_cues(line: &str) -> Vec<String> {
    [&RE_REQUIRES, &RE_AFTER_COMPLETE]
        .into_iter()
        .filter_map(|re| re.as_ref())
        .flat_map(|re| {
            re.captures_iter(line)
                .filter_map(|caps| caps.get(1).map(|m| clean_phrase(m.as_str())))
                .collect::<Vec<_>>()
        })
        .filter(|term| !term.is_empty())
        .collect()
}

/// Strip list markers and checkboxes from an item line
#[must_use]
pub fn clean_list_item(line: &str) -> String {
    let stripped = match RE_LIST_MARKER.as_ref() {
        Some(re) => re.replace(line, "").into_owned(),
        None => line.to_string(),
    };
    stripped.trim().to_string()
}

fn clean_phrase(text: &str) -> String {
    text.trim_matches(|c: char| c.is_whitespace() || matches!(c, '`' | '*' | '_' | '"' | '\''))
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_story_is_split_into_triple() {
        let story =
            parse_user_story("- As a visitor, I want to create an account so that I can log in.")
                .unwrap();
        assert_eq!(story.role, "visitor");
        assert_eq!(story.capability, "create an account");
        assert_eq!(story.benefit, "I can log in");
    }

    #[test]
    fn user_story_accepts_an_and_any_case() {
        let story =
            parse_user_story("AS AN admin I want audit logs so that incidents are traceable")
                .unwrap();
        assert_eq!(story.role, "admin");
        assert_eq!(story.capability, "audit logs");
    }

    #[test]
    fn non_story_lines_are_ignored() {
        assert!(parse_user_story("As expected, nothing happens").is_none());
        assert!(parse_user_story("").is_none());
    }

    #[test]
    fn gherkin_needs_all_three_clauses() {
        assert!(is_gherkin_criterion(
            "- Given a user when they log in then a session starts"
        ));
        assert!(is_gherkin_criterion("GIVEN x, WHEN y, THEN z"));
        assert!(!is_gherkin_criterion("Given a user when they log in"));
    }

    #[test]
    fn checkbox_items_capture_text() {
        assert_eq!(checkbox_item("- [ ] Email is validated"), Some("Email is validated"));
        assert_eq!(checkbox_item("  * [x] Done item "), Some("Done item"));
        assert_eq!(checkbox_item("- plain item"), None);
    }

    #[test]
    fn endpoints_are_normalized() {
        assert_eq!(
            endpoints("- `POST /auth/login` and GET /auth/session."),
            vec!["POST /auth/login".to_string(), "GET /auth/session".to_string()]
        );
        assert!(endpoints("get /lowercase is not a method").is_empty());
        assert!(endpoints("POST users without slash").is_empty());
    }

    #[test]
    fn dependency_cues_capture_terms() {
        assert_eq!(
            dependency_cues("This requires User Registration to be finished."),
            vec!["User Registration to be finished".to_string()]
        );
        assert_eq!(
            dependency_cues("Start after the **Billing** is complete"),
            vec!["Billing".to_string()]
        );
        assert!(dependency_cues("Nothing to see here").is_empty());
    }

    #[test]
    fn list_markers_are_stripped() {
        assert_eq!(clean_list_item("- [x] Works"), "Works");
        assert_eq!(clean_list_item("12. Numbered"), "Numbered");
        assert_eq!(clean_list_item("plain"), "plain");
    }
}
