//! Change name slugs

use crate::error::DecompositionError;
use std::collections::BTreeSet;

/// Name used when a title slugifies to nothing
const FALLBACK_NAME: &str = "change";

/// Lowercase, collapse non-alphanumeric runs to one hyphen, trim hyphens.
///
/// A slug that would start with a digit gets a `change-` prefix so it
/// still passes [`validate_name`].
#[must_use]
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_hyphen = false;
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    match slug.chars().next() {
        None => FALLBACK_NAME.to_string(),
        Some(first) if first.is_ascii_digit() => format!("{FALLBACK_NAME}-{slug}"),
        Some(_) => slug,
    }
}

/// Check a name against `^[a-z][a-z0-9-]*$`
pub fn validate_name(name: &str) -> Result<(), DecompositionError> {
    let mut chars = name.chars();
    match chars.next() {
        None => return Err(DecompositionError::invalid_name(name, "name is empty")),
        Some(c) if !c.is_ascii_lowercase() => {
            return Err(DecompositionError::invalid_name(
                name,
                "must start with a lowercase letter",
            ));
        }
        Some(_) => {}
    }
    if let Some(bad) = chars.find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-')) {
        return Err(DecompositionError::invalid_name(
            name,
            format!("character '{bad}' is not allowed (use a-z, 0-9 and '-')"),
        ));
    }
    Ok(())
}

/// Hands out unique names, suffixing collisions with `-2`, `-3`, ...
#[derive(Debug, Clone, Default)]
pub struct NameAllocator {
    taken: BTreeSet<String>,
}

impl NameAllocator {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocator that already considers `names` taken
    #[must_use]
    pub fn with_taken<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            taken: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Unique slug for `title`
    pub fn allocate(&mut self, title: &str) -> String {
        let base = slugify(title);
        let mut name = base.clone();
        let mut n = 2;
        while self.taken.contains(&name) {
            name = format!("{base}-{n}");
            n += 1;
        }
        self.taken.insert(name.clone());
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_collapses_punctuation() {
        assert_eq!(slugify("User Registration"), "user-registration");
        assert_eq!(slugify("  OAuth 2.0 / SSO!  "), "oauth-2-0-sso");
        assert_eq!(slugify("---"), "change");
        assert_eq!(slugify("2FA Setup"), "change-2fa-setup");
    }

    #[test]
    fn collisions_get_numeric_suffixes() {
        let mut names = NameAllocator::new();
        assert_eq!(names.allocate("Overview"), "overview");
        assert_eq!(names.allocate("Overview"), "overview-2");
        assert_eq!(names.allocate("overview!"), "overview-3");
    }

    #[test]
    fn name_validation() {
        assert!(validate_name("user-auth-2").is_ok());
        for bad in ["", "User", "2fa", "user_auth", "user auth"] {
            let err = validate_name(bad).unwrap_err();
            assert!(matches!(err, DecompositionError::InvalidName { .. }), "{bad}");
        }
    }
}
