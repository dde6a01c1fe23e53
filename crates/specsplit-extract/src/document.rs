//! Source documents and frontmatter
//!
//! A specification arrives either as a single text or as an ordered list of
//! `(filename, content)` pairs. Documents may open with a YAML frontmatter
//! block carrying `title`, `domain`, `type` and `issue` metadata.

use serde::{Deserialize, Serialize};

/// One input document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDocument {
    /// File name or path, if the caller supplied one
    pub path: Option<String>,
    /// Raw document text
    pub content: String,
}

impl SourceDocument {
    /// Create a document without a path
    #[inline]
    #[must_use]
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            path: None,
            content: content.into(),
        }
    }

    /// Create a document with a path
    #[inline]
    #[must_use]
    pub fn with_path(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            content: content.into(),
        }
    }

    /// File stem of the path (`specs/auth.md` -> `auth`)
    #[must_use]
    pub fn stem(&self) -> Option<&str> {
        let path = self.path.as_deref()?;
        let file = path.rsplit(['/', '\\']).next().unwrap_or(path);
        let stem = match file.rfind('.') {
            Some(0) | None => file,
            Some(dot) => &file[..dot],
        };
        (!stem.is_empty()).then_some(stem)
    }

    /// Number of lines in the document
    #[inline]
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.content.lines().count()
    }
}

/// Metadata block at the top of a document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frontmatter {
    /// Document title
    pub title: Option<String>,
    /// Business domain the document belongs to
    pub domain: Option<String>,
    /// Change type (`feature`, `bugfix`, `refactor`)
    pub change_type: Option<String>,
    /// Issue tracker reference
    pub issue: Option<String>,
    /// Last line of the block (the closing `---`)
    pub end_line: usize,
}

impl Frontmatter {
    /// Parse a leading `---` delimited YAML block.
    ///
    /// Returns `None` when the document has no block, the block is never
    /// closed, or its body is not a YAML mapping.
    #[must_use]
    pub fn parse(content: &str) -> Option<Self> {
        let mut lines = content.lines();
        if lines.next()?.trim_end() != "---" {
            return None;
        }

        let mut body = Vec::new();
        let mut end_line = None;
        for (idx, line) in lines.enumerate() {
            if line.trim_end() == "---" {
                // idx is zero-based from the second line
                end_line = Some(idx + 2);
                break;
            }
            body.push(line);
        }
        let end_line = end_line?;

        let value: serde_yaml::Value = serde_yaml::from_str(&body.join("\n")).ok()?;
        let mapping = value.as_mapping()?;
        let field = |key: &str| mapping.get(key).and_then(scalar_to_string);

        Some(Self {
            title: field("title"),
            domain: field("domain"),
            change_type: field("type"),
            issue: field("issue"),
            end_line,
        })
    }
}

fn scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    let text = match value {
        serde_yaml::Value::String(s) => s.trim().to_string(),
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}
