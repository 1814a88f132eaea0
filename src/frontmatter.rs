//! YAML front-matter header parsing.

use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;

use crate::model::LanguageSpec;

/// Typed view of a document header. Every field is independently optional.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct FrontMatter {
    #[serde(deserialize_with = "scalar")]
    pub id: Option<String>,
    #[serde(deserialize_with = "scalar")]
    pub title: Option<String>,
    #[serde(deserialize_with = "scalar")]
    pub description: Option<String>,
    #[serde(deserialize_with = "scalar")]
    pub category: Option<String>,
    #[serde(deserialize_with = "scalar")]
    pub subcategory: Option<String>,
    pub language: Option<LanguageSpec>,
    #[serde(deserialize_with = "string_list")]
    pub tags: Vec<String>,
    #[serde(deserialize_with = "scalar")]
    pub difficulty: Option<String>,
    #[serde(deserialize_with = "scalar")]
    pub priority: Option<String>,
    pub applicability: Option<HeaderApplicability>,
    #[serde(deserialize_with = "string_list")]
    pub prerequisites: Vec<String>,
    #[serde(deserialize_with = "string_list")]
    pub related: Vec<String>,
    #[serde(deserialize_with = "string_list")]
    pub outcomes: Vec<String>,
    #[serde(deserialize_with = "scalar")]
    pub version: Option<String>,
    #[serde(deserialize_with = "scalar")]
    pub last_updated: Option<String>,
    #[serde(deserialize_with = "scalar")]
    pub author: Option<String>,
    #[serde(deserialize_with = "string_list")]
    pub references: Vec<String>,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct HeaderApplicability {
    #[serde(deserialize_with = "string_list")]
    pub scenarios: Vec<String>,
    #[serde(deserialize_with = "string_list")]
    pub frameworks: Vec<String>,
    #[serde(deserialize_with = "string_list")]
    pub environments: Vec<String>,
}

/// Split `raw` into an optional header and the markdown body.
///
/// A header is a block opened by a `---` line on the very first line and
/// closed by a `---` (or `...`) line. An unterminated block means there is no
/// header. A block that is not valid YAML is not a header either, so a
/// leading markdown thematic break leaves the whole text in the body.
pub fn split(raw: &str) -> (Option<FrontMatter>, &str) {
    let text = raw.strip_prefix('\u{feff}').unwrap_or(raw);

    let Some((header, body)) = find_block(text) else {
        return (None, text);
    };

    if header.trim().is_empty() {
        return (Some(FrontMatter::default()), body);
    }

    match serde_yaml::from_str::<FrontMatter>(header) {
        Ok(fm) => (Some(fm), body),
        Err(e) => {
            tracing::debug!("Ignoring malformed front-matter: {e}");
            (None, text)
        }
    }
}

fn find_block(text: &str) -> Option<(&str, &str)> {
    let mut lines = text.split_inclusive('\n');
    let first = lines.next()?;
    if first.trim_end() != "---" {
        return None;
    }

    let header_start = first.len();
    let mut offset = header_start;
    for line in lines {
        let trimmed = line.trim_end();
        if trimmed == "---" || trimmed == "..." {
            let header = &text[header_start..offset];
            let body = &text[offset + line.len()..];
            return Some((header, body));
        }
        offset += line.len();
    }
    None
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

fn scalar<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<Scalar> = Option::deserialize(deserializer)?;
    Ok(value.map(Scalar::into_string))
}

impl Scalar {
    fn into_string(self) -> String {
        match self {
            Scalar::Text(s) => s,
            Scalar::Int(n) => n.to_string(),
            Scalar::Float(n) => n.to_string(),
            Scalar::Bool(b) => b.to_string(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringList {
    One(String),
    Many(Vec<Scalar>),
    // `references` entries are sometimes written as `{title: url}` maps
    Keyed(Vec<BTreeMap<String, String>>),
}

/// Accepts a YAML list or a single comma-separated string.
fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<StringList> = Option::deserialize(deserializer)?;
    let items = match value {
        None => Vec::new(),
        Some(StringList::One(s)) => s.split(',').map(str::to_string).collect(),
        Some(StringList::Many(v)) => v.into_iter().map(Scalar::into_string).collect(),
        Some(StringList::Keyed(maps)) => maps
            .into_iter()
            .flat_map(|m| m.into_iter().map(|(k, v)| format!("{k}: {v}")))
            .collect(),
    };
    Ok(items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_without_header() {
        let raw = "# Title\n\nBody text.";
        let (fm, body) = split(raw);
        assert!(fm.is_none());
        assert_eq!(body, raw);
    }

    #[test]
    fn test_split_with_header() {
        let raw = "---\nid: py-style\ntags: [Style, lint]\npriority: high\n---\n# Heading\n";
        let (fm, body) = split(raw);
        let fm = fm.unwrap();
        assert_eq!(fm.id.as_deref(), Some("py-style"));
        assert_eq!(fm.tags, vec!["Style", "lint"]);
        assert_eq!(fm.priority.as_deref(), Some("high"));
        assert_eq!(body, "# Heading\n");
    }

    #[test]
    fn test_split_unterminated_header_is_body() {
        let raw = "---\nid: nope\n# Heading\n";
        let (fm, body) = split(raw);
        assert!(fm.is_none());
        assert_eq!(body, raw);
    }

    #[test]
    fn test_split_malformed_header_keeps_text() {
        let raw = "---\nid: [unclosed\n---\nbody\n";
        let (fm, body) = split(raw);
        assert!(fm.is_none());
        assert_eq!(body, raw);
    }

    #[test]
    fn test_list_items_coerce_scalars() {
        let raw = "---\npriority: critical\ntags: [python, 3, true]\nrelated: [2024-notes]\n---\n";
        let (fm, _) = split(raw);
        let fm = fm.unwrap();
        assert_eq!(fm.priority.as_deref(), Some("critical"));
        assert_eq!(fm.tags, vec!["python", "3", "true"]);
        assert_eq!(fm.related, vec!["2024-notes"]);
    }

    #[test]
    fn test_split_empty_header() {
        let (fm, body) = split("---\n---\nbody");
        assert_eq!(fm, Some(FrontMatter::default()));
        assert_eq!(body, "body");
    }

    #[test]
    fn test_scalar_and_list_coercion() {
        let raw = "---\nversion: 1.2\nlastUpdated: 2024-01-15\ntags: \"a, b ,c\"\nrelated:\n  - x\n  - y\napplicability:\n  frameworks: [django]\nlanguage: [python, javascript]\n---\n";
        let (fm, _) = split(raw);
        let fm = fm.unwrap();
        assert_eq!(fm.version.as_deref(), Some("1.2"));
        assert_eq!(fm.last_updated.as_deref(), Some("2024-01-15"));
        assert_eq!(fm.tags, vec!["a", "b", "c"]);
        assert_eq!(fm.related, vec!["x", "y"]);
        assert_eq!(fm.applicability.unwrap().frameworks, vec!["django"]);
        assert!(matches!(fm.language, Some(LanguageSpec::Many(_))));
    }

    #[test]
    fn test_crlf_header() {
        let raw = "---\r\ntitle: Windows\r\n---\r\nbody";
        let (fm, body) = split(raw);
        assert_eq!(fm.unwrap().title.as_deref(), Some("Windows"));
        assert_eq!(body, "body");
    }
}
