//! Core data model: rule metadata, the closed vocabularies it is drawn from,
//! and the loaded [`Rule`] record.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Language sentinel meaning "applies regardless of language".
pub const UNIVERSAL: &str = "universal";

/// Tag injected when a document yields no tags at all.
pub const FALLBACK_TAG: &str = "best-practices";

/// Closed set of rule categories.
#[derive(Serialize, Deserialize, ValueEnum, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    General,
    Coding,
    Writing,
    Research,
    Communication,
    Data,
    ProjectManagement,
    Security,
    Devops,
}

impl Category {
    pub const ALL: [Category; 9] = [
        Category::General,
        Category::Coding,
        Category::Writing,
        Category::Research,
        Category::Communication,
        Category::Data,
        Category::ProjectManagement,
        Category::Security,
        Category::Devops,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::General => "general",
            Category::Coding => "coding",
            Category::Writing => "writing",
            Category::Research => "research",
            Category::Communication => "communication",
            Category::Data => "data",
            Category::ProjectManagement => "project-management",
            Category::Security => "security",
            Category::Devops => "devops",
        }
    }

    /// Case-insensitive lookup; `None` for anything outside the closed set.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase();
        Self::ALL.into_iter().find(|c| c.as_str() == s)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Intrinsic importance of a rule. Declaration order is the sort order.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Critical,
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub const ALL: [Priority; 4] = [Priority::Critical, Priority::High, Priority::Medium, Priority::Low];

    pub fn rank(self) -> u8 {
        match self {
            Priority::Critical => 0,
            Priority::High => 1,
            Priority::Medium => 2,
            Priority::Low => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Critical => "critical",
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase();
        Self::ALL.into_iter().find(|p| p.as_str() == s)
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scenario concern a caller asks to emphasize. Unrelated to [`Priority`]:
/// a focus selects rules by tag, a priority orders them.
#[derive(Serialize, Deserialize, ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Focus {
    Performance,
    Security,
    Maintainability,
    Accessibility,
}

impl Focus {
    pub fn as_str(self) -> &'static str {
        match self {
            Focus::Performance => "performance",
            Focus::Security => "security",
            Focus::Maintainability => "maintainability",
            Focus::Accessibility => "accessibility",
        }
    }
}

impl fmt::Display for Focus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single language token or a non-empty set of them.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum LanguageSpec {
    One(String),
    Many(BTreeSet<String>),
}

impl LanguageSpec {
    pub fn universal() -> Self {
        LanguageSpec::One(UNIVERSAL.to_string())
    }

    pub fn contains(&self, token: &str) -> bool {
        match self {
            LanguageSpec::One(t) => t == token,
            LanguageSpec::Many(set) => set.contains(token),
        }
    }

    pub fn is_universal(&self) -> bool {
        self.contains(UNIVERSAL)
    }

    /// Universal rules match every language query.
    pub fn matches(&self, token: &str) -> bool {
        self.is_universal() || self.contains(token)
    }

    pub fn tokens(&self) -> Vec<&str> {
        match self {
            LanguageSpec::One(t) => vec![t.as_str()],
            LanguageSpec::Many(set) => set.iter().map(String::as_str).collect(),
        }
    }
}

impl Default for LanguageSpec {
    fn default() -> Self {
        Self::universal()
    }
}

impl fmt::Display for LanguageSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tokens().join(", "))
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Applicability {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scenarios: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub frameworks: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub environments: Vec<String>,
}

/// Structured metadata derived from one rule document.
///
/// `id`, `title`, `category`, `language`, `tags` and `priority` are always
/// populated. Everything else is present only when the document declares it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RuleMetadata {
    pub id: String,
    pub title: String,
    pub category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    pub language: LanguageSpec,
    pub tags: BTreeSet<String>,
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prerequisites: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applicability: Option<Applicability>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outcomes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<String>,
}

impl RuleMetadata {
    pub fn frameworks(&self) -> &[String] {
        self.applicability
            .as_ref()
            .map(|a| a.frameworks.as_slice())
            .unwrap_or_default()
    }
}

/// One discovered document: its metadata, markdown body and source path.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Rule {
    #[serde(flatten)]
    pub metadata: RuleMetadata,
    pub path: String,
    pub content: String,
}

impl Rule {
    pub fn id(&self) -> &str {
        &self.metadata.id
    }

    pub fn priority(&self) -> Priority {
        self.metadata.priority
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_parse() {
        assert_eq!(Category::parse("Coding"), Some(Category::Coding));
        assert_eq!(Category::parse(" project-management "), Some(Category::ProjectManagement));
        assert_eq!(Category::parse("misc"), None);
        for c in Category::ALL {
            assert_eq!(Category::parse(c.as_str()), Some(c));
        }
    }

    #[test]
    fn test_priority_rank_matches_ordering() {
        let mut ps = vec![Priority::Low, Priority::Critical, Priority::Medium, Priority::High];
        ps.sort();
        assert_eq!(ps, Priority::ALL.to_vec());
        assert_eq!(Priority::Critical.rank(), 0);
        assert_eq!(Priority::Low.rank(), 3);
        assert_eq!(Priority::default(), Priority::Medium);
    }

    #[test]
    fn test_language_spec_matching() {
        let one = LanguageSpec::One("python".to_string());
        assert!(one.matches("python"));
        assert!(!one.matches("rust"));

        let many = LanguageSpec::Many(["javascript", "typescript"].iter().map(|s| s.to_string()).collect());
        assert!(many.matches("typescript"));
        assert!(!many.matches("python"));

        let universal = LanguageSpec::universal();
        assert!(universal.matches("python"));
        assert!(universal.matches("anything"));
    }

    #[test]
    fn test_language_spec_untagged_serde() {
        let one: LanguageSpec = serde_json::from_str("\"rust\"").unwrap();
        assert_eq!(one, LanguageSpec::One("rust".to_string()));

        let many: LanguageSpec = serde_json::from_str("[\"go\", \"rust\"]").unwrap();
        assert_eq!(many.tokens(), vec!["go", "rust"]);
    }
}
