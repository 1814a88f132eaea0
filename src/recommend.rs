//! Scenario-driven recommendation: union every facet query, dedupe by id,
//! then order by rule priority.

use ahash::AHashSet;
use serde::{Deserialize, Serialize};

use crate::index::RuleIndex;
use crate::model::{Category, Focus, Rule};

/// What the caller is working on.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ScenarioContext {
    #[serde(rename = "type")]
    pub task_type: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub framework: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub priorities: Vec<Focus>,
}

impl ScenarioContext {
    pub fn new(task_type: Category) -> Self {
        Self {
            task_type,
            language: None,
            framework: None,
            priorities: Vec::new(),
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_framework(mut self, framework: impl Into<String>) -> Self {
        self.framework = Some(framework.into());
        self
    }

    pub fn with_priorities(mut self, priorities: impl IntoIterator<Item = Focus>) -> Self {
        self.priorities = priorities.into_iter().collect();
        self
    }

    /// The language as the caller named it, for labels and names.
    fn language_name(&self) -> Option<String> {
        self.language
            .as_deref()
            .map(|l| l.trim().to_lowercase())
            .filter(|l| !l.is_empty())
    }

    fn framework_name(&self) -> Option<&str> {
        self.framework.as_deref().map(str::trim).filter(|f| !f.is_empty())
    }
}

#[derive(Serialize, Debug, Clone)]
pub struct RecommendationBundle<'a> {
    pub name: String,
    pub description: String,
    pub rules: Vec<&'a Rule>,
    /// One label per facet query that contributed at least one rule,
    /// in query order.
    pub scenarios: Vec<String>,
}

impl RecommendationBundle<'_> {
    pub fn rule_ids(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.id()).collect()
    }
}

pub fn recommend<'a>(index: &'a RuleIndex, context: &ScenarioContext) -> RecommendationBundle<'a> {
    let language = context.language_name();
    let framework = context.framework_name();

    let mut collected: Vec<&'a Rule> = Vec::new();
    let mut scenarios: Vec<String> = Vec::new();
    let mut add = |hits: Vec<&'a Rule>, label: String| {
        if !hits.is_empty() {
            collected.extend(hits);
            scenarios.push(label);
        }
    };

    add(index.by_category(Category::General), "general-ai-operations".to_string());
    add(index.by_category(context.task_type), format!("{}-tasks", context.task_type));

    if let Some(language) = &language {
        add(index.by_language(language), format!("{language}-development"));
    }

    // one query per focus; overlaps are removed by the dedup pass below
    for focus in &context.priorities {
        add(index.by_tags(&[focus.as_str()]), format!("{focus}-focused"));
    }

    if let Some(framework) = framework {
        add(index.by_framework(framework), format!("{framework}-framework"));
    }

    let mut seen = AHashSet::new();
    let mut rules: Vec<&'a Rule> = collected
        .into_iter()
        .filter(|&r| seen.insert(r.id()))
        .collect();
    // stable: equal priorities keep first-appended order
    rules.sort_by_key(|r| r.priority().rank());

    RecommendationBundle {
        name: bundle_name(language.as_deref(), context.task_type, framework),
        description: bundle_description(language.as_deref(), context.task_type, framework, &context.priorities),
        rules,
        scenarios,
    }
}

fn bundle_name(language: Option<&str>, task_type: Category, framework: Option<&str>) -> String {
    let parts: Vec<&str> = [language, Some(task_type.as_str()), framework]
        .into_iter()
        .flatten()
        .collect();
    if parts.is_empty() {
        "custom-bundle".to_string()
    } else {
        format!("{}-bundle", parts.join("-"))
    }
}

fn bundle_description(
    language: Option<&str>,
    task_type: Category,
    framework: Option<&str>,
    priorities: &[Focus],
) -> String {
    let mut description = String::from("Rules for");
    if let Some(language) = language {
        description.push(' ');
        description.push_str(language);
    }
    description.push(' ');
    description.push_str(task_type.as_str());
    if let Some(framework) = framework {
        description.push_str(" using ");
        description.push_str(framework);
    }
    if !priorities.is_empty() {
        let focus: Vec<&str> = priorities.iter().map(|p| p.as_str()).collect();
        description.push_str(" with focus on ");
        description.push_str(&focus.join(", "));
    }
    description
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::Document;
    use crate::model::Priority;
    use pretty_assertions::assert_eq;

    fn doc(path: &str, raw: &str) -> Document {
        Document {
            path: path.to_string(),
            raw_text: raw.to_string(),
        }
    }

    fn corpus() -> RuleIndex {
        RuleIndex::from_documents(vec![
            doc("general/core-rules.md", "---\npriority: low\n---\n# Core\nGeneral guidance.\n"),
            doc("general/safety-rules.md", "---\npriority: critical\n---\n# Safety\nsecurity first\n"),
            doc("coding/python-rules.md", "# Python\nperformance and security tips, testing too\n"),
            doc(
                "coding/django-rules.md",
                "---\nlanguage: python\npriority: high\napplicability:\n  frameworks: [django]\n---\n# Django\n",
            ),
            doc("coding/rust-rules.md", "---\npriority: high\n---\n# Rust\nperformance\n"),
            doc("writing/docs-rules.md", "# Docs\nAccessibility of prose.\n"),
        ])
    }

    #[test]
    fn test_scenario_labels_in_query_order() {
        let index = corpus();
        let context = ScenarioContext::new(Category::Coding)
            .with_language("python")
            .with_priorities([Focus::Security, Focus::Performance]);
        let bundle = recommend(&index, &context);

        assert_eq!(
            bundle.scenarios,
            vec![
                "general-ai-operations",
                "coding-tasks",
                "python-development",
                "security-focused",
                "performance-focused",
            ]
        );
    }

    #[test]
    fn test_dedup_and_priority_order() {
        let index = corpus();
        let context = ScenarioContext::new(Category::Coding)
            .with_language("python")
            .with_priorities([Focus::Security, Focus::Performance]);
        let bundle = recommend(&index, &context);

        // docs-rules only enters through the language facet (it is universal)
        assert_eq!(
            bundle.rule_ids(),
            vec!["safety-rules", "django-rules", "rust-rules", "python-rules", "docs-rules", "core-rules"]
        );
        let ranks: Vec<u8> = bundle.rules.iter().map(|r| r.priority().rank()).collect();
        assert!(ranks.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_framework_facet() {
        let index = corpus();
        let context = ScenarioContext::new(Category::Writing).with_framework("django");
        let bundle = recommend(&index, &context);

        assert_eq!(
            bundle.scenarios,
            vec!["general-ai-operations", "writing-tasks", "django-framework"]
        );
        assert_eq!(
            bundle.rule_ids(),
            vec!["safety-rules", "django-rules", "docs-rules", "core-rules"]
        );
        assert_eq!(bundle.name, "writing-django-bundle");
        assert_eq!(bundle.description, "Rules for writing using django");
    }

    #[test]
    fn test_empty_category_yields_general_only() {
        let index = corpus();
        let bundle = recommend(&index, &ScenarioContext::new(Category::Devops));
        assert_eq!(bundle.rule_ids(), vec!["safety-rules", "core-rules"]);
        assert_eq!(bundle.scenarios, vec!["general-ai-operations"]);
    }

    #[test]
    fn test_empty_corpus() {
        let index = RuleIndex::default();
        let context = ScenarioContext::new(Category::Coding)
            .with_language("rust")
            .with_priorities([Focus::Performance]);
        let bundle = recommend(&index, &context);
        assert!(bundle.rules.is_empty());
        assert!(bundle.scenarios.is_empty());
        assert_eq!(bundle.name, "rust-coding-bundle");
    }

    #[test]
    fn test_stable_within_priority() {
        let index = RuleIndex::from_documents(vec![
            doc("general/b-rules.md", "b"),
            doc("general/a-rules.md", "a"),
            doc("coding/c-rules.md", "c"),
        ]);
        let bundle = recommend(&index, &ScenarioContext::new(Category::Coding));
        assert!(bundle.rules.iter().all(|r| r.priority() == Priority::Medium));
        assert_eq!(bundle.rule_ids(), vec!["b-rules", "a-rules", "c-rules"]);
    }

    #[test]
    fn test_name_and_description() {
        let context = ScenarioContext::new(Category::Coding)
            .with_language("Python")
            .with_framework("django")
            .with_priorities([Focus::Security, Focus::Performance]);
        let index = RuleIndex::default();
        let bundle = recommend(&index, &context);
        assert_eq!(bundle.name, "python-coding-django-bundle");
        assert_eq!(
            bundle.description,
            "Rules for python coding using django with focus on security, performance"
        );
    }

    #[test]
    fn test_language_alias_keeps_caller_spelling() {
        let index = RuleIndex::from_documents(vec![doc("coding/dotnet-rules.md", "Prefer C# records.\n")]);
        let bundle = recommend(&index, &ScenarioContext::new(Category::Coding).with_language(" C# "));

        assert_eq!(bundle.scenarios, vec!["coding-tasks", "c#-development"]);
        assert_eq!(bundle.name, "c#-coding-bundle");
        assert_eq!(bundle.rule_ids(), vec!["dotnet-rules"]);
    }

    #[test]
    fn test_bundle_name_type_only() {
        assert_eq!(bundle_name(None, Category::Data, None), "data-bundle");
    }

    #[test]
    fn test_context_deserializes_from_json() {
        let context: ScenarioContext =
            serde_json::from_str(r#"{"type":"coding","language":"go","priorities":["security"]}"#).unwrap();
        assert_eq!(
            context,
            ScenarioContext::new(Category::Coding)
                .with_language("go")
                .with_priorities([Focus::Security])
        );
    }
}
