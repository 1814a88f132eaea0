//! Ready-made scenario bundles.

use std::collections::BTreeMap;

use crate::index::RuleIndex;
use crate::model::{Category, Focus};
use crate::recommend::{recommend, RecommendationBundle, ScenarioContext};

/// Fixed catalog of named scenarios, in presentation order.
pub fn common_scenarios() -> Vec<(&'static str, ScenarioContext)> {
    vec![
        (
            "python-web-development",
            ScenarioContext::new(Category::Coding)
                .with_language("python")
                .with_framework("django")
                .with_priorities([Focus::Security, Focus::Performance]),
        ),
        (
            "react-frontend",
            ScenarioContext::new(Category::Coding)
                .with_language("javascript")
                .with_framework("react")
                .with_priorities([Focus::Accessibility, Focus::Performance]),
        ),
        (
            "rust-systems",
            ScenarioContext::new(Category::Coding)
                .with_language("rust")
                .with_priorities([Focus::Performance, Focus::Security]),
        ),
        (
            "data-analysis",
            ScenarioContext::new(Category::Data)
                .with_language("python")
                .with_priorities([Focus::Performance, Focus::Maintainability]),
        ),
        (
            "secure-infrastructure",
            ScenarioContext::new(Category::Devops).with_priorities([Focus::Security]),
        ),
        (
            "security-review",
            ScenarioContext::new(Category::Security).with_priorities([Focus::Security]),
        ),
        (
            "technical-writing",
            ScenarioContext::new(Category::Writing).with_priorities([Focus::Accessibility]),
        ),
        (
            "research-report",
            ScenarioContext::new(Category::Research).with_priorities([Focus::Maintainability]),
        ),
        (
            "project-planning",
            ScenarioContext::new(Category::ProjectManagement).with_priorities([Focus::Maintainability]),
        ),
    ]
}

/// Run every catalog scenario, plus `extra` ones, against the live index.
/// Built-in keys take precedence over `extra` keys.
pub fn common_bundles<'a>(
    index: &'a RuleIndex,
    extra: &BTreeMap<String, ScenarioContext>,
) -> BTreeMap<String, RecommendationBundle<'a>> {
    let mut bundles: BTreeMap<String, RecommendationBundle<'a>> = extra
        .iter()
        .map(|(key, context)| (key.clone(), recommend(index, context)))
        .collect();
    for (key, context) in common_scenarios() {
        bundles.insert(key.to_string(), recommend(index, &context));
    }
    bundles
}

/// Look up one scenario by key, built-ins first.
pub fn find_scenario(key: &str, extra: &BTreeMap<String, ScenarioContext>) -> Option<ScenarioContext> {
    common_scenarios()
        .into_iter()
        .find(|(k, _)| *k == key)
        .map(|(_, context)| context)
        .or_else(|| extra.get(key).cloned())
}
