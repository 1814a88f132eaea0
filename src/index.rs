//! In-memory corpus index: built once, read-only afterwards.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use crate::discovery::{Discovery, Document};
use crate::extract::{canonical_language, extract_rule};
use crate::model::{Category, Rule};

#[derive(Debug, Clone, Default)]
pub struct RuleIndex {
    rules: Vec<Rule>,
}

impl RuleIndex {
    /// Discover and extract every rule document under `root`.
    pub fn load(root: &Path, discovery: &Discovery) -> Self {
        let index = Self::from_documents(discovery.documents(root));
        tracing::info!("Loaded {} rules from {}", index.len(), root.display());
        index
    }

    /// Build from already-read documents, keeping their order.
    pub fn from_documents<I>(documents: I) -> Self
    where
        I: IntoIterator<Item = Document>,
    {
        let mut seen_paths = HashSet::new();
        let rules: Vec<Rule> = documents
            .into_iter()
            .filter(|doc| seen_paths.insert(doc.path.clone()))
            .map(|doc| extract_rule(&doc.path, &doc.raw_text))
            .collect();

        let index = Self { rules };
        for (id, paths) in index.duplicate_ids() {
            tracing::warn!("Duplicate rule id {id} in {}", paths.join(", "));
        }
        index
    }

    pub fn all(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// First rule carrying `id`.
    pub fn get(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.id() == id)
    }

    pub fn by_category(&self, category: Category) -> Vec<&Rule> {
        self.rules
            .iter()
            .filter(|r| r.metadata.category == category)
            .collect()
    }

    /// Rules declaring `language`, plus every universal rule.
    pub fn by_language(&self, language: &str) -> Vec<&Rule> {
        let token = canonical_language(language);
        self.rules
            .iter()
            .filter(|r| r.metadata.language.matches(&token))
            .collect()
    }

    /// Rules sharing at least one tag with `tags`.
    pub fn by_tags<S: AsRef<str>>(&self, tags: &[S]) -> Vec<&Rule> {
        let wanted: HashSet<String> = tags
            .iter()
            .map(|t| t.as_ref().trim().to_lowercase())
            .collect();
        self.rules
            .iter()
            .filter(|r| r.metadata.tags.iter().any(|t| wanted.contains(t)))
            .collect()
    }

    /// Case-insensitive substring match on title, description or body.
    pub fn by_substring(&self, query: &str) -> Vec<&Rule> {
        let needle = query.to_lowercase();
        self.rules
            .iter()
            .filter(|r| {
                r.metadata.title.to_lowercase().contains(&needle)
                    || r.metadata
                        .description
                        .as_deref()
                        .is_some_and(|d| d.to_lowercase().contains(&needle))
                    || r.content.to_lowercase().contains(&needle)
            })
            .collect()
    }

    /// Rules whose declared frameworks contain `framework` exactly.
    pub fn by_framework(&self, framework: &str) -> Vec<&Rule> {
        self.rules
            .iter()
            .filter(|r| r.metadata.frameworks().iter().any(|f| f == framework))
            .collect()
    }

    /// Ids carried by more than one rule, with the paths that carry them.
    pub fn duplicate_ids(&self) -> BTreeMap<&str, Vec<&str>> {
        let mut by_id: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for rule in &self.rules {
            by_id.entry(rule.id()).or_default().push(rule.path.as_str());
        }
        by_id.retain(|_, paths| paths.len() > 1);
        by_id
    }
}
