//! Corpus statistics and reference checks.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::index::RuleIndex;

#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct CorpusStats {
    pub total_rules: usize,
    pub by_category: BTreeMap<String, usize>,
    pub by_language: BTreeMap<String, usize>,
    pub by_priority: BTreeMap<String, usize>,
    pub by_tag: BTreeMap<String, usize>,
}

impl CorpusStats {
    /// Tags sorted by descending count, ties alphabetical.
    pub fn top_tags(&self, n: usize) -> Vec<(&str, usize)> {
        let mut tags: Vec<(&str, usize)> = self.by_tag.iter().map(|(t, c)| (t.as_str(), *c)).collect();
        tags.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
        tags.truncate(n);
        tags
    }
}

pub fn stats(index: &RuleIndex) -> CorpusStats {
    let mut stats = CorpusStats {
        total_rules: index.len(),
        ..CorpusStats::default()
    };

    for rule in index.all() {
        let meta = &rule.metadata;
        *stats.by_category.entry(meta.category.to_string()).or_insert(0) += 1;
        *stats.by_priority.entry(meta.priority.to_string()).or_insert(0) += 1;
        for token in meta.language.tokens() {
            *stats.by_language.entry(token.to_string()).or_insert(0) += 1;
        }
        for tag in &meta.tags {
            *stats.by_tag.entry(tag.clone()).or_insert(0) += 1;
        }
    }

    stats
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceKind {
    Related,
    Prerequisite,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct BrokenReference {
    pub rule_id: String,
    pub path: String,
    pub kind: ReferenceKind,
    pub target: String,
}

#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct QualityReport {
    pub duplicate_ids: BTreeMap<String, Vec<String>>,
    pub broken_references: Vec<BrokenReference>,
}

impl QualityReport {
    pub fn is_clean(&self) -> bool {
        self.duplicate_ids.is_empty() && self.broken_references.is_empty()
    }
}

/// Data-quality findings. Never fails; an empty report means a clean corpus.
pub fn check(index: &RuleIndex) -> QualityReport {
    let duplicate_ids = index
        .duplicate_ids()
        .into_iter()
        .map(|(id, paths)| (id.to_string(), paths.into_iter().map(str::to_string).collect()))
        .collect();

    let mut broken_references = Vec::new();
    for rule in index.all() {
        let refs = rule
            .metadata
            .related
            .iter()
            .map(|t| (ReferenceKind::Related, t))
            .chain(
                rule.metadata
                    .prerequisites
                    .iter()
                    .map(|t| (ReferenceKind::Prerequisite, t)),
            );
        for (kind, target) in refs {
            if index.get(target).is_none() {
                broken_references.push(BrokenReference {
                    rule_id: rule.id().to_string(),
                    path: rule.path.clone(),
                    kind,
                    target: target.clone(),
                });
            }
        }
    }

    QualityReport {
        duplicate_ids,
        broken_references,
    }
}
