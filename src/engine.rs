//! Public engine surface used by the CLI.

use std::collections::BTreeMap;

use crate::catalog;
use crate::config::Config;
use crate::discovery::Discovery;
use crate::error::{Result, RuleError};
use crate::index::RuleIndex;
use crate::model::{Category, Rule};
use crate::recommend::{recommend, RecommendationBundle, ScenarioContext};
use crate::report::{self, CorpusStats, QualityReport};

/// A loaded corpus plus the scenarios it can be asked about.
///
/// Construction is the only mutation; every query borrows immutably, so a
/// shared `&RuleEngine` can serve concurrent callers without locking.
#[derive(Debug, Clone, Default)]
pub struct RuleEngine {
    index: RuleIndex,
    extra_bundles: BTreeMap<String, ScenarioContext>,
}

impl RuleEngine {
    /// Discover and index the corpus described by `config`.
    ///
    /// Only an invalid discovery pattern fails; a missing root or unreadable
    /// documents just shrink the corpus.
    pub fn initialize(config: &Config) -> Result<Self> {
        let discovery = Discovery::new(&config.patterns, &config.exclude)?;
        let index = RuleIndex::load(&config.root, &discovery);
        Ok(Self {
            index,
            extra_bundles: config.bundles.clone(),
        })
    }

    pub fn from_index(index: RuleIndex) -> Self {
        Self {
            index,
            extra_bundles: BTreeMap::new(),
        }
    }

    pub fn index(&self) -> &RuleIndex {
        &self.index
    }

    pub fn get_all_rules(&self) -> &[Rule] {
        self.index.all()
    }

    pub fn get_rule(&self, id: &str) -> Result<&Rule> {
        self.index
            .get(id)
            .ok_or_else(|| RuleError::NotFound(id.to_string()))
    }

    pub fn search_by_category(&self, category: Category) -> Vec<&Rule> {
        self.index.by_category(category)
    }

    pub fn search_by_language(&self, language: &str) -> Vec<&Rule> {
        self.index.by_language(language)
    }

    pub fn search_by_tags<S: AsRef<str>>(&self, tags: &[S]) -> Vec<&Rule> {
        self.index.by_tags(tags)
    }

    pub fn search(&self, query: &str) -> Vec<&Rule> {
        self.index.by_substring(query)
    }

    /// Rules named in `id`'s `related` list. Ids that do not resolve are dropped.
    pub fn get_related_rules(&self, id: &str) -> Result<Vec<&Rule>> {
        let rule = self.get_rule(id)?;
        Ok(self.resolve(&rule.metadata.related))
    }

    /// Rules named in `id`'s `prerequisites` list. Ids that do not resolve are dropped.
    pub fn get_prerequisites(&self, id: &str) -> Result<Vec<&Rule>> {
        let rule = self.get_rule(id)?;
        Ok(self.resolve(&rule.metadata.prerequisites))
    }

    fn resolve(&self, ids: &[String]) -> Vec<&Rule> {
        ids.iter().filter_map(|id| self.index.get(id)).collect()
    }

    pub fn recommend_bundle(&self, context: &ScenarioContext) -> RecommendationBundle<'_> {
        recommend(&self.index, context)
    }

    /// Every catalog bundle, recomputed against the current index.
    pub fn get_common_bundles(&self) -> BTreeMap<String, RecommendationBundle<'_>> {
        catalog::common_bundles(&self.index, &self.extra_bundles)
    }

    pub fn common_bundle(&self, name: &str) -> Result<RecommendationBundle<'_>> {
        let context = catalog::find_scenario(name, &self.extra_bundles)
            .ok_or_else(|| RuleError::UnknownBundle(name.to_string()))?;
        Ok(recommend(&self.index, &context))
    }

    pub fn bundle_names(&self) -> Vec<String> {
        let mut names: Vec<String> = catalog::common_scenarios()
            .into_iter()
            .map(|(name, _)| name.to_string())
            .collect();
        for name in self.extra_bundles.keys() {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
        names
    }

    pub fn stats(&self) -> CorpusStats {
        report::stats(&self.index)
    }

    pub fn check(&self) -> QualityReport {
        report::check(&self.index)
    }
}
