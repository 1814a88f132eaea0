//! rulebook - index a corpus of markdown rule documents and recommend
//! de-duplicated, priority-ordered bundles of them for a scenario.
//!
//! ```no_run
//! use rulebook::{Category, Config, Focus, RuleEngine, ScenarioContext};
//!
//! let engine = RuleEngine::initialize(&Config::default())?;
//! let context = ScenarioContext::new(Category::Coding)
//!     .with_language("python")
//!     .with_priorities([Focus::Security]);
//! for rule in engine.recommend_bundle(&context).rules {
//!     println!("{} ({})", rule.metadata.title, rule.priority());
//! }
//! # Ok::<(), rulebook::RuleError>(())
//! ```

pub mod catalog;
pub mod config;
pub mod discovery;
pub mod engine;
pub mod error;
pub mod extract;
pub mod frontmatter;
pub mod index;
pub mod model;
pub mod recommend;
pub mod report;

pub use config::Config;
pub use engine::RuleEngine;
pub use error::{Result, RuleError};
pub use index::RuleIndex;
pub use model::{Category, Focus, LanguageSpec, Priority, Rule, RuleMetadata};
pub use recommend::{RecommendationBundle, ScenarioContext};
