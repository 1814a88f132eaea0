use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::{ColoredString, Colorize};
use rulebook::config::DEFAULT_CONFIG_FILE;
use rulebook::{Category, Config, Focus, Priority, RecommendationBundle, Rule, RuleEngine, RuleMetadata, ScenarioContext};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// rulebook - Index rule documents and recommend bundles for a scenario
#[derive(Parser)]
#[command(name = "rulebook")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Corpus root (overrides the config file)
    #[arg(short, long, global = true)]
    root: Option<PathBuf>,

    /// Quiet mode - only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Verbose mode - log debug details
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List rules, optionally filtered
    List {
        /// Only rules in this category
        #[arg(long, value_enum)]
        category: Option<Category>,

        /// Only rules for this language (universal rules always match)
        #[arg(long)]
        language: Option<String>,

        /// Only rules carrying any of these tags (can be repeated)
        #[arg(short, long)]
        tag: Vec<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Case-insensitive search over titles, descriptions and bodies
    Search {
        /// Search text
        terms: Vec<String>,

        /// Maximum results to show
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,

        /// Show only file paths
        #[arg(short = 'l', long)]
        files_only: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show one rule with its full content
    Show {
        /// Rule id
        id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the rules a rule declares as related
    Related {
        /// Rule id
        id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the prerequisites a rule declares
    Prereqs {
        /// Rule id
        id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Recommend a rule bundle for a scenario
    Recommend {
        /// Task category
        #[arg(short = 't', long = "type", value_enum)]
        task_type: Category,

        /// Language in use
        #[arg(short, long)]
        language: Option<String>,

        /// Framework in use
        #[arg(short, long)]
        framework: Option<String>,

        /// Concerns to emphasize, in order (comma-separated or repeated)
        #[arg(long, value_enum, value_delimiter = ',')]
        focus: Vec<Focus>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the ready-made bundle catalog
    Bundles {
        /// Show a single bundle in full
        name: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show corpus statistics
    Stats {
        /// Show top N tags
        #[arg(long = "top", default_value = "20")]
        top_tags: usize,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Report duplicate ids and unresolved references
    Check {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Listing view: metadata and path, no body.
#[derive(Serialize)]
struct RuleSummary<'a> {
    #[serde(flatten)]
    metadata: &'a RuleMetadata,
    path: &'a str,
}

impl<'a> From<&'a Rule> for RuleSummary<'a> {
    fn from(rule: &'a Rule) -> Self {
        Self {
            metadata: &rule.metadata,
            path: &rule.path,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.quiet, cli.verbose);

    let result = load_engine(&cli.config, cli.root.as_deref()).and_then(|engine| run(&engine, cli.command));

    if let Err(e) = result {
        eprintln!("{}: {:#}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_logging(quiet: bool, verbose: bool) {
    let default_level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_engine(config_path: &Path, root: Option<&Path>) -> Result<RuleEngine> {
    let start = Instant::now();
    let mut config =
        Config::load(config_path).with_context(|| format!("loading config {}", config_path.display()))?;
    if let Some(root) = root {
        config.root = root.to_path_buf();
    }

    let engine = RuleEngine::initialize(&config).context("initializing rule index")?;
    tracing::debug!(
        "Indexed {} rules from {} in {:.2?}",
        engine.get_all_rules().len(),
        config.root.display(),
        start.elapsed()
    );
    Ok(engine)
}

fn run(engine: &RuleEngine, command: Commands) -> Result<()> {
    match command {
        Commands::List { category, language, tag, json } => cmd_list(engine, category, language.as_deref(), &tag, json),
        Commands::Search { terms, limit, files_only, json } => {
            cmd_search(engine, &terms.join(" "), limit, files_only, json)
        }
        Commands::Show { id, json } => cmd_show(engine, &id, json),
        Commands::Related { id, json } => {
            let rules = engine.get_related_rules(&id)?;
            print_rule_list(&rules, &format!("Related to {}", id), json)
        }
        Commands::Prereqs { id, json } => {
            let rules = engine.get_prerequisites(&id)?;
            print_rule_list(&rules, &format!("Prerequisites of {}", id), json)
        }
        Commands::Recommend { task_type, language, framework, focus, json } => {
            let mut context = ScenarioContext::new(task_type).with_priorities(focus);
            context.language = language;
            context.framework = framework;
            cmd_recommend(engine, &context, json)
        }
        Commands::Bundles { name, json } => cmd_bundles(engine, name.as_deref(), json),
        Commands::Stats { top_tags, json } => cmd_stats(engine, top_tags, json),
        Commands::Check { json } => cmd_check(engine, json),
    }
}

fn cmd_list(
    engine: &RuleEngine,
    category: Option<Category>,
    language: Option<&str>,
    tags: &[String],
    json: bool,
) -> Result<()> {
    let mut rules: Vec<&Rule> = engine.get_all_rules().iter().collect();

    if let Some(category) = category {
        let keep = engine.search_by_category(category);
        rules.retain(|r| keep.iter().any(|k| std::ptr::eq(*k, *r)));
    }
    if let Some(language) = language {
        let keep = engine.search_by_language(language);
        rules.retain(|r| keep.iter().any(|k| std::ptr::eq(*k, *r)));
    }
    if !tags.is_empty() {
        let keep = engine.search_by_tags(tags);
        rules.retain(|r| keep.iter().any(|k| std::ptr::eq(*k, *r)));
    }

    print_rule_list(&rules, "Rules", json)
}

fn cmd_search(engine: &RuleEngine, query: &str, limit: usize, files_only: bool, json: bool) -> Result<()> {
    if query.trim().is_empty() {
        bail!("search needs at least one term");
    }

    let mut results = engine.search(query);
    results.truncate(limit);

    if json {
        let summaries: Vec<RuleSummary> = results.iter().map(|r| RuleSummary::from(*r)).collect();
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    if results.is_empty() {
        println!("{}", "No results found.".yellow());
        return Ok(());
    }

    if files_only {
        for rule in results {
            println!("{}", rule.path);
        }
        return Ok(());
    }

    println!("{} results for: {}\n", results.len().to_string().green().bold(), query.cyan());
    for rule in results {
        print_rule_line(rule);
    }
    Ok(())
}

fn cmd_show(engine: &RuleEngine, id: &str, json: bool) -> Result<()> {
    let rule = engine.get_rule(id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(rule)?);
        return Ok(());
    }

    let meta = &rule.metadata;
    println!("{}", meta.title.green().bold());
    println!();
    println!("  Id:           {}", meta.id.cyan());
    println!("  Path:         {}", rule.path);
    println!("  Category:     {}", meta.category);
    println!("  Language:     {}", meta.language);
    println!("  Priority:     {}", priority_label(meta.priority));
    println!("  Tags:         {}", meta.tags.iter().cloned().collect::<Vec<_>>().join(", "));
    if let Some(description) = &meta.description {
        println!("  Description:  {}", description);
    }
    if let Some(difficulty) = &meta.difficulty {
        println!("  Difficulty:   {}", difficulty);
    }
    if !meta.frameworks().is_empty() {
        println!("  Frameworks:   {}", meta.frameworks().join(", "));
    }
    if !meta.prerequisites.is_empty() {
        println!("  Requires:     {}", meta.prerequisites.join(", "));
    }
    if !meta.related.is_empty() {
        println!("  Related:      {}", meta.related.join(", "));
    }
    println!();
    println!("{}", "-".repeat(60).dimmed());
    println!("{}", rule.content.trim_end());
    Ok(())
}

fn cmd_recommend(engine: &RuleEngine, context: &ScenarioContext, json: bool) -> Result<()> {
    let bundle = engine.recommend_bundle(context);
    if json {
        println!("{}", serde_json::to_string_pretty(&bundle_json(&bundle))?);
        return Ok(());
    }
    print_bundle(&bundle);
    Ok(())
}

fn cmd_bundles(engine: &RuleEngine, name: Option<&str>, json: bool) -> Result<()> {
    if let Some(name) = name {
        let bundle = engine.common_bundle(name)?;
        if json {
            println!("{}", serde_json::to_string_pretty(&bundle_json(&bundle))?);
        } else {
            print_bundle(&bundle);
        }
        return Ok(());
    }

    let bundles = engine.get_common_bundles();
    if json {
        let output: serde_json::Map<String, serde_json::Value> = bundles
            .iter()
            .map(|(key, bundle)| (key.clone(), bundle_json(bundle)))
            .collect();
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("{}", "Bundle Catalog".green().bold());
    println!();
    for key in engine.bundle_names() {
        if let Some(bundle) = bundles.get(&key) {
            println!("  {:<28} {:>3} rules  {}", key.cyan(), bundle.rules.len(), bundle.description.dimmed());
        }
    }
    Ok(())
}

fn cmd_stats(engine: &RuleEngine, top_tags: usize, json: bool) -> Result<()> {
    let stats = engine.stats();

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("{}", "Corpus Statistics".green().bold());
    println!();
    println!("  Total rules:      {}", stats.total_rules.to_string().cyan());
    println!("  Unique tags:      {}", stats.by_tag.len().to_string().cyan());
    println!("  Languages:        {}", stats.by_language.len().to_string().cyan());
    println!();

    println!("{}", "By Category".green().bold());
    for category in Category::ALL {
        let count = stats.by_category.get(category.as_str()).copied().unwrap_or(0);
        println!("  {:>20} {:>4} {}", category.as_str().cyan(), count, bar(count));
    }
    println!();

    println!("{}", "By Priority".green().bold());
    for priority in Priority::ALL {
        let count = stats.by_priority.get(priority.as_str()).copied().unwrap_or(0);
        println!("  {:>20} {:>4} {}", priority_label(priority), count, bar(count));
    }
    println!();

    println!("{}", "By Language".green().bold());
    for (language, count) in &stats.by_language {
        println!("  {:>20} {:>4} {}", language.cyan(), count, bar(*count));
    }
    println!();

    println!("{}", format!("Top {} Tags", top_tags).green().bold());
    for (tag, count) in stats.top_tags(top_tags) {
        println!("  {:>20} {:>4} {}", tag.cyan(), count, bar(count));
    }

    Ok(())
}

fn cmd_check(engine: &RuleEngine, json: bool) -> Result<()> {
    let report = engine.check();

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if report.is_clean() {
        println!("{}", "No problems found.".green());
    } else {
        for (id, paths) in &report.duplicate_ids {
            println!("{} {} defined in {}", "duplicate id".red().bold(), id.yellow(), paths.join(", "));
        }
        for broken in &report.broken_references {
            let kind = match broken.kind {
                rulebook::report::ReferenceKind::Related => "related",
                rulebook::report::ReferenceKind::Prerequisite => "prerequisite",
            };
            println!(
                "{} {} ({}) -> {} {}",
                "unresolved".red().bold(),
                broken.rule_id.cyan(),
                broken.path.dimmed(),
                kind,
                broken.target.yellow()
            );
        }
    }

    if !report.is_clean() {
        let problems = report.duplicate_ids.len() + report.broken_references.len();
        bail!("corpus check found {} problem(s)", problems);
    }
    Ok(())
}

// Helper functions

fn bundle_json(bundle: &RecommendationBundle<'_>) -> serde_json::Value {
    let rules: Vec<RuleSummary> = bundle.rules.iter().map(|r| RuleSummary::from(*r)).collect();
    serde_json::json!({
        "name": bundle.name,
        "description": bundle.description,
        "scenarios": bundle.scenarios,
        "rules": rules,
    })
}

fn print_bundle(bundle: &RecommendationBundle<'_>) {
    println!("{}", bundle.name.green().bold());
    println!("{}", bundle.description.dimmed());
    println!();
    if bundle.scenarios.is_empty() {
        println!("{}", "No rules matched this scenario.".yellow());
        return;
    }
    println!("  Scenarios: {}", bundle.scenarios.join(", ").cyan());
    println!();
    for rule in &bundle.rules {
        print_rule_line(rule);
    }
}

fn print_rule_list(rules: &[&Rule], heading: &str, json: bool) -> Result<()> {
    if json {
        let summaries: Vec<RuleSummary> = rules.iter().map(|r| RuleSummary::from(*r)).collect();
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    if rules.is_empty() {
        println!("{}", "No rules found.".yellow());
        return Ok(());
    }

    println!("{} ({})\n", heading.green().bold(), rules.len());
    for rule in rules {
        print_rule_line(rule);
    }
    Ok(())
}

fn print_rule_line(rule: &Rule) {
    let meta = &rule.metadata;
    println!(
        "  {:>8}  {}  {} {}",
        priority_label(meta.priority),
        meta.id.cyan(),
        meta.title,
        format!("[{} / {}]", meta.category, meta.language).dimmed()
    );
}

fn priority_label(priority: Priority) -> ColoredString {
    match priority {
        Priority::Critical => priority.as_str().red().bold(),
        Priority::High => priority.as_str().yellow(),
        Priority::Medium => priority.as_str().normal(),
        Priority::Low => priority.as_str().dimmed(),
    }
}

fn bar(count: usize) -> ColoredString {
    "=".repeat(count.min(40)).dimmed()
}
