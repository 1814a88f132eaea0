//! Metadata extraction: raw document text in, [`RuleMetadata`] out.
//!
//! Explicit front-matter always wins. Missing fields are inferred from the
//! document path and body, so every document yields valid metadata.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;
use std::path::Path;

use crate::frontmatter::{self, FrontMatter};
use crate::model::{Applicability, Category, LanguageSpec, Priority, Rule, RuleMetadata, FALLBACK_TAG};

struct LanguagePattern {
    needle: &'static str,
    token: &'static str,
    /// Needles too common in prose only count when they appear in the filename.
    scan_body: bool,
}

const LANGUAGES: &[LanguagePattern] = &[
    LanguagePattern { needle: "python", token: "python", scan_body: true },
    LanguagePattern { needle: "javascript", token: "javascript", scan_body: true },
    LanguagePattern { needle: "typescript", token: "typescript", scan_body: true },
    LanguagePattern { needle: "java", token: "java", scan_body: true },
    LanguagePattern { needle: "c#", token: "csharp", scan_body: true },
    LanguagePattern { needle: "csharp", token: "csharp", scan_body: true },
    LanguagePattern { needle: "c++", token: "cpp", scan_body: true },
    LanguagePattern { needle: "cpp", token: "cpp", scan_body: true },
    LanguagePattern { needle: "golang", token: "go", scan_body: true },
    LanguagePattern { needle: "go", token: "go", scan_body: false },
    LanguagePattern { needle: "rust", token: "rust", scan_body: true },
    LanguagePattern { needle: "ruby", token: "ruby", scan_body: true },
    LanguagePattern { needle: "php", token: "php", scan_body: true },
    LanguagePattern { needle: "swift", token: "swift", scan_body: true },
    LanguagePattern { needle: "kotlin", token: "kotlin", scan_body: true },
    LanguagePattern { needle: "scala", token: "scala", scan_body: true },
    LanguagePattern { needle: "sql", token: "sql", scan_body: true },
    LanguagePattern { needle: "bash", token: "shell", scan_body: true },
    LanguagePattern { needle: "shell", token: "shell", scan_body: false },
];

// Word-ish boundaries that still treat `+` and `#` as part of a token,
// so "c" never matches inside "c++" and "java" never inside "javascript".
static LANGUAGE_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    LANGUAGES
        .iter()
        .map(|p| {
            let pattern = format!(r"(?:^|[^a-z+#]){}(?:$|[^a-z+#])", regex::escape(p.needle));
            Regex::new(&pattern).expect("language patterns are valid regexes")
        })
        .collect()
});

static TITLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#\s+(.+?)\s*$").expect("title pattern is a valid regex"));

/// Keyword found in filename or body -> tags it implies.
const TAG_KEYWORDS: &[(&str, &[&str])] = &[
    ("performance", &["performance", "optimization"]),
    ("security", &["security", "safety"]),
    ("testing", &["testing", "tdd", "unit-tests"]),
    ("accessibility", &["accessibility", "a11y"]),
    ("maintainability", &["maintainability", "clean-code"]),
    ("refactor", &["refactoring", "maintainability"]),
    ("documentation", &["documentation"]),
    ("error handling", &["error-handling"]),
    ("debugging", &["debugging"]),
    ("code review", &["code-review"]),
    ("deployment", &["deployment"]),
    ("architecture", &["architecture", "design"]),
    ("database", &["database"]),
];

/// Parse `raw` and build the full [`Rule`] for the document at `path`.
///
/// `path` is relative to the corpus root and uses `/` separators.
pub fn extract_rule(path: &str, raw: &str) -> Rule {
    let (header, body) = frontmatter::split(raw);
    let metadata = build_metadata(path, header.unwrap_or_default(), body);
    Rule {
        metadata,
        path: path.to_string(),
        content: body.to_string(),
    }
}

/// Metadata for the document at `path`. Never fails.
pub fn extract(path: &str, raw: &str) -> RuleMetadata {
    let (header, body) = frontmatter::split(raw);
    build_metadata(path, header.unwrap_or_default(), body)
}

fn build_metadata(path: &str, header: FrontMatter, body: &str) -> RuleMetadata {
    let file_name = Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(path)
        .to_lowercase();
    let body_lower = body.to_lowercase();
    let default_id = default_id(path);

    let id = header
        .id
        .as_deref()
        .map(normalize_id)
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| default_id.clone());

    let title = header
        .title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .or_else(|| first_heading(body))
        .unwrap_or_else(|| title_case(&default_id));

    let category = header
        .category
        .as_deref()
        .and_then(|c| {
            let parsed = Category::parse(c);
            if parsed.is_none() {
                tracing::debug!("{path}: unknown category {c:?}, inferring from path");
            }
            parsed
        })
        .unwrap_or_else(|| infer_category(path));

    let language = header
        .language
        .and_then(canonical_spec)
        .unwrap_or_else(|| infer_language(&file_name, &body_lower));

    let declared_tags: BTreeSet<String> = header
        .tags
        .iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect();
    let tags = if declared_tags.is_empty() {
        infer_tags(&file_name, &body_lower)
    } else {
        declared_tags
    };

    let priority = header
        .priority
        .as_deref()
        .and_then(Priority::parse)
        .unwrap_or_default();

    let applicability = header.applicability.map(|a| Applicability {
        scenarios: a.scenarios,
        frameworks: a.frameworks,
        environments: a.environments,
    });

    RuleMetadata {
        id,
        title,
        category,
        subcategory: header.subcategory,
        language,
        tags,
        priority,
        difficulty: header.difficulty,
        description: header.description,
        prerequisites: normalize_ids(&header.prerequisites),
        related: normalize_ids(&header.related),
        applicability,
        outcomes: header.outcomes,
        version: header.version,
        last_updated: header.last_updated,
        author: header.author,
        references: header.references,
    }
}

/// Lowercase, hyphen-separated form used for every rule id.
pub fn normalize_id(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    let mut out = String::with_capacity(lowered.len());
    for ch in lowered.chars() {
        let ch = if ch.is_whitespace() || ch == '_' { '-' } else { ch };
        if ch == '-' && (out.is_empty() || out.ends_with('-')) {
            continue;
        }
        out.push(ch);
    }
    out.trim_end_matches('-').to_string()
}

fn normalize_ids(ids: &[String]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    ids.iter()
        .map(|id| normalize_id(id))
        .filter(|id| !id.is_empty() && seen.insert(id.clone()))
        .collect()
}

/// Filename stem, except a bare `rules.md` borrows its directory name.
fn default_id(path: &str) -> String {
    let p = Path::new(path);
    let stem = p.file_stem().and_then(|s| s.to_str()).unwrap_or(path);
    let parent = p
        .parent()
        .and_then(|d| d.file_name())
        .and_then(|d| d.to_str())
        .filter(|d| !d.is_empty());

    match parent {
        Some(dir) if stem.eq_ignore_ascii_case("rules") => normalize_id(&format!("{dir}-rules")),
        _ => normalize_id(stem),
    }
}

fn first_heading(body: &str) -> Option<String> {
    let mut in_fence = false;
    for line in body.lines() {
        if line.trim_start().starts_with("```") {
            in_fence = !in_fence;
            continue;
        }
        if in_fence {
            continue;
        }
        if let Some(caps) = TITLE_RE.captures(line) {
            let text = caps.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
            if !text.is_empty() {
                return Some(text.to_string());
            }
        }
    }
    None
}

fn title_case(stem: &str) -> String {
    stem.split(['-', '_', ' '])
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn infer_category(path: &str) -> Category {
    path.split('/')
        .next()
        .and_then(Category::parse)
        .unwrap_or(Category::General)
}

/// Map an alias (`c#`, `golang`, `C++`) to its canonical token.
pub fn canonical_language(token: &str) -> String {
    let lowered = token.trim().to_lowercase();
    LANGUAGES
        .iter()
        .find(|p| p.needle == lowered)
        .map(|p| p.token.to_string())
        .unwrap_or(lowered)
}

fn canonical_spec(spec: LanguageSpec) -> Option<LanguageSpec> {
    match spec {
        LanguageSpec::One(t) => {
            let t = canonical_language(&t);
            (!t.is_empty()).then_some(LanguageSpec::One(t))
        }
        LanguageSpec::Many(set) => {
            let set: BTreeSet<String> = set
                .iter()
                .map(|t| canonical_language(t))
                .filter(|t| !t.is_empty())
                .collect();
            (!set.is_empty()).then_some(LanguageSpec::Many(set))
        }
    }
}

/// Filename match wins outright; otherwise every language named in the
/// body is collected.
fn infer_language(file_name: &str, body_lower: &str) -> LanguageSpec {
    for (pattern, re) in LANGUAGES.iter().zip(LANGUAGE_RES.iter()) {
        if re.is_match(file_name) {
            return LanguageSpec::One(pattern.token.to_string());
        }
    }

    let found: BTreeSet<String> = LANGUAGES
        .iter()
        .zip(LANGUAGE_RES.iter())
        .filter(|(pattern, re)| pattern.scan_body && re.is_match(body_lower))
        .map(|(pattern, _)| pattern.token.to_string())
        .collect();

    if found.is_empty() {
        LanguageSpec::universal()
    } else {
        LanguageSpec::Many(found)
    }
}

fn infer_tags(file_name: &str, body_lower: &str) -> BTreeSet<String> {
    let mut tags: BTreeSet<String> = TAG_KEYWORDS
        .iter()
        .filter(|(keyword, _)| file_name.contains(keyword) || body_lower.contains(keyword))
        .flat_map(|(_, implied)| implied.iter().map(|t| t.to_string()))
        .collect();

    if tags.is_empty() {
        tags.insert(FALLBACK_TAG.to_string());
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::UNIVERSAL;
    use pretty_assertions::assert_eq;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_extract_infers_everything_from_path_and_body() {
        let raw = "# Python Development Rules\n\nAlways write testing code first.\n";
        let meta = extract("coding/python-rules.md", raw);

        assert_eq!(meta.id, "python-rules");
        assert_eq!(meta.title, "Python Development Rules");
        assert_eq!(meta.category, Category::Coding);
        assert_eq!(meta.language, LanguageSpec::One("python".to_string()));
        assert!(meta.tags.is_superset(&set(&["testing", "tdd", "unit-tests"])));
        assert_eq!(meta.priority, Priority::Medium);
        assert!(meta.description.is_none());
        assert!(meta.applicability.is_none());
    }

    #[test]
    fn test_header_fields_win() {
        let raw = "---\nid: Secure_Input\ntitle: Input Handling\ncategory: security\nlanguage: C#\ntags: [Validation]\npriority: critical\ndescription: Validate everything\nrelated: [Other Rule]\napplicability:\n  frameworks: [aspnet]\n---\n# Ignored Heading\nperformance matters\n";
        let meta = extract("coding/misc-rules.md", raw);

        assert_eq!(meta.id, "secure-input");
        assert_eq!(meta.title, "Input Handling");
        assert_eq!(meta.category, Category::Security);
        assert_eq!(meta.language, LanguageSpec::One("csharp".to_string()));
        assert_eq!(meta.tags, set(&["validation"]));
        assert_eq!(meta.priority, Priority::Critical);
        assert_eq!(meta.description.as_deref(), Some("Validate everything"));
        assert_eq!(meta.related, vec!["other-rule"]);
        assert_eq!(meta.frameworks(), ["aspnet".to_string()]);
    }

    #[test]
    fn test_tag_fallback() {
        let meta = extract("writing/style-rules.md", "# Style\n\nKeep sentences short.\n");
        assert_eq!(meta.tags, set(&[FALLBACK_TAG]));
    }

    #[test]
    fn test_title_falls_back_to_filename() {
        let meta = extract("general/ai_operations-rules.md", "No heading here.\n## Sub heading only\n");
        assert_eq!(meta.title, "Ai Operations Rules");
    }

    #[test]
    fn test_title_skips_fenced_code() {
        let raw = "```bash\n# not a title\n```\n# Real Title\n";
        assert_eq!(extract("x-rules.md", raw).title, "Real Title");
    }

    #[test]
    fn test_bare_rules_md_takes_directory_name() {
        let meta = extract("coding/rust/rules.md", "# Rust\n");
        assert_eq!(meta.id, "rust-rules");
        assert_eq!(meta.category, Category::Coding);

        let top = extract("rules.md", "plain\n");
        assert_eq!(top.id, "rules");
        assert_eq!(top.category, Category::General);
    }

    #[test]
    fn test_unknown_directory_is_general() {
        assert_eq!(extract("misc/foo-rules.md", "").category, Category::General);
        assert_eq!(extract("top-rules.md", "").category, Category::General);
    }

    #[test]
    fn test_invalid_header_category_is_inferred() {
        let meta = extract("data/etl-rules.md", "---\ncategory: nonsense\n---\nbody");
        assert_eq!(meta.category, Category::Data);
    }

    #[test]
    fn test_language_from_body_collects_all() {
        let raw = "Use TypeScript on the frontend and Rust on the backend. Java is legacy.";
        let meta = extract("coding/stack-rules.md", raw);
        assert_eq!(meta.language, LanguageSpec::Many(set(&["java", "rust", "typescript"])));
    }

    #[test]
    fn test_language_boundaries() {
        let meta = extract("coding/web-rules.md", "javascript only, we trust the good process");
        assert_eq!(meta.language, LanguageSpec::Many(set(&["javascript"])));

        let cpp = extract("coding/cpp-rules.md", "");
        assert_eq!(cpp.language, LanguageSpec::One("cpp".to_string()));

        let csharp = extract("coding/native-rules.md", "Prefer C# records.");
        assert_eq!(csharp.language, LanguageSpec::Many(set(&["csharp"])));
    }

    #[test]
    fn test_language_ignores_version_digits() {
        let meta = extract("coding/python3-rules.md", "");
        assert_eq!(meta.language, LanguageSpec::One("python".to_string()));

        let body = extract("coding/build-rules.md", "Targets c++17 and python3.12.");
        assert_eq!(body.language, LanguageSpec::Many(set(&["cpp", "python"])));
    }

    #[test]
    fn test_language_universal_when_nothing_matches() {
        let meta = extract("general/thinking-rules.md", "Think before acting.");
        assert_eq!(meta.language, LanguageSpec::One(UNIVERSAL.to_string()));
    }

    #[test]
    fn test_go_only_from_filename() {
        assert_eq!(extract("coding/go-rules.md", "").language, LanguageSpec::One("go".to_string()));
        assert!(extract("coding/misc-rules.md", "go to the store").language.is_universal());
    }

    #[test]
    fn test_unknown_priority_defaults_to_medium() {
        let meta = extract("x-rules.md", "---\npriority: urgent\n---\n");
        assert_eq!(meta.priority, Priority::Medium);
    }

    #[test]
    fn test_normalize_id() {
        assert_eq!(normalize_id("  Hello World "), "hello-world");
        assert_eq!(normalize_id("snake__case_id"), "snake-case-id");
        assert_eq!(normalize_id("already-fine"), "already-fine");
    }

    #[test]
    fn test_canonical_language() {
        assert_eq!(canonical_language("C#"), "csharp");
        assert_eq!(canonical_language("golang"), "go");
        assert_eq!(canonical_language("Elixir"), "elixir");
    }

    #[test]
    fn test_leading_thematic_break_is_not_a_header() {
        let raw = "---\n# Secure Coding Guide\n\nAlways review security of inputs.\n---\nFooter notes.\n";
        let rule = extract_rule("coding/guide-rules.md", raw);

        assert_eq!(rule.metadata.title, "Secure Coding Guide");
        assert!(rule.metadata.tags.contains("security"));
        assert_eq!(rule.content, raw);
    }

    #[test]
    fn test_extract_rule_keeps_body_without_header() {
        let rule = extract_rule("general/core-rules.md", "---\npriority: high\n---\n# Core\ntext\n");
        assert_eq!(rule.content, "# Core\ntext\n");
        assert_eq!(rule.path, "general/core-rules.md");
        assert_eq!(rule.priority(), Priority::High);
    }
}
