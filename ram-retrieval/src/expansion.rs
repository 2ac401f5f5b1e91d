//! C4: maps a raw query to a small, ordered, deduplicated set of expansion
//! strings via a static alias table. No synonym model, no embedding lookup —
//! the table below is intentionally small and hand-curated, matching the
//! teacher's static keyword tables (`cortex-retrieval::intent::classifier`).

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

/// `\p{L}\p{N}` already covers CJK ideographs (they are `\p{L}` under
/// Unicode), so a single letter/digit-run pattern realizes "Unicode
/// letter/digit runs plus CJK" without a separate range.
fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[\p{L}\p{N}]+").unwrap())
}

/// Lowercased token runs, in order of appearance. Shared with the scorer
/// (C5), which tokenizes query and content the same way for lexical overlap.
pub fn tokenize(text: &str) -> Vec<String> {
    token_pattern()
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .collect()
}

/// `token -> expansion phrases`. Small and hand-curated; extend as real
/// query logs surface gaps, not speculatively.
const ALIASES: &[(&str, &[&str])] = &[
    ("db", &["database", "sqlite", "storage"]),
    ("llm", &["language model", "large language model"]),
    ("api", &["interface", "endpoint"]),
    ("ui", &["interface", "frontend"]),
    ("auth", &["authentication", "authorization", "login"]),
    ("config", &["configuration", "settings"]),
    ("repo", &["repository", "codebase"]),
    ("fn", &["function", "method"]),
    ("perf", &["performance", "latency", "speed"]),
    ("id", &["identifier", "uuid"]),
    ("ann", &["vector index", "nearest neighbor"]),
    ("fts", &["full text search", "lexical search"]),
];

fn lookup(token: &str) -> Option<&'static [&'static str]> {
    ALIASES
        .iter()
        .find(|(key, _)| *key == token)
        .map(|(_, aliases)| *aliases)
}

/// Produce the ordered, deduplicated expansion set for `query`. Empty input
/// (after trimming) yields an empty result. The query itself is always
/// first; for each recognized token, both the bare alias and `"<query>
/// <alias>"` are appended, in alias-table order.
pub fn expand_query(query: &str) -> Vec<String> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    let mut seen = HashSet::new();
    let mut out = Vec::new();
    let mut push = |seen: &mut HashSet<String>, out: &mut Vec<String>, s: String| {
        if seen.insert(s.clone()) {
            out.push(s);
        }
    };

    push(&mut seen, &mut out, trimmed.to_string());

    for token in tokenize(trimmed) {
        if let Some(aliases) = lookup(&token) {
            for alias in aliases {
                push(&mut seen, &mut out, alias.to_string());
                push(&mut seen, &mut out, format!("{trimmed} {alias}"));
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_query_yields_empty_result() {
        assert!(expand_query("   ").is_empty());
    }

    #[test]
    fn unrecognized_tokens_pass_through_unexpanded() {
        assert_eq!(expand_query("freedom is the goal"), vec!["freedom is the goal"]);
    }

    #[test]
    fn db_tuning_expands_per_spec_example() {
        let out = expand_query("db tuning");
        assert!(out.contains(&"db tuning".to_string()));
        assert!(out.contains(&"database".to_string()));
        assert!(out.contains(&"db tuning database".to_string()));
    }

    #[test]
    fn expansions_are_deduplicated_and_ordered() {
        let out = expand_query("db db");
        let database_count = out.iter().filter(|s| *s == "database").count();
        assert_eq!(database_count, 1);
        assert_eq!(out[0], "db db");
    }

    #[test]
    fn cjk_tokens_are_captured() {
        let tokens = tokenize("数据库 db");
        assert!(tokens.contains(&"数据库".to_string()));
        assert!(tokens.contains(&"db".to_string()));
    }
}
