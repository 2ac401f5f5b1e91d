//! Input option structs for the public operations. Each carries the spec's
//! documented defaults via `Default`, so callers only set what they need to
//! override (`RememberOptions { importance: 0.9, ..Default::default() }`).

use ram_core::config::defaults;
use ram_core::memory::{Kind, Scope};

/// `kind: None` means "auto" — the engine classifies each kept chunk.
#[derive(Debug, Clone)]
pub struct RememberOptions {
    pub kind: Option<Kind>,
    pub scope: Scope,
    pub importance: f32,
    pub validity_score: f32,
    pub is_negative: bool,
}

impl Default for RememberOptions {
    fn default() -> Self {
        Self {
            kind: None,
            scope: Scope::Global,
            importance: 0.5,
            validity_score: 1.0,
            is_negative: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecallOptions {
    pub limit: usize,
    pub recall_limit: Option<usize>,
    pub scope: Option<Scope>,
}

impl RecallOptions {
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit,
            ..Default::default()
        }
    }
}

impl RecallOptions {
    pub fn normalized_limit(&self) -> usize {
        if self.limit == 0 {
            defaults::DEFAULT_RECALL_LIMIT
        } else {
            self.limit
        }
    }
}

#[derive(Debug, Clone)]
pub struct BuildContextOptions {
    pub limit: usize,
    pub max_chars: usize,
}

impl Default for BuildContextOptions {
    fn default() -> Self {
        Self {
            limit: defaults::DEFAULT_BUILD_CONTEXT_LIMIT,
            max_chars: defaults::DEFAULT_BUILD_CONTEXT_MAX_CHARS,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    pub scope: Option<Scope>,
    pub kind: Option<Kind>,
    pub query: Option<String>,
    pub limit: usize,
    pub offset: usize,
}

impl ListOptions {
    pub fn normalized_limit(&self) -> usize {
        if self.limit == 0 {
            defaults::DEFAULT_LIST_LIMIT
        } else {
            self.limit.clamp(1, defaults::DEFAULT_LIST_LIMIT_MAX)
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CountByKindOptions {
    pub scope: Option<Scope>,
    pub query: Option<String>,
}
