//! Engine-wide tunables. One `EngineConfig` aggregate, every section
//! `#[serde(default)]` against the constants in [`defaults`].

pub mod defaults;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkerConfig {
    pub chunk_tokens: usize,
    pub overlap_tokens: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            chunk_tokens: defaults::DEFAULT_CHUNK_TOKENS,
            overlap_tokens: defaults::DEFAULT_OVERLAP_TOKENS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub db_filename: String,
    pub wal_mode: bool,
    pub mmap_size: u64,
    pub cache_size: i64,
    pub busy_timeout_ms: u32,
    pub read_pool_size: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_filename: defaults::DEFAULT_DB_FILENAME.to_string(),
            wal_mode: defaults::DEFAULT_WAL_MODE,
            mmap_size: defaults::DEFAULT_MMAP_SIZE,
            cache_size: defaults::DEFAULT_CACHE_SIZE,
            busy_timeout_ms: defaults::DEFAULT_BUSY_TIMEOUT_MS,
            read_pool_size: defaults::DEFAULT_READ_POOL_SIZE,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    pub threshold: f32,
    pub ann_probe_k: usize,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            threshold: defaults::DEFAULT_DEDUP_THRESHOLD,
            ann_probe_k: defaults::DEFAULT_DEDUP_PROBE_K,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct RecallMetricConfig {
    pub boost: f32,
}

impl Default for RecallMetricConfig {
    fn default() -> Self {
        Self {
            boost: defaults::DEFAULT_RECALL_BOOST,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ScorerConfig {
    pub vector_weight: f64,
    pub lexical_weight: f64,
    pub importance_weight: f64,
    pub recency_weight: f64,
    pub negative_penalty: f64,
    pub fts_bonus: f64,
    pub substring_bonus: f64,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            vector_weight: defaults::DEFAULT_VECTOR_WEIGHT,
            lexical_weight: defaults::DEFAULT_LEXICAL_WEIGHT,
            importance_weight: defaults::DEFAULT_IMPORTANCE_WEIGHT,
            recency_weight: defaults::DEFAULT_RECENCY_WEIGHT,
            negative_penalty: defaults::DEFAULT_NEGATIVE_PENALTY,
            fts_bonus: defaults::DEFAULT_FTS_BONUS,
            substring_bonus: defaults::DEFAULT_SUBSTRING_BONUS,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct MmrConfig {
    pub lambda: f64,
}

impl Default for MmrConfig {
    fn default() -> Self {
        Self {
            lambda: defaults::DEFAULT_MMR_LAMBDA,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub prototype_top_threshold: f64,
    pub prototype_top_margin: f64,
    pub proto_gate_threshold: f64,
    pub proto_gate_discount: f64,
    pub combined_proto_weight: f64,
    pub combined_density_weight: f64,
    pub confidence_floor: f64,
    pub learn_threshold: f64,
    pub learned_capacity: usize,
    pub density_neighbors: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            prototype_top_threshold: defaults::DEFAULT_PROTOTYPE_TOP_THRESHOLD,
            prototype_top_margin: defaults::DEFAULT_PROTOTYPE_TOP_MARGIN,
            proto_gate_threshold: defaults::DEFAULT_PROTO_GATE_THRESHOLD,
            proto_gate_discount: defaults::DEFAULT_PROTO_GATE_DISCOUNT,
            combined_proto_weight: defaults::DEFAULT_COMBINED_PROTO_WEIGHT,
            combined_density_weight: defaults::DEFAULT_COMBINED_DENSITY_WEIGHT,
            confidence_floor: defaults::DEFAULT_CONFIDENCE_FLOOR,
            learn_threshold: defaults::DEFAULT_LEARN_THRESHOLD,
            learned_capacity: defaults::DEFAULT_LEARNED_CAPACITY,
            density_neighbors: defaults::DEFAULT_DENSITY_NEIGHBORS,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct SiblingExpansionConfig {
    pub window: i64,
    pub vector_penalty: f64,
    pub lexical_penalty: f64,
    pub final_penalty: f64,
}

impl Default for SiblingExpansionConfig {
    fn default() -> Self {
        Self {
            window: defaults::DEFAULT_SIBLING_WINDOW,
            vector_penalty: defaults::DEFAULT_SIBLING_VECTOR_PENALTY,
            lexical_penalty: defaults::DEFAULT_SIBLING_LEXICAL_PENALTY,
            final_penalty: defaults::DEFAULT_SIBLING_FINAL_PENALTY,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryCacheConfig {
    pub capacity: usize,
}

impl Default for QueryCacheConfig {
    fn default() -> Self {
        Self {
            capacity: defaults::DEFAULT_QUERY_EMBEDDING_CACHE_CAPACITY,
        }
    }
}

/// Every tunable named in the component design, composed from section
/// defaults. `Default::default()` reproduces the specified behavior exactly;
/// overrides come from TOML via [`EngineConfig::from_toml_str`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub chunker: ChunkerConfig,
    pub storage: StorageConfig,
    pub dedup: DedupConfig,
    pub recall_metrics: RecallMetricConfig,
    pub scorer: ScorerConfig,
    pub mmr: MmrConfig,
    pub classifier: ClassifierConfig,
    pub sibling_expansion: SiblingExpansionConfig,
    pub query_cache: QueryCacheConfig,
}

impl EngineConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }
}
