// Single source of truth for all default values named in the component design.

// --- Embedding ---
pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = 384;

// --- Chunker ---
pub const DEFAULT_CHUNK_TOKENS: usize = 220;
pub const DEFAULT_OVERLAP_TOKENS: usize = 40;

// --- Storage ---
pub const DEFAULT_DB_FILENAME: &str = "memory.db";
pub const DEFAULT_WAL_MODE: bool = true;
pub const DEFAULT_MMAP_SIZE: u64 = 268_435_456; // 256 MB
pub const DEFAULT_CACHE_SIZE: i64 = -64_000; // 64 MB (negative = KB)
pub const DEFAULT_BUSY_TIMEOUT_MS: u32 = 5_000;
pub const DEFAULT_READ_POOL_SIZE: usize = 4;

// --- Dedup ---
pub const DEFAULT_DEDUP_THRESHOLD: f32 = 0.95;
pub const DEFAULT_DEDUP_PROBE_K: usize = 12;

// --- Recall metrics ---
pub const DEFAULT_RECALL_BOOST: f32 = 0.04;

// --- Scorer ---
pub const DEFAULT_VECTOR_WEIGHT: f64 = 0.6;
pub const DEFAULT_LEXICAL_WEIGHT: f64 = 0.2;
pub const DEFAULT_IMPORTANCE_WEIGHT: f64 = 0.1;
pub const DEFAULT_RECENCY_WEIGHT: f64 = 0.1;
pub const DEFAULT_NEGATIVE_PENALTY: f64 = 0.25;
pub const DEFAULT_FTS_BONUS: f64 = 0.4;
pub const DEFAULT_SUBSTRING_BONUS: f64 = 0.3;

// --- MMR ---
pub const DEFAULT_MMR_LAMBDA: f64 = 0.75;

// --- Classifier ---
pub const DEFAULT_PROTOTYPE_TOP_THRESHOLD: f64 = 0.52;
pub const DEFAULT_PROTOTYPE_TOP_MARGIN: f64 = 0.045;
pub const DEFAULT_PROTO_GATE_THRESHOLD: f64 = 0.35;
pub const DEFAULT_PROTO_GATE_DISCOUNT: f64 = 0.25;
pub const DEFAULT_COMBINED_PROTO_WEIGHT: f64 = 0.9;
pub const DEFAULT_COMBINED_DENSITY_WEIGHT: f64 = 0.1;
pub const DEFAULT_CONFIDENCE_FLOOR: f64 = 0.28;
pub const DEFAULT_LEARN_THRESHOLD: f64 = 0.93;
pub const DEFAULT_LEARNED_CAPACITY: usize = 64;
pub const DEFAULT_DENSITY_NEIGHBORS: usize = 20;

// --- Sibling expansion ---
pub const DEFAULT_SIBLING_WINDOW: i64 = 1;
pub const DEFAULT_SIBLING_VECTOR_PENALTY: f64 = 0.08;
pub const DEFAULT_SIBLING_LEXICAL_PENALTY: f64 = 0.05;
pub const DEFAULT_SIBLING_FINAL_PENALTY: f64 = 0.10;

// --- Recall ---
pub const DEFAULT_RECALL_LIMIT: usize = 8;
pub const DEFAULT_BUILD_CONTEXT_LIMIT: usize = 5;
pub const DEFAULT_BUILD_CONTEXT_MAX_CHARS: usize = 2400;
pub const DEFAULT_LIST_LIMIT: usize = 30;
pub const DEFAULT_LIST_LIMIT_MAX: usize = 200;
pub const DEFAULT_MARK_INVALID_SCORE: f32 = 0.2;

// --- Query-embedding cache ---
pub const DEFAULT_QUERY_EMBEDDING_CACHE_CAPACITY: usize = 512;
