use context_chunker::ChunkType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub chunk_id: String,
    pub project_id: String,
    pub file_path: String,
    pub content: String,
    pub start_line: usize,
    pub end_line: usize,
    pub chunk_type: ChunkType,
    pub name: Option<String>,
    pub parent_name: Option<String>,
    pub language: String,
    pub context: String,
    pub token_count: usize,
    /// Hash of the *source file* this chunk came from, as of embedding time
    /// (spec §3 ChunkRecord: "`fileHash` equals the hash that was current
    /// when the embedding was generated"). Not the chunk's own content hash.
    pub file_hash: String,
    pub embedding: Vec<f32>,
    /// Milliseconds since epoch when this record was written.
    pub timestamp: i64,
}

/// Filters applied during [`crate::VectorStore::search`]; `None` means "no
/// restriction on this dimension".
#[derive(Debug, Clone, Default)]
pub struct SearchFilter {
    pub file_path: Option<String>,
    pub language: Option<String>,
    pub chunk_type: Option<ChunkType>,
    pub project_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SearchHit {
    pub record: ChunkRecord,
    pub score: f32,
}

/// Aggregate counts returned by [`crate::VectorStore::get_stats`] (spec
/// §4.4). When computed with a `projectId`, every field is scoped to that
/// project; without one, it covers the diagnostic union of all projects.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StoreStats {
    pub total_chunks: usize,
    pub file_count: usize,
    pub language_counts: HashMap<String, usize>,
    pub type_counts: HashMap<ChunkType, usize>,
    pub last_updated: i64,
}
