//! Text processing module for TTS: fixed-size chunking and request splitting.

pub mod chunker;
pub mod splitter;

pub use chunker::process_text;
pub use splitter::split_for_requests;

/// A chunk of text ready for TTS processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    /// Position of the chunk in the document text
    pub chunk_id: usize,
    /// The text content
    pub text: String,
}

impl TextChunk {
    /// Create a new text chunk.
    pub fn new(chunk_id: usize, text: String) -> Self {
        Self { chunk_id, text }
    }
}
