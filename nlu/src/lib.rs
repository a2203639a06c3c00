pub mod segment;
pub mod wordvec;

pub use segment::{CjkSegmenter, Segmenter, Token};
pub use wordvec::{HashEmbeddingModel, WordVectors};
