//! Resume text processing: structure, skills and embeddings

pub mod document;
pub mod embeddings;
pub mod skills;
pub mod text_processor;
