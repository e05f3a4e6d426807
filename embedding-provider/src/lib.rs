//! Embedding Client (spec §4.E): turns text into fixed-dimension vectors for
//! document- and chunk-level semantic search.
//!
//! Two interchangeable backends implement [`embedder::Embedder`]: a local
//! ONNX model driven in-process (`OnnxStdIoEmbedder`), and a deterministic
//! pseudo-embedder standing in for an HTTP-hosted model (`OnnxHttpEmbedder`).
//! Callers depend on the trait, not a concrete backend.

pub mod config;
pub mod embedder;
