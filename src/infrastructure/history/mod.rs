//! HistoryStore implementations.

pub mod jsonl;

pub use jsonl::JsonlHistoryStore;
