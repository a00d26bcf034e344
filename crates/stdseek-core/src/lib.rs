//! # stdseek core
//!
//! Runtime-free logic shared by every stdseek frontend: the standard record
//! model, identifier normalization and status mapping, merge/dedup and
//! ranking, latency-driven source priority, result selection policies, the
//! bounded LRU used by the memory cache tier, and the persistence contract
//! ([`store::HistoryStore`]) with an in-memory implementation.
//!
//! This crate contains no tokio, sqlx, network or filesystem I/O. Anything
//! that depends on wall-clock time takes a [`clock::Clock`] so it can be
//! driven deterministically from tests.

pub mod clock;
pub mod error;
pub mod lru;
pub mod merge;
pub mod models;
pub mod normalize;
pub mod priority;
pub mod select;
pub mod store;

pub use error::{Error, Result, SourceError};
pub use models::{Availability, StandardRecord, Status};
