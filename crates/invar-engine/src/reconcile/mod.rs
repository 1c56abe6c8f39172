//! # Reconciliation
//!
//! Derives the mapping set between the azure-side and legacy-side record
//! sets after each sync:
//!
//! - Multi-signal similarity scoring (hardware ids, network ids, fuzzy
//!   names) in [`scoring`]
//! - Deterministic greedy one-to-one assignment with threshold-based
//!   acceptance in [`engine`]
//! - Manual mappings are never touched by recomputation

pub mod engine;
pub mod scoring;

pub use engine::{ReconcileSummary, Reconciler};
pub use scoring::{score_pair, MatchConfig};
