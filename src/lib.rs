//! Forex Trading Decision Engine
//!
//! A deterministic decision pipeline over closed price bars: bounded history
//! management, market regime classification, breakout/reaction entry timing,
//! signal confirmation, risk-based position sizing, and trailing-stop
//! ratcheting. The engine consumes host-supplied inputs and emits order and
//! stop-modification intents; it performs no I/O of its own.

pub mod admission;
pub mod config;
pub mod context;
pub mod data;
pub mod engine;
pub mod filters;
pub mod fractal;
pub mod history;
pub mod indicators;
pub mod reaction;
pub mod sizing;
pub mod trailing;
pub mod types;

pub use config::Config;
pub use engine::{Diagnostic, Engine, Evaluation, EvaluationInput, SessionState};
pub use types::*;
