//! Live NFL game tracking: poll an upstream sports API, normalize its
//! payloads into one canonical game state, and derive situational conversion
//! and win probabilities from it.
//!
//! The estimation engine ([`engine`]) and the normalizer ([`game`]) are pure
//! and callable as a library; [`feed`] and [`dashboard`] are the thin
//! fetch/poll and presentation collaborators around them.

pub mod config;
pub mod dashboard;
pub mod engine;
pub mod feed;
pub mod game;
