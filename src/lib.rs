//! Lingua Pair - Language-exchange partner matchmaking
//!
//! This crate queues learners looking for a conversation partner, scores
//! candidate pairs, proposes matches, runs the accept/reject protocol, and
//! tracks the resulting conversation sessions until they end.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
