//! Kubeviz server - HTTP front for cluster snapshots and topology

pub mod api;
pub mod config;
