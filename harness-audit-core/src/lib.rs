#![doc = "harness-audit-core: core logic library for harness-audit."]

//! This crate holds the API client, listing and fallback logic, YAML scanning, config
//! diffing and report rendering behind the `harness-audit` binary.
//!
//! # Usage
//! Build a [`config::HarnessConfig`], wrap a transport in a [`client::HarnessClient`], then
//! call the walks in [`audit`] and render their results with [`report`].

pub mod appid;
pub mod audit;
pub mod client;
pub mod config;
pub mod contract;
pub mod diff;
pub mod flatten;
pub mod pagination;
pub mod report;
pub mod strategy;
pub mod transport;
