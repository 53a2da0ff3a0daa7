// Copyright 2026 Cortex Contributors
// SPDX-License-Identifier: Apache-2.0

//! Reciprocity runtime library: a reciprocal-subscription bot for the
//! Tistory community forum.
//!
//! A run authenticates once, optionally publishes a solicitation post, scans
//! the forum listing for authors asking for mutual subscriptions and then
//! subscribes to and comments on each of them, pausing between actions.

pub mod cli;
pub mod config;
pub mod content;
pub mod engage;
pub mod error;
pub mod forum;
pub mod model;
pub mod pacing;
pub mod pipeline;
pub mod progress;
pub mod publish;
pub mod renderer;
pub mod scanner;
pub mod session;
