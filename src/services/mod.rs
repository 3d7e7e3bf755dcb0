// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod dashboard;
pub mod deletion;
pub mod export;
pub mod query;

pub use deletion::{DeletionReport, UserDeleter};
pub use query::{SpeechAggregates, SpeechQuery, SpeechSortKey};
