// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod gamification;
pub mod speech;
pub mod stats;
pub mod user;

pub use gamification::{Badge, BadgeProgress, Gamification, GamificationUpdate};
pub use speech::{Speech, SpeechScores};
pub use stats::{DashboardStats, StatsAccumulator};
pub use user::{User, UserUpdate};
