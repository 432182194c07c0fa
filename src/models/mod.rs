// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod catalog;
pub mod leaderboard;
pub mod user;

pub use catalog::{Badge, CATALOG};
pub use leaderboard::{leaderboard, LeaderboardEntry};
pub use user::{Role, User, UserDoc, UserId, UserPatch};
