//! Leaderboard derived from a collection snapshot.

use serde::Serialize;

use crate::models::User;

/// One leaderboard row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaderboardEntry {
    /// 1-based position
    pub rank: usize,
    pub email: String,
    pub points: i64,
    pub badges: Vec<String>,
}

/// Users ordered by points, highest first.
///
/// Ties keep their snapshot order (`sort_by` is stable).
pub fn leaderboard(users: &[User]) -> Vec<User> {
    let mut sorted = users.to_vec();
    sorted.sort_by(|a, b| b.points.cmp(&a.points));
    sorted
}

/// Number the rows of an already sorted leaderboard.
pub fn entries(sorted: &[User]) -> Vec<LeaderboardEntry> {
    sorted
        .iter()
        .enumerate()
        .map(|(i, user)| LeaderboardEntry {
            rank: i + 1,
            email: user.email.clone(),
            points: user.points,
            badges: user.badges.clone(),
        })
        .collect()
}
