//! crates/qalbu_core/src/stats.rs
//!
//! Aggregates over the mood history for the dashboard view.

use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;

use crate::domain::{MoodLog, MoodType};

pub const RECENT_WINDOW_DAYS: i64 = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoodStats {
    pub total: usize,
    /// Counts over the whole history; only moods that occur are present.
    pub counts: BTreeMap<MoodType, usize>,
    pub dominant: Option<MoodType>,
    pub recent: RecentMoodWindow,
}

/// Counts for the last thirty days, with a bucket for every mood.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentMoodWindow {
    pub counts: BTreeMap<MoodType, usize>,
    pub max_count: usize,
    pub total: usize,
}

impl MoodStats {
    /// Computes the stats from a newest-first history.
    ///
    /// Ties for the dominant mood go to the mood seen first in that order.
    pub fn from_logs(logs: &[MoodLog], now: DateTime<Utc>) -> Self {
        let mut counts = BTreeMap::new();
        let mut first_seen = Vec::new();
        for log in logs {
            let count = counts.entry(log.mood).or_insert(0usize);
            if *count == 0 {
                first_seen.push(log.mood);
            }
            *count += 1;
        }

        let mut dominant = None;
        let mut best = 0;
        for mood in first_seen {
            let count = counts[&mood];
            if count > best {
                best = count;
                dominant = Some(mood);
            }
        }

        Self {
            total: logs.len(),
            counts,
            dominant,
            recent: RecentMoodWindow::from_logs(logs, now),
        }
    }
}

impl RecentMoodWindow {
    fn from_logs(logs: &[MoodLog], now: DateTime<Utc>) -> Self {
        let cutoff = now - Duration::days(RECENT_WINDOW_DAYS);
        let mut counts: BTreeMap<MoodType, usize> =
            MoodType::ALL.into_iter().map(|m| (m, 0)).collect();
        let mut total = 0;
        for log in logs.iter().filter(|log| log.created_at >= cutoff) {
            *counts.entry(log.mood).or_insert(0) += 1;
            total += 1;
        }
        let max_count = counts.values().copied().max().unwrap_or(0);
        Self {
            counts,
            max_count,
            total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn log(mood: MoodType, days_ago: i64, now: DateTime<Utc>) -> MoodLog {
        MoodLog {
            id: Uuid::new_v4(),
            created_at: now - Duration::days(days_ago),
            mood,
            note: None,
        }
    }

    #[test]
    fn empty_history_has_no_dominant_mood() {
        let stats = MoodStats::from_logs(&[], Utc::now());
        assert_eq!(stats.total, 0);
        assert_eq!(stats.dominant, None);
        assert_eq!(stats.recent.counts.len(), 12);
        assert_eq!(stats.recent.max_count, 0);
    }

    #[test]
    fn dominant_mood_is_most_frequent() {
        let now = Utc::now();
        let logs = vec![
            log(MoodType::Happy, 0, now),
            log(MoodType::Sad, 1, now),
            log(MoodType::Sad, 2, now),
            log(MoodType::Anxious, 3, now),
        ];
        let stats = MoodStats::from_logs(&logs, now);
        assert_eq!(stats.total, 4);
        assert_eq!(stats.dominant, Some(MoodType::Sad));
        assert_eq!(stats.counts[&MoodType::Sad], 2);
        assert!(!stats.counts.contains_key(&MoodType::Lonely));
    }

    #[test]
    fn ties_go_to_the_most_recent_mood() {
        let now = Utc::now();
        let logs = vec![
            log(MoodType::Tired, 0, now),
            log(MoodType::Grateful, 1, now),
            log(MoodType::Grateful, 2, now),
            log(MoodType::Tired, 3, now),
        ];
        let stats = MoodStats::from_logs(&logs, now);
        assert_eq!(stats.dominant, Some(MoodType::Tired));
    }

    #[test]
    fn recent_window_excludes_old_logs() {
        let now = Utc::now();
        let logs = vec![
            log(MoodType::Angry, 1, now),
            log(MoodType::Angry, 10, now),
            log(MoodType::Lonely, 29, now),
            log(MoodType::Lonely, 45, now),
            log(MoodType::Lonely, 90, now),
        ];
        let stats = MoodStats::from_logs(&logs, now);
        assert_eq!(stats.total, 5);
        assert_eq!(stats.dominant, Some(MoodType::Lonely));
        assert_eq!(stats.recent.total, 3);
        assert_eq!(stats.recent.counts[&MoodType::Angry], 2);
        assert_eq!(stats.recent.counts[&MoodType::Lonely], 1);
        assert_eq!(stats.recent.counts[&MoodType::Happy], 0);
        assert_eq!(stats.recent.max_count, 2);
    }
}
