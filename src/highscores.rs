//! Leaderboard of finished runs
//!
//! A run is ranked by score; equal scores go to the run that cleared more
//! levels, then to the one that banked more time bonus. Serialized as JSON;
//! where it is stored is up to the host.

use std::cmp::Reverse;

use serde::{Deserialize, Serialize};

use crate::engine::RunSummary;
use crate::error::Result;

/// Runs kept on the board
pub const MAX_HIGH_SCORES: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    pub score: u64,
    /// Level the run ended on
    pub level: String,
    pub levels_cleared: u32,
    pub time_bonus: u64,
    pub coins: u32,
    /// Cleared the last level instead of running out of lives
    #[serde(default)]
    pub victory: bool,
}

impl HighScoreEntry {
    /// Smaller sorts first
    fn rank_key(&self) -> (Reverse<u64>, Reverse<u32>, Reverse<u64>) {
        (
            Reverse(self.score),
            Reverse(self.levels_cleared),
            Reverse(self.time_bonus),
        )
    }
}

impl From<&RunSummary> for HighScoreEntry {
    fn from(run: &RunSummary) -> Self {
        Self {
            score: run.stats.score,
            level: run.level.clone(),
            levels_cleared: run.stats.levels_cleared,
            time_bonus: run.stats.time_bonus,
            coins: run.stats.coins,
            victory: run.victory,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HighScores {
    entries: Vec<HighScoreEntry>,
}

impl HighScores {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a finished run. Returns its 1-based rank, or `None` when it
    /// scored nothing or falls off the bottom of a full board. Earlier runs
    /// keep their place over later ones that tie on every criterion.
    pub fn record(&mut self, entry: HighScoreEntry) -> Option<usize> {
        if entry.score == 0 {
            return None;
        }
        let key = entry.rank_key();
        let index = self.entries.partition_point(|e| e.rank_key() <= key);
        if index >= MAX_HIGH_SCORES {
            return None;
        }
        log::info!(
            "run on {} ({} levels, {} points) placed #{}",
            entry.level,
            entry.levels_cleared,
            entry.score,
            index + 1
        );
        self.entries.insert(index, entry);
        self.entries.truncate(MAX_HIGH_SCORES);
        Some(index + 1)
    }

    pub fn entries(&self) -> &[HighScoreEntry] {
        &self.entries
    }

    pub fn best(&self) -> Option<&HighScoreEntry> {
        self.entries.first()
    }

    pub fn top_score(&self) -> Option<u64> {
        self.best().map(|e| e.score)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse a saved board; unreadable text yields an empty one. Entries are
    /// re-ranked, so a hand-edited file cannot break the ordering.
    pub fn from_json(json: &str) -> Self {
        let mut board = match serde_json::from_str::<HighScores>(json) {
            Ok(board) => board,
            Err(err) => {
                log::warn!("unreadable high scores ({}), starting fresh", err);
                return Self::new();
            }
        };
        board.entries.retain(|e| e.score > 0);
        board.entries.sort_by_key(HighScoreEntry::rank_key);
        board.entries.truncate(MAX_HIGH_SCORES);
        log::info!("loaded {} high scores", board.entries.len());
        board
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::session::PlayerStats;
    use proptest::prelude::*;

    fn entry(score: u64, levels_cleared: u32, time_bonus: u64) -> HighScoreEntry {
        HighScoreEntry {
            score,
            level: "1-1".to_owned(),
            levels_cleared,
            time_bonus,
            coins: 0,
            victory: false,
        }
    }

    #[test]
    fn ties_go_to_the_run_that_got_further() {
        let mut board = HighScores::new();
        assert_eq!(board.record(entry(5000, 0, 0)), Some(1));
        assert_eq!(board.record(entry(5000, 1, 0)), Some(1));
        assert_eq!(board.record(entry(5000, 1, 2500)), Some(1));
        // identical run: the earlier one stays ahead
        assert_eq!(board.record(entry(5000, 1, 2500)), Some(2));
        let order: Vec<_> = board
            .entries()
            .iter()
            .map(|e| (e.levels_cleared, e.time_bonus))
            .collect();
        assert_eq!(order, vec![(1, 2500), (1, 2500), (1, 0), (0, 0)]);
    }

    #[test]
    fn empty_runs_and_losers_on_a_full_board_are_not_recorded() {
        let mut board = HighScores::new();
        assert_eq!(board.record(entry(0, 2, 0)), None);
        for score in 1..=MAX_HIGH_SCORES as u64 {
            board.record(entry(score * 100, 0, 0));
        }
        assert_eq!(board.record(entry(100, 0, 0)), None);
        assert_eq!(board.record(entry(100, 1, 0)), Some(MAX_HIGH_SCORES));
        assert_eq!(board.entries().len(), MAX_HIGH_SCORES);
        assert_eq!(board.top_score(), Some(1000));
    }

    #[test]
    fn entry_comes_from_a_run() {
        let run = RunSummary {
            stats: PlayerStats {
                score: 12_300,
                coins: 41,
                lives: 0,
                levels_cleared: 2,
                time_bonus: 9_850,
            },
            level: "1-2".to_owned(),
            victory: true,
            rank: None,
        };
        let entry = HighScoreEntry::from(&run);
        assert_eq!(entry.level, "1-2");
        assert_eq!(entry.levels_cleared, 2);
        assert_eq!(entry.time_bonus, 9_850);
        assert!(entry.victory);
    }

    #[test]
    fn loading_reranks_and_drops_garbage() {
        let text = r#"{"entries":[
            {"score":10,"level":"1-1","levels_cleared":0,"time_bonus":0,"coins":0},
            {"score":0,"level":"1-1","levels_cleared":0,"time_bonus":0,"coins":0},
            {"score":90,"level":"1-2","levels_cleared":1,"time_bonus":50,"coins":3}
        ]}"#;
        let board = HighScores::from_json(text);
        let scores: Vec<_> = board.entries().iter().map(|e| e.score).collect();
        assert_eq!(scores, vec![90, 10]);
        assert_eq!(HighScores::from_json(&board.to_json().unwrap()), board);
        assert!(HighScores::from_json("{oops").is_empty());
    }

    proptest! {
        #[test]
        fn board_stays_ranked_and_bounded(
            runs in prop::collection::vec((0u64..5_000, 0u32..3, 0u64..500), 0..40)
        ) {
            let mut board = HighScores::new();
            for (score, cleared, bonus) in runs {
                board.record(entry(score, cleared, bonus));
            }
            prop_assert!(board.entries().len() <= MAX_HIGH_SCORES);
            prop_assert!(board.entries().windows(2).all(|w| w[0].rank_key() <= w[1].rank_key()));
        }
    }
}
