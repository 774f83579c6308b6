//! High score leaderboard system
//!
//! Persisted to LocalStorage as an ordered list of `{name, score}`, best
//! first, top 10 only. Unreadable storage degrades to an empty board.

use serde::{Deserialize, Serialize};

/// Maximum number of high scores to keep
pub const MAX_HIGH_SCORES: usize = 10;

/// A single high score entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    pub name: String,
    pub score: u64,
}

/// High score leaderboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct HighScores {
    pub entries: Vec<HighScoreEntry>,
}

impl HighScores {
    /// LocalStorage key (used only in wasm32)
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "subzero_leaderboard";

    /// Create empty leaderboard
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Parse a stored list. Malformed JSON yields an empty board; a
    /// hand-edited list is re-sorted and trimmed.
    pub fn from_json(json: &str) -> Self {
        match serde_json::from_str::<HighScores>(json) {
            Ok(mut scores) => {
                scores.normalize();
                scores
            }
            Err(e) => {
                log::warn!("Ignoring malformed leaderboard: {}", e);
                Self::new()
            }
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "[]".to_string())
    }

    fn normalize(&mut self) {
        // Stable: equal scores keep their stored order
        self.entries.sort_by(|a, b| b.score.cmp(&a.score));
        self.entries.truncate(MAX_HIGH_SCORES);
    }

    /// Check if a score qualifies for the leaderboard
    pub fn qualifies(&self, score: u64) -> bool {
        if self.entries.len() < MAX_HIGH_SCORES {
            return true;
        }
        // Check if score beats the lowest entry
        self.entries.last().map(|e| score > e.score).unwrap_or(true)
    }

    /// Add a new score to the leaderboard (if it qualifies)
    /// Returns the rank achieved (1-indexed) or None if didn't qualify
    pub fn add_score(&mut self, name: &str, score: u64) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }

        let entry = HighScoreEntry {
            name: name.trim().to_string(),
            score,
        };

        // Find insertion point (sorted descending, after equal scores)
        let pos = self.entries.iter().position(|e| score > e.score);
        let rank = match pos {
            Some(i) => {
                self.entries.insert(i, entry);
                i + 1
            }
            None => {
                self.entries.push(entry);
                self.entries.len()
            }
        };

        self.entries.truncate(MAX_HIGH_SCORES);

        Some(rank)
    }

    /// Check if the leaderboard is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get the top score (if any)
    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.score)
    }

    /// Load high scores from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                let scores = Self::from_json(&json);
                log::info!("Loaded {} high scores", scores.entries.len());
                return scores;
            }
        }

        log::info!("No high scores found, starting fresh");
        Self::new()
    }

    /// Save high scores to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if storage.set_item(Self::STORAGE_KEY, &self.to_json()).is_ok() {
                log::info!("High scores saved ({} entries)", self.entries.len());
            } else {
                log::warn!("LocalStorage rejected the leaderboard");
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::new()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_top_ten_descending() {
        let mut hs = HighScores::new();
        for i in 0..15u64 {
            hs.add_score(&format!("p{}", i), i * 100);
        }
        assert_eq!(hs.entries.len(), MAX_HIGH_SCORES);
        assert_eq!(hs.top_score(), Some(1400));
        assert!(hs.entries.windows(2).all(|w| w[0].score >= w[1].score));
        assert!(!hs.qualifies(500));
        assert!(hs.qualifies(501));
    }

    #[test]
    fn test_zero_scores_are_recorded() {
        let mut hs = HighScores::new();
        assert_eq!(hs.add_score("ace", 0), Some(1));
    }

    #[test]
    fn test_ties_rank_below_existing() {
        let mut hs = HighScores::new();
        hs.add_score("first", 300);
        assert_eq!(hs.add_score("second", 300), Some(2));
        assert_eq!(hs.entries[0].name, "first");
    }

    #[test]
    fn test_stored_form_is_a_plain_list() {
        let mut hs = HighScores::new();
        hs.add_score("zed", 42);
        assert_eq!(hs.to_json(), r#"[{"name":"zed","score":42}]"#);
    }

    #[test]
    fn test_malformed_storage_degrades_to_empty() {
        assert!(HighScores::from_json("{not json").is_empty());
        assert!(HighScores::from_json(r#"{"name":"x"}"#).is_empty());
    }

    #[test]
    fn test_hand_edited_list_is_normalized() {
        let json = r#"[{"name":"a","score":1},{"name":"b","score":9},{"name":"c","score":5}]"#;
        let hs = HighScores::from_json(json);
        let names: Vec<&str> = hs.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["b", "c", "a"]);
    }
}
