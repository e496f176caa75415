//! Run report: what a batch run collected, what it downloaded and what it had to give up on

use crate::images::DownloadSummary;
use crate::navigator::{LetterFailure, LetterOutcome};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub hybrids: usize,
    pub species: usize,
    pub letters: Vec<LetterOutcome>,
    pub letter_failures: Vec<LetterFailure>,
    pub species_images: Option<DownloadSummary>,
    pub hybrid_images: Option<DownloadSummary>,
    pub cancelled: bool,
    /// Unexpected error caught at the top level, if any
    pub error: Option<String>,
}

impl RunReport {
    pub fn start() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            hybrids: 0,
            species: 0,
            letters: Vec::new(),
            letter_failures: Vec::new(),
            species_images: None,
            hybrid_images: None,
            cancelled: false,
            error: None,
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn images_saved(&self) -> usize {
        [&self.species_images, &self.hybrid_images]
            .iter()
            .filter_map(|s| s.as_ref())
            .map(|s| s.images_saved)
            .sum()
    }

    pub fn images_failed(&self) -> usize {
        [&self.species_images, &self.hybrid_images]
            .iter()
            .filter_map(|s| s.as_ref())
            .map(|s| s.images_failed)
            .sum()
    }

    pub fn elapsed_secs(&self) -> Option<i64> {
        self.finished_at
            .map(|end| (end - self.started_at).num_seconds())
    }

    /// One-line summary for the log
    pub fn summary_line(&self) -> String {
        format!(
            "{} hybrids, {} species, {} images saved, {} images failed, {} letters failed{}{}",
            self.hybrids,
            self.species,
            self.images_saved(),
            self.images_failed(),
            self.letter_failures.len(),
            self.elapsed_secs()
                .map(|secs| format!(" in {}s", secs))
                .unwrap_or_default(),
            if self.cancelled { " (cancelled)" } else { "" }
        )
    }
}
