use std::fmt;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Serialize, Serializer};

use crate::identity::ParticipantIdentity;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionRecord {
    pub submission_id: String,
    pub respondent_id: String,
    pub submitted_at_raw: String,
    pub submitted_at: Option<DateTime<Utc>>,
    pub pushup_count: u64,
    pub proof_reference: String,
}

impl SubmissionRecord {
    pub fn identity(&self) -> ParticipantIdentity {
        ParticipantIdentity::from_proof(&self.proof_reference)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParticipantStats {
    pub all_time_total: u64,
    pub personal_best: u64,
    pub personal_best_proof: String,
    pub today_total: u64,
    pub today_proof: String,
    pub latest_today_submitted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LeaderboardView {
    /// Participants by lifetime total
    AllTime,
    /// Participants by today's count
    Today,
    /// Individual submissions by count
    Submissions,
}

impl LeaderboardView {
    /// Windowed views never mark a trailing entry.
    pub fn is_windowed(self) -> bool {
        matches!(self, LeaderboardView::Today)
    }

    pub fn title(self) -> &'static str {
        match self {
            LeaderboardView::AllTime => "All-Time Leaderboard",
            LeaderboardView::Today => "Today's Leaderboard",
            LeaderboardView::Submissions => "Biggest Single Sets",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Medal {
    Gold,
    Silver,
    Bronze,
}

impl Medal {
    pub fn emoji(self) -> &'static str {
        match self {
            Medal::Gold => "🥇",
            Medal::Silver => "🥈",
            Medal::Bronze => "🥉",
        }
    }
}

/// Rank-dependent tag; every ranked entry carries exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoration {
    Medal(Medal),
    Ordinal(usize),
    Trailing,
}

impl fmt::Display for Decoration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decoration::Medal(Medal::Gold) => f.write_str("medal:gold"),
            Decoration::Medal(Medal::Silver) => f.write_str("medal:silver"),
            Decoration::Medal(Medal::Bronze) => f.write_str("medal:bronze"),
            Decoration::Ordinal(n) => write!(f, "ordinal:{n}"),
            Decoration::Trailing => f.write_str("trailing"),
        }
    }
}

impl Serialize for Decoration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedEntry {
    pub rank: usize,
    pub decoration: Decoration,
    pub identity: ParticipantIdentity,
    /// Value the view was sorted by.
    pub score: u64,
    pub all_time_total: u64,
    pub personal_best: u64,
    pub personal_best_proof: String,
    pub today_total: u64,
    pub today_proof: String,
    /// Count of the single submission this entry stands for, if any.
    pub pushup_count: Option<u64>,
    pub proof_reference: Option<String>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub personal_record: bool,
    pub resets_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Leaderboard {
    pub view: LeaderboardView,
    pub generated_at: DateTime<Utc>,
    pub grand_total: u64,
    pub record_count: usize,
    pub participant_count: usize,
    pub entries: Vec<RankedEntry>,
}
