use chrono::{DateTime, Utc};
use log::{info, warn};

use crate::aggregate::{aggregate, Aggregation, TodayTally};
use crate::error::SourceError;
use crate::models::{Leaderboard, LeaderboardView, SubmissionRecord};
use crate::normalize::Normalizer;
use crate::rank::{rank, RankInput, RankOptions};
use crate::window::WindowPolicy;

#[derive(Debug, Clone, Copy, Default)]
pub struct Settings {
    pub normalizer: Normalizer,
    pub window: WindowPolicy,
    pub tally: TodayTally,
    pub rank: RankOptions,
}

/// One snapshot of submissions folded at a fixed `now`. A refresh builds a
/// new pass rather than updating an old one.
#[derive(Debug, Clone)]
pub struct Pass {
    records: Vec<SubmissionRecord>,
    aggregation: Aggregation,
    now: DateTime<Utc>,
    settings: Settings,
}

impl Pass {
    pub fn run(text: &str, now: DateTime<Utc>, settings: Settings) -> Result<Self, SourceError> {
        let records = settings.normalizer.parse_document(text)?;
        Ok(Self::from_records(records, now, settings))
    }

    pub fn from_records(
        records: Vec<SubmissionRecord>,
        now: DateTime<Utc>,
        settings: Settings,
    ) -> Self {
        let aggregation = aggregate(&records, now, settings.window, settings.tally);
        if aggregation.is_empty() {
            warn!("no submissions found below the header row");
        }
        info!(
            "aggregated {} submissions from {} participants ({} pushups, today = {})",
            aggregation.record_count,
            aggregation.len(),
            aggregation.grand_total,
            settings.window
        );

        Self {
            records,
            aggregation,
            now,
            settings,
        }
    }

    pub fn leaderboard(&self, view: LeaderboardView) -> Leaderboard {
        let input = RankInput {
            records: &self.records,
            aggregation: &self.aggregation,
            window: self.settings.window,
            tally: self.settings.tally,
            now: self.now,
        };

        Leaderboard {
            view,
            generated_at: self.now,
            grand_total: self.aggregation.grand_total,
            record_count: self.aggregation.record_count,
            participant_count: self.aggregation.len(),
            entries: rank(view, &input, self.settings.rank),
        }
    }

    pub fn grand_total(&self) -> u64 {
        self.aggregation.grand_total
    }

    pub fn window(&self) -> WindowPolicy {
        self.settings.window
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHEET: &str = "Submission ID,Respondent ID,Submitted at,Pushups,Proof\n\
        s1,r1,2024-10-01 09:00:00,10,https://x.com/a/status/1\n\
        s2,r2,2024-10-02 08:00:00,30,https://x.com/b/status/2\n\
        s3,r3,2024-10-02 10:00:00,5,https://x.com/a/status/3\n\
        s4,r4,2024-10-02 11:00:00,abc,not-a-url\n";

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-10-02T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test_log::test]
    fn builds_every_view_from_one_snapshot() {
        let pass = Pass::run(SHEET, now(), Settings::default()).unwrap();
        assert_eq!(pass.grand_total(), 45);

        let all_time = pass.leaderboard(LeaderboardView::AllTime);
        let order: Vec<&str> = all_time.entries.iter().map(|e| e.identity.as_str()).collect();
        assert_eq!(order, vec!["@b", "@a", "@undefined"]);
        assert_eq!(all_time.grand_total, 45);
        assert_eq!(all_time.record_count, 4);
        assert_eq!(all_time.participant_count, 3);

        let today = pass.leaderboard(LeaderboardView::Today);
        let today_scores: Vec<u64> = today.entries.iter().map(|e| e.score).collect();
        assert_eq!(today_scores, vec![30, 5]);

        let submissions = pass.leaderboard(LeaderboardView::Submissions);
        assert_eq!(submissions.entries.len(), 4);
        assert_eq!(submissions.entries[0].pushup_count, Some(30));
    }

    #[test_log::test]
    fn rerunning_a_snapshot_is_bit_identical() {
        let settings = Settings {
            rank: RankOptions { mark_last: true },
            ..Settings::default()
        };
        let first = Pass::run(SHEET, now(), settings).unwrap();
        let second = Pass::run(SHEET, now(), settings).unwrap();

        for view in [
            LeaderboardView::AllTime,
            LeaderboardView::Today,
            LeaderboardView::Submissions,
        ] {
            assert_eq!(first.leaderboard(view), second.leaderboard(view));
        }
    }

    #[test_log::test]
    fn empty_sheet_gives_empty_boards() {
        let pass = Pass::run("a,b,c,d,e\n", now(), Settings::default()).unwrap();
        let board = pass.leaderboard(LeaderboardView::AllTime);
        assert!(board.entries.is_empty());
        assert_eq!(board.grand_total, 0);
    }
}
