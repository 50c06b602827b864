use chrono::{DateTime, Utc};

use crate::aggregate::{Aggregation, TodayTally};
use crate::identity::ParticipantIdentity;
use crate::models::{
    Decoration, LeaderboardView, Medal, ParticipantStats, RankedEntry, SubmissionRecord,
};
use crate::window::WindowPolicy;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RankOptions {
    /// Give the last entry of a non-windowed view the trailing marker.
    pub mark_last: bool,
}

/// Everything a ranking needs from one aggregation pass.
#[derive(Debug, Clone, Copy)]
pub struct RankInput<'a> {
    pub records: &'a [SubmissionRecord],
    pub aggregation: &'a Aggregation,
    pub window: WindowPolicy,
    pub tally: TodayTally,
    pub now: DateTime<Utc>,
}

/// Order and decorate entries for the requested view.
///
/// Sorting is descending and stable, so equal scores keep the order in
/// which participants (or submissions) were first seen.
pub fn rank(
    view: LeaderboardView,
    input: &RankInput<'_>,
    options: RankOptions,
) -> Vec<RankedEntry> {
    let mut entries: Vec<RankedEntry> = match view {
        LeaderboardView::AllTime => input
            .aggregation
            .iter()
            .map(|(identity, stats)| {
                participant_entry(identity, stats, stats.all_time_total, None, input)
            })
            .collect(),
        LeaderboardView::Today => input
            .aggregation
            .iter()
            .filter(|(_, stats)| stats.today_total > 0)
            .map(|(identity, stats)| {
                // Under latest-wins the today value is one submission's count.
                let single = match input.tally {
                    TodayTally::Latest => Some(stats.today_total),
                    TodayTally::Sum => None,
                };
                participant_entry(identity, stats, stats.today_total, single, input)
            })
            .collect(),
        LeaderboardView::Submissions => input
            .records
            .iter()
            .map(|record| submission_entry(record, input))
            .collect(),
    };

    entries.sort_by(|a, b| b.score.cmp(&a.score));
    assign_ranks(&mut entries, options.mark_last && !view.is_windowed());
    entries
}

/// Decoration for the entry at zero-based `index` of `len` entries.
pub fn decoration_for(index: usize, len: usize, mark_last: bool) -> Decoration {
    match index {
        0 => Decoration::Medal(Medal::Gold),
        1 => Decoration::Medal(Medal::Silver),
        2 => Decoration::Medal(Medal::Bronze),
        _ if mark_last && index + 1 == len => Decoration::Trailing,
        _ => Decoration::Ordinal(index + 1),
    }
}

fn assign_ranks(entries: &mut [RankedEntry], mark_last: bool) {
    let len = entries.len();
    for (index, entry) in entries.iter_mut().enumerate() {
        entry.rank = index + 1;
        entry.decoration = decoration_for(index, len, mark_last);
    }
}

fn participant_entry(
    identity: &ParticipantIdentity,
    stats: &ParticipantStats,
    score: u64,
    pushup_count: Option<u64>,
    input: &RankInput<'_>,
) -> RankedEntry {
    let resets_at = stats
        .latest_today_submitted_at
        .and_then(|latest| input.window.next_reset(input.now, Some(latest)));

    RankedEntry {
        rank: 0,
        decoration: Decoration::Ordinal(0),
        identity: identity.clone(),
        score,
        all_time_total: stats.all_time_total,
        personal_best: stats.personal_best,
        personal_best_proof: stats.personal_best_proof.clone(),
        today_total: stats.today_total,
        today_proof: stats.today_proof.clone(),
        pushup_count,
        proof_reference: None,
        submitted_at: None,
        personal_record: pushup_count == Some(stats.personal_best),
        resets_at,
    }
}

fn submission_entry(record: &SubmissionRecord, input: &RankInput<'_>) -> RankedEntry {
    let identity = record.identity();
    let stats = input
        .aggregation
        .get(&identity)
        .cloned()
        .unwrap_or_default();

    RankedEntry {
        rank: 0,
        decoration: Decoration::Ordinal(0),
        score: record.pushup_count,
        all_time_total: stats.all_time_total,
        personal_best: stats.personal_best,
        personal_best_proof: stats.personal_best_proof,
        today_total: stats.today_total,
        today_proof: stats.today_proof,
        pushup_count: Some(record.pushup_count),
        proof_reference: Some(record.proof_reference.clone()),
        submitted_at: record.submitted_at,
        personal_record: record.pushup_count == stats.personal_best,
        resets_at: None,
        identity,
    }
}
