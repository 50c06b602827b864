use std::collections::HashMap;

use chrono::{DateTime, Utc};
use clap::ValueEnum;

use crate::identity::ParticipantIdentity;
use crate::models::{ParticipantStats, SubmissionRecord};
use crate::window::WindowPolicy;

/// How several qualifying submissions combine into one "today" value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum TodayTally {
    /// Today's value is the chronologically latest qualifying submission
    #[default]
    Latest,
    /// Today's value is the sum of all qualifying submissions
    Sum,
}

/// Per-participant statistics for one pass, kept in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Aggregation {
    participants: Vec<(ParticipantIdentity, ParticipantStats)>,
    index: HashMap<ParticipantIdentity, usize>,
    pub grand_total: u64,
    pub record_count: usize,
}

impl Aggregation {
    pub fn get(&self, identity: &ParticipantIdentity) -> Option<&ParticipantStats> {
        self.index
            .get(identity)
            .map(|&position| &self.participants[position].1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ParticipantIdentity, &ParticipantStats)> {
        self.participants.iter().map(|(identity, stats)| (identity, stats))
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    /// Returns the stats bucket and whether it was just created.
    fn bucket(&mut self, identity: ParticipantIdentity) -> (&mut ParticipantStats, bool) {
        let (position, created) = match self.index.get(&identity) {
            Some(&position) => (position, false),
            None => {
                let position = self.participants.len();
                self.index.insert(identity.clone(), position);
                self.participants.push((identity, ParticipantStats::default()));
                (position, true)
            }
        };
        (&mut self.participants[position].1, created)
    }
}

/// Fold the records, in order, into per-participant statistics.
///
/// Totals only grow. The personal best moves on a strictly larger count, so
/// the earliest submission keeps the proof on ties. Records without a
/// readable timestamp never count toward today.
pub fn aggregate(
    records: &[SubmissionRecord],
    now: DateTime<Utc>,
    window: WindowPolicy,
    tally: TodayTally,
) -> Aggregation {
    let mut aggregation = Aggregation::default();

    for record in records {
        let count = record.pushup_count;
        aggregation.grand_total = aggregation.grand_total.saturating_add(count);
        aggregation.record_count += 1;

        let (stats, created) = aggregation.bucket(record.identity());
        stats.all_time_total = stats.all_time_total.saturating_add(count);

        if created || count > stats.personal_best {
            stats.personal_best = count;
            stats.personal_best_proof = record.proof_reference.clone();
        }

        let Some(submitted_at) = record.submitted_at else {
            continue;
        };
        if !window.contains(submitted_at, now) {
            continue;
        }

        match tally {
            TodayTally::Latest => {
                let is_latest = stats
                    .latest_today_submitted_at
                    .map_or(true, |latest| submitted_at >= latest);
                if is_latest {
                    stats.today_total = count;
                    stats.today_proof = record.proof_reference.clone();
                    stats.latest_today_submitted_at = Some(submitted_at);
                }
            }
            TodayTally::Sum => {
                stats.today_total = stats.today_total.saturating_add(count);
                stats.today_proof = record.proof_reference.clone();
                stats.latest_today_submitted_at = stats
                    .latest_today_submitted_at
                    .max(Some(submitted_at));
            }
        }
    }

    aggregation
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-10-02T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn record(handle: &str, pushups: u64, hours_ago: Option<i64>) -> SubmissionRecord {
        SubmissionRecord {
            submission_id: format!("{handle}-{pushups}"),
            respondent_id: "resp".to_string(),
            submitted_at_raw: String::new(),
            submitted_at: hours_ago.map(|hours| now() - Duration::hours(hours)),
            pushup_count: pushups,
            proof_reference: format!(
                "https://x.com/{handle}/status/{pushups}{}",
                hours_ago.unwrap_or(0)
            ),
        }
    }

    fn id(handle: &str) -> ParticipantIdentity {
        ParticipantIdentity::from_proof(&format!("https://x.com/{handle}/status/1"))
    }

    #[test]
    fn totals_and_bests_follow_the_worked_example() {
        let records = vec![
            record("a", 10, Some(72)),
            record("b", 30, Some(72)),
            record("a", 5, Some(72)),
        ];

        let aggregation = aggregate(&records, now(), WindowPolicy::Rolling, TodayTally::Latest);

        assert_eq!(aggregation.len(), 2);
        assert_eq!(aggregation.get(&id("a")).unwrap().all_time_total, 15);
        assert_eq!(aggregation.get(&id("b")).unwrap().all_time_total, 30);
        assert_eq!(aggregation.get(&id("a")).unwrap().personal_best, 10);
        assert_eq!(aggregation.get(&id("b")).unwrap().personal_best, 30);
        assert_eq!(aggregation.grand_total, 45);
        assert_eq!(aggregation.record_count, 3);
    }

    #[test]
    fn totals_are_conserved_and_bests_are_maxima() {
        let records = vec![
            record("a", 7, Some(1)),
            record("b", 0, None),
            record("c", 12, Some(30)),
            record("a", 19, Some(50)),
            record("b", 4, Some(2)),
            record("c", 12, Some(3)),
        ];

        let aggregation = aggregate(&records, now(), WindowPolicy::Rolling, TodayTally::Latest);

        let per_participant: u64 = aggregation.iter().map(|(_, s)| s.all_time_total).sum();
        let per_record: u64 = records.iter().map(|r| r.pushup_count).sum();
        assert_eq!(per_participant, per_record);
        assert_eq!(aggregation.grand_total, per_record);

        for (identity, stats) in aggregation.iter() {
            let best = records
                .iter()
                .filter(|r| &r.identity() == identity)
                .map(|r| r.pushup_count)
                .max()
                .unwrap();
            assert_eq!(stats.personal_best, best);
            assert!(records.iter().any(|r| r.proof_reference == stats.personal_best_proof
                && r.pushup_count == best));
        }
    }

    #[test]
    fn personal_best_ties_keep_the_first_proof() {
        let records = vec![record("c", 12, Some(30)), record("c", 12, Some(3))];
        let aggregation = aggregate(&records, now(), WindowPolicy::Rolling, TodayTally::Latest);
        assert_eq!(
            aggregation.get(&id("c")).unwrap().personal_best_proof,
            records[0].proof_reference
        );
    }

    #[test]
    fn zero_only_participant_still_has_a_best_proof() {
        let records = vec![record("z", 0, None)];
        let aggregation = aggregate(&records, now(), WindowPolicy::Rolling, TodayTally::Latest);
        let stats = aggregation.get(&id("z")).unwrap();
        assert_eq!(stats.personal_best, 0);
        assert_eq!(stats.personal_best_proof, records[0].proof_reference);
    }

    #[test]
    fn latest_qualifying_submission_wins_today() {
        // Input order is not chronological: the 2h-old record arrives last.
        let records = vec![
            record("a", 20, Some(1)),
            record("a", 50, Some(30)),
            record("a", 35, Some(2)),
        ];

        let aggregation = aggregate(&records, now(), WindowPolicy::Rolling, TodayTally::Latest);
        let stats = aggregation.get(&id("a")).unwrap();

        assert_eq!(stats.today_total, 20);
        assert_eq!(stats.today_proof, records[0].proof_reference);
        assert_eq!(stats.latest_today_submitted_at, records[0].submitted_at);
        assert_eq!(stats.all_time_total, 105);
    }

    #[test]
    fn sum_tally_adds_every_qualifying_submission() {
        let records = vec![
            record("a", 20, Some(1)),
            record("a", 50, Some(30)),
            record("a", 35, Some(2)),
        ];

        let aggregation = aggregate(&records, now(), WindowPolicy::Rolling, TodayTally::Sum);
        let stats = aggregation.get(&id("a")).unwrap();

        assert_eq!(stats.today_total, 55);
        assert_eq!(stats.today_proof, records[2].proof_reference);
        assert_eq!(stats.latest_today_submitted_at, records[0].submitted_at);
    }

    #[test]
    fn undated_and_stale_records_never_count_today() {
        let records = vec![record("a", 20, None), record("a", 30, Some(25))];
        let aggregation = aggregate(&records, now(), WindowPolicy::Rolling, TodayTally::Latest);
        let stats = aggregation.get(&id("a")).unwrap();
        assert_eq!(stats.today_total, 0);
        assert_eq!(stats.today_proof, "");
        assert_eq!(stats.latest_today_submitted_at, None);
    }

    #[test]
    fn malformed_proofs_share_the_undefined_bucket() {
        let mut broken = record("a", 3, None);
        broken.proof_reference = "not-a-url".to_string();
        let mut also_broken = record("b", 4, None);
        also_broken.proof_reference = String::new();

        let aggregation = aggregate(
            &[broken, also_broken],
            now(),
            WindowPolicy::Rolling,
            TodayTally::Latest,
        );

        assert_eq!(aggregation.len(), 1);
        let undefined = ParticipantIdentity::from_proof("");
        assert_eq!(aggregation.get(&undefined).unwrap().all_time_total, 7);
    }

    #[test]
    fn participants_keep_first_seen_order() {
        let records = vec![record("b", 1, None), record("a", 1, None), record("b", 1, None)];
        let aggregation = aggregate(&records, now(), WindowPolicy::Rolling, TodayTally::Latest);
        let order: Vec<&str> = aggregation.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(order, vec!["@b", "@a"]);
    }

    #[test]
    fn repeated_passes_are_identical() {
        let records = vec![record("a", 9, Some(1)), record("b", 11, Some(5))];
        let first = aggregate(&records, now(), WindowPolicy::Rolling, TodayTally::Latest);
        let second = aggregate(&records, now(), WindowPolicy::Rolling, TodayTally::Latest);
        assert_eq!(first, second);
    }
}
