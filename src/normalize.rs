use chrono::{DateTime, FixedOffset, NaiveDateTime, Offset, TimeZone, Utc};
use log::debug;

use crate::models::SubmissionRecord;

/// Timezone-naive layouts seen in spreadsheet exports, tried in order.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
];

/// Turns raw rows into [`SubmissionRecord`]s. Never rejects a row: bad
/// counts become zero and unreadable timestamps become `None`.
#[derive(Debug, Clone, Copy)]
pub struct Normalizer {
    /// Offset applied to timestamps that carry no zone of their own.
    source_offset: FixedOffset,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(Utc.fix())
    }
}

impl Normalizer {
    pub fn new(source_offset: FixedOffset) -> Self {
        Self { source_offset }
    }

    /// Build a record from fields in column order
    /// `submission id, respondent id, submitted at, count, proof link`.
    /// Missing trailing fields are treated as empty; extra fields are ignored.
    pub fn normalize_fields<'a, I>(&self, fields: I) -> SubmissionRecord
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut fields = fields.into_iter();
        let mut next = || fields.next().unwrap_or_default().to_string();

        let submission_id = next();
        let respondent_id = next();
        let submitted_at_raw = next();
        let pushup_field = next();
        let proof_reference = next();

        SubmissionRecord {
            submission_id,
            respondent_id,
            submitted_at: parse_timestamp(&submitted_at_raw, self.source_offset),
            submitted_at_raw,
            pushup_count: parse_pushup_count(&pushup_field),
            proof_reference,
        }
    }

    /// Parse a whole CSV document. The first row is a header and is skipped
    /// without looking at its column names; blank lines are skipped.
    pub fn parse_document(&self, text: &str) -> Result<Vec<SubmissionRecord>, csv::Error> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes());

        let mut records = Vec::new();
        for row in reader.records() {
            let row = row?;
            records.push(self.normalize_fields(row.iter()));
        }

        debug!("normalized {} submission rows", records.len());
        Ok(records)
    }
}

/// Lenient integer parse: the leading run of digits after optional
/// whitespace and sign. Anything without digits, negative, or too large
/// for `u64` counts as zero.
pub fn parse_pushup_count(field: &str) -> u64 {
    let trimmed = field.trim_start();
    let (negative, rest) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };

    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let digits = &rest[..end];

    if negative || digits.is_empty() {
        return 0;
    }
    digits.parse().unwrap_or(0)
}

/// RFC 3339 strings keep their own offset; naive strings are read in
/// `source_offset`.
pub fn parse_timestamp(raw: &str, source_offset: FixedOffset) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .and_then(|naive| source_offset.from_local_datetime(&naive).single())
        .map(|local| local.with_timezone(&Utc))
}
