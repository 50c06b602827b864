use std::fmt;

use chrono::{DateTime, Duration, FixedOffset, NaiveTime, TimeZone, Utc};
use clap::ValueEnum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum WindowKind {
    /// The 24 hours leading up to now
    Rolling,
    /// The current calendar day in the reference offset
    Calendar,
}

/// Decides which submissions count toward "today". One policy is used for a
/// whole pass, and the reset countdown is derived from the same policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WindowPolicy {
    #[default]
    Rolling,
    Calendar { offset: FixedOffset },
}

impl WindowPolicy {
    pub fn new(kind: WindowKind, offset: FixedOffset) -> Self {
        match kind {
            WindowKind::Rolling => WindowPolicy::Rolling,
            WindowKind::Calendar => WindowPolicy::Calendar { offset },
        }
    }

    /// Earliest instant of the current window.
    pub fn boundary(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            WindowPolicy::Rolling => now - Duration::hours(24),
            WindowPolicy::Calendar { offset } => local_midnight(now, *offset),
        }
    }

    pub fn contains(&self, submitted_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match self {
            WindowPolicy::Rolling => submitted_at > self.boundary(now),
            WindowPolicy::Calendar { offset } => {
                submitted_at.with_timezone(offset).date_naive()
                    == now.with_timezone(offset).date_naive()
            }
        }
    }

    /// When a participant's today value stops counting. Rolling windows
    /// expire 24 hours after the submission they hold; calendar windows all
    /// expire at the next local midnight.
    pub fn next_reset(
        &self,
        now: DateTime<Utc>,
        latest: Option<DateTime<Utc>>,
    ) -> Option<DateTime<Utc>> {
        match self {
            WindowPolicy::Rolling => latest.map(|at| at + Duration::hours(24)),
            WindowPolicy::Calendar { .. } => Some(self.boundary(now) + Duration::days(1)),
        }
    }
}

impl fmt::Display for WindowPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WindowPolicy::Rolling => f.write_str("rolling 24h"),
            WindowPolicy::Calendar { offset } => write!(f, "calendar day (UTC{offset})"),
        }
    }
}

fn local_midnight(now: DateTime<Utc>, offset: FixedOffset) -> DateTime<Utc> {
    let midnight = now
        .with_timezone(&offset)
        .date_naive()
        .and_time(NaiveTime::MIN);
    let shift = Duration::seconds(i64::from(offset.local_minus_utc()));
    Utc.from_utc_datetime(&(midnight - shift))
}
