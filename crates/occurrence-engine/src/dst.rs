//! DST transition policies for recurring events.
//!
//! Recurrence steps are applied to local wall-clock time, so a stepped time can
//! land inside a spring-forward gap or a fall-back overlap.

use chrono::{DateTime, Duration, NaiveDateTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;

/// Policy for occurrences whose wall-clock time falls in a DST gap.
///
/// Ambiguous wall-clock times (the repeated hour in autumn) always resolve to
/// the earlier instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DstPolicy {
    /// Move gap times forward by the length of the gap (02:30 becomes 03:30)
    #[default]
    ShiftForward,
    /// Drop the occurrence for that step
    Skip,
}

impl DstPolicy {
    pub(crate) fn emits(self, resolved: &LocalInstant) -> bool {
        !matches!((self, resolved), (DstPolicy::Skip, LocalInstant::Gap(_)))
    }
}

/// A wall-clock time mapped onto the UTC timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LocalInstant {
    /// The wall time exists (possibly twice, in which case this is the earlier).
    Exact(DateTime<Utc>),
    /// The wall time was skipped by a transition; this is the shifted instant.
    Gap(DateTime<Utc>),
}

impl LocalInstant {
    pub(crate) fn instant(self) -> DateTime<Utc> {
        match self {
            LocalInstant::Exact(dt) | LocalInstant::Gap(dt) => dt,
        }
    }
}

/// Map `local` in `tz` to an instant.
///
/// Gap times are read with the offset in force a day earlier, which places
/// them after the transition by exactly the gap length. Returns `None` only
/// when the arithmetic leaves chrono's supported range.
pub(crate) fn resolve_local(tz: &Tz, local: &NaiveDateTime) -> Option<LocalInstant> {
    match tz.from_local_datetime(local) {
        chrono::LocalResult::Single(dt) => Some(LocalInstant::Exact(dt.with_timezone(&Utc))),
        chrono::LocalResult::Ambiguous(earliest, _) => {
            Some(LocalInstant::Exact(earliest.with_timezone(&Utc)))
        }
        chrono::LocalResult::None => {
            let probe = local.checked_sub_signed(Duration::days(1))?;
            let before = tz.offset_from_utc_datetime(&probe).fix();
            let utc = local.checked_sub_signed(Duration::seconds(i64::from(
                before.local_minus_utc(),
            )))?;
            Some(LocalInstant::Gap(utc.and_utc()))
        }
    }
}

/// Map `local` in `tz` to an instant, shifting gap times forward.
pub(crate) fn resolve_shifted(tz: &Tz, local: &NaiveDateTime) -> Option<DateTime<Utc>> {
    resolve_local(tz, local).map(LocalInstant::instant)
}
