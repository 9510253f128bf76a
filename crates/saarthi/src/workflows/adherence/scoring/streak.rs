use std::collections::BTreeMap;

use chrono::NaiveDate;

use super::super::calendar::CalendarZone;
use super::super::domain::AdherenceHistoryEntry;

/// Adherence state per calendar day. History is ordered by date first, so the latest entry of
/// a day decides that day regardless of insertion order.
///
/// This is stricter than "any adherent entry counts": a day with an adherent check-in followed
/// later that day by a non-adherent one is treated as non-adherent, so a retraction sticks.
pub(crate) fn daily_adherence(
    history: &[AdherenceHistoryEntry],
    calendar: CalendarZone,
) -> BTreeMap<NaiveDate, bool> {
    let mut ordered: Vec<&AdherenceHistoryEntry> = history.iter().collect();
    ordered.sort_by_key(|entry| entry.date);

    let mut days = BTreeMap::new();
    for entry in ordered {
        days.insert(calendar.day_of(entry.date), entry.adherent);
    }
    days
}

/// Count adherent days walking backward from `last_day` (inclusive), stopping at the first
/// missing or non-adherent day or once `cap` days are counted.
pub(crate) fn consecutive_adherent_days(
    days: &BTreeMap<NaiveDate, bool>,
    last_day: NaiveDate,
    cap: u32,
) -> u32 {
    let mut streak = 0;
    let mut cursor = Some(last_day);

    while streak < cap {
        let Some(day) = cursor else {
            break;
        };
        if days.get(&day) != Some(&true) {
            break;
        }
        streak += 1;
        cursor = day.pred_opt();
    }

    streak
}

/// Streak leading up to (but excluding) the submission day.
pub(crate) fn prior_streak(
    history: &[AdherenceHistoryEntry],
    submission_day: NaiveDate,
    calendar: CalendarZone,
    cap: u32,
) -> u32 {
    let Some(yesterday) = submission_day.pred_opt() else {
        return 0;
    };
    consecutive_adherent_days(&daily_adherence(history, calendar), yesterday, cap)
}
