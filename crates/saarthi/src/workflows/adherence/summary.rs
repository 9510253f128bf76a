use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use super::calendar::CalendarZone;
use super::domain::{PatientId, PatientRecord};
use super::scoring::streak::{consecutive_adherent_days, daily_adherence};

/// Aggregated adherence shown to doctors and on the patient home screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdherenceSummary {
    pub patient_id: PatientId,
    pub name: String,
    pub window_days: u32,
    pub entries_in_window: u32,
    pub adherent_in_window: u32,
    /// Rounded share of adherent entries in the window; 100 when nothing was reported.
    pub adherence_percent: u8,
    pub answered_today: bool,
    pub current_streak: u32,
    pub latest_score: Option<u8>,
}

pub(crate) fn summarize(
    record: &PatientRecord,
    now: DateTime<Utc>,
    window_days: u32,
    calendar: CalendarZone,
) -> AdherenceSummary {
    let window_start = now
        .checked_sub_signed(Duration::days(i64::from(window_days)))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    let in_window = record
        .adherence_history
        .iter()
        .filter(|entry| entry.date >= window_start && entry.date <= now);

    let (entries_in_window, adherent_in_window) =
        in_window.fold((0u32, 0u32), |(total, adherent), entry| {
            (total + 1, adherent + u32::from(entry.adherent))
        });

    let adherence_percent = if entries_in_window == 0 {
        100
    } else {
        ((f64::from(adherent_in_window) / f64::from(entries_in_window)) * 100.0).round() as u8
    };

    let today = calendar.day_of(now);
    let days = daily_adherence(&record.adherence_history, calendar);
    let current_streak = match days.get(&today) {
        Some(true) => consecutive_adherent_days(&days, today, u32::MAX),
        Some(false) => 0,
        None => today
            .pred_opt()
            .map(|yesterday| consecutive_adherent_days(&days, yesterday, u32::MAX))
            .unwrap_or(0),
    };

    AdherenceSummary {
        patient_id: record.patient_id.clone(),
        name: record.name.clone(),
        window_days,
        entries_in_window,
        adherent_in_window,
        adherence_percent,
        answered_today: days.contains_key(&today),
        current_streak,
        latest_score: record
            .latest_entry(now)
            .and_then(|entry| entry.score_value()),
    }
}
