use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::calendar::CalendarZone;
use super::domain::{AdherenceHistoryEntry, AdherenceSubmission, DurationReport, EntryScore};

/// Body of `POST /api/v1/adherence-entries/:patient_id`.
///
/// `duration` keeps the form's single string field (bucket label or minutes), while
/// `durationMinutes` lets clients send minutes explicitly; the explicit field wins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdherenceEntryRequest {
    #[serde(default)]
    pub adherence: Option<bool>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub useful: Option<bool>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub duration_minutes: Option<f64>,
    #[serde(default)]
    pub appliance_type: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
}

/// Validation failures raised before the scoring engine is consulted.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IntakeError {
    #[error("adherence must be a boolean")]
    MissingAdherence,
    #[error("patient id is required")]
    MissingPatientId,
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("score override must be between 0 and 100 (got {0})")]
    ScoreOutOfRange(f64),
    #[error("durationMinutes must be a finite number (got {0})")]
    InvalidDurationMinutes(f64),
    #[error("date '{0}' must be an RFC 3339 timestamp or YYYY-MM-DD")]
    InvalidDate(String),
    #[error("date '{0}' is later than today")]
    FutureDate(String),
}

/// Request after validation, ready to be scored and appended.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ValidatedEntry {
    pub(crate) submission: AdherenceSubmission,
    pub(crate) notes: String,
    pub(crate) duration_label: Option<String>,
    pub(crate) photo_url: Option<String>,
    pub(crate) override_score: Option<u8>,
    pub(crate) reason: Option<String>,
}

impl AdherenceEntryRequest {
    pub(crate) fn validate(
        self,
        now: DateTime<Utc>,
        calendar: CalendarZone,
    ) -> Result<ValidatedEntry, IntakeError> {
        let adherent = self.adherence.ok_or(IntakeError::MissingAdherence)?;

        let override_score = self.score.map(validate_override).transpose()?;

        let submitted_at = match non_blank(self.date) {
            Some(raw) => {
                let submitted_at = calendar
                    .parse_timestamp(&raw)
                    .ok_or_else(|| IntakeError::InvalidDate(raw.clone()))?;
                // Backdating is allowed; days that have not started in the clinic are not.
                if calendar.day_of(submitted_at) > calendar.day_of(now) {
                    return Err(IntakeError::FutureDate(raw));
                }
                submitted_at
            }
            None => now,
        };

        let duration_text = non_blank(self.duration);
        let duration = match self.duration_minutes {
            Some(minutes) if !minutes.is_finite() => {
                return Err(IntakeError::InvalidDurationMinutes(minutes))
            }
            Some(minutes) => Some(DurationReport::Minutes(minutes)),
            None => duration_text.as_deref().and_then(DurationReport::parse),
        };
        let duration_label = match self.duration_minutes {
            Some(_) => duration.as_ref().map(DurationReport::label),
            None => duration_text,
        };

        let photo_url = non_blank(self.photo_url);
        let appliance_type = non_blank(self.appliance_type);

        let submission = AdherenceSubmission {
            adherent,
            duration,
            was_useful: self.useful,
            has_photo: photo_url.is_some(),
            appliance_type,
            submitted_at,
        };

        Ok(ValidatedEntry {
            submission,
            notes: self.notes.unwrap_or_default(),
            duration_label,
            photo_url,
            override_score,
            reason: non_blank(self.reason),
        })
    }
}

impl ValidatedEntry {
    pub(crate) fn to_entry(&self, score: EntryScore) -> AdherenceHistoryEntry {
        AdherenceHistoryEntry {
            date: self.submission.submitted_at,
            adherent: self.submission.adherent,
            notes: self.notes.clone(),
            was_useful: self.submission.was_useful,
            duration_label: self.duration_label.clone(),
            appliance_type: self.submission.appliance_type.clone(),
            photo_url: self.photo_url.clone(),
            score: Some(score),
            reason: self.reason.clone(),
        }
    }
}

fn validate_override(value: f64) -> Result<u8, IntakeError> {
    if !value.is_finite() || !(0.0..=100.0).contains(&value) {
        return Err(IntakeError::ScoreOutOfRange(value));
    }
    Ok(value.round() as u8)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|trimmed| !trimmed.is_empty())
}
