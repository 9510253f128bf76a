use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::scoring::ScoreBreakdown;

/// Identifier wrapper for enrolled patients.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatientId(pub String);

impl fmt::Display for PatientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Wear-duration buckets offered on the daily check-in form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WearBucket {
    #[serde(rename = "<6 hrs")]
    UnderSix,
    #[serde(rename = "6-10 hrs")]
    SixToTen,
    #[serde(rename = "10-14 hrs")]
    TenToFourteen,
    #[serde(rename = "14-18 hrs")]
    FourteenToEighteen,
    #[serde(rename = ">18 hrs")]
    OverEighteen,
}

impl WearBucket {
    pub const ALL: [WearBucket; 5] = [
        WearBucket::UnderSix,
        WearBucket::SixToTen,
        WearBucket::TenToFourteen,
        WearBucket::FourteenToEighteen,
        WearBucket::OverEighteen,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            WearBucket::UnderSix => "<6 hrs",
            WearBucket::SixToTen => "6-10 hrs",
            WearBucket::TenToFourteen => "10-14 hrs",
            WearBucket::FourteenToEighteen => "14-18 hrs",
            WearBucket::OverEighteen => ">18 hrs",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        let trimmed = label.trim();
        Self::ALL
            .into_iter()
            .find(|bucket| bucket.label() == trimmed)
    }
}

/// How long the appliance was worn, either as a form bucket or as raw minutes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum DurationReport {
    Bucket(WearBucket),
    Minutes(f64),
}

impl DurationReport {
    /// Resolve a free-form duration string: bucket labels first, then a number of minutes.
    ///
    /// Anything else yields `None`, which scores as no duration bonus.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if let Some(bucket) = WearBucket::from_label(trimmed) {
            return Some(Self::Bucket(bucket));
        }

        trimmed
            .parse::<f64>()
            .ok()
            .filter(|minutes| minutes.is_finite())
            .map(Self::Minutes)
    }

    pub fn label(&self) -> String {
        match self {
            DurationReport::Bucket(bucket) => bucket.label().to_string(),
            DurationReport::Minutes(minutes) => format!("{minutes}"),
        }
    }
}

/// One daily check-in as seen by the scoring engine.
#[derive(Debug, Clone, PartialEq)]
pub struct AdherenceSubmission {
    pub adherent: bool,
    pub duration: Option<DurationReport>,
    pub was_useful: Option<bool>,
    pub has_photo: bool,
    pub appliance_type: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

impl AdherenceSubmission {
    /// Submission carrying only the mandatory wear flag.
    pub fn new(adherent: bool, submitted_at: DateTime<Utc>) -> Self {
        Self {
            adherent,
            duration: None,
            was_useful: None,
            has_photo: false,
            appliance_type: None,
            submitted_at,
        }
    }
}

/// How a stored score came to be.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum EntryScore {
    Computed { breakdown: ScoreBreakdown },
    Overridden { value: u8 },
}

impl EntryScore {
    pub fn value(&self) -> u8 {
        match self {
            EntryScore::Computed { breakdown } => breakdown.final_score,
            EntryScore::Overridden { value } => *value,
        }
    }

    pub fn breakdown(&self) -> Option<&ScoreBreakdown> {
        match self {
            EntryScore::Computed { breakdown } => Some(breakdown),
            EntryScore::Overridden { .. } => None,
        }
    }

    pub const fn source_label(&self) -> &'static str {
        match self {
            EntryScore::Computed { .. } => "computed",
            EntryScore::Overridden { .. } => "override",
        }
    }
}

/// Persisted record of a single check-in. Entries are never edited after they are appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdherenceHistoryEntry {
    pub date: DateTime<Utc>,
    pub adherent: bool,
    pub notes: String,
    pub was_useful: Option<bool>,
    pub duration_label: Option<String>,
    pub appliance_type: Option<String>,
    pub photo_url: Option<String>,
    pub score: Option<EntryScore>,
    pub reason: Option<String>,
}

impl AdherenceHistoryEntry {
    /// Entry without any optional details, as produced by imports of legacy exports.
    pub fn unscored(date: DateTime<Utc>, adherent: bool) -> Self {
        Self {
            date,
            adherent,
            notes: String::new(),
            was_useful: None,
            duration_label: None,
            appliance_type: None,
            photo_url: None,
            score: None,
            reason: None,
        }
    }

    pub fn score_value(&self) -> Option<u8> {
        self.score.as_ref().map(EntryScore::value)
    }

    pub fn view(&self) -> AdherenceEntryView {
        AdherenceEntryView {
            date: self.date,
            adherent: self.adherent,
            notes: self.notes.clone(),
            was_useful: self.was_useful,
            duration_label: self.duration_label.clone(),
            appliance_type: self.appliance_type.clone(),
            photo_url: self.photo_url.clone(),
            score: self.score_value(),
            breakdown: self.score.as_ref().and_then(EntryScore::breakdown).copied(),
            score_source: self.score.as_ref().map(EntryScore::source_label),
            reason: self.reason.clone(),
        }
    }
}

/// Wire representation of a history entry: flat `score` and `breakdown` fields plus the source.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdherenceEntryView {
    pub date: DateTime<Utc>,
    pub adherent: bool,
    pub notes: String,
    pub was_useful: Option<bool>,
    pub duration_label: Option<String>,
    pub appliance_type: Option<String>,
    pub photo_url: Option<String>,
    pub score: Option<u8>,
    pub breakdown: Option<ScoreBreakdown>,
    pub score_source: Option<&'static str>,
    pub reason: Option<String>,
}

/// Minimal patient details needed to start logging adherence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientEnrollment {
    pub name: String,
    pub contact_number: String,
    #[serde(default)]
    pub appliance_type: Option<String>,
}

/// Patient document owning the append-only adherence history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    pub patient_id: PatientId,
    pub name: String,
    pub contact_number: String,
    pub appliance_type: Option<String>,
    pub enrolled_at: DateTime<Utc>,
    /// Bumped by the repository on every successful write.
    pub revision: u64,
    pub adherence_history: Vec<AdherenceHistoryEntry>,
}

impl PatientRecord {
    /// Most recent entry dated no later than `as_of`; on ties the later insertion wins.
    pub fn latest_entry(&self, as_of: DateTime<Utc>) -> Option<&AdherenceHistoryEntry> {
        self.adherence_history
            .iter()
            .filter(|entry| entry.date <= as_of)
            .max_by_key(|entry| entry.date)
    }

    pub fn view(&self) -> PatientView {
        PatientView {
            patient_id: self.patient_id.clone(),
            name: self.name.clone(),
            contact_number: self.contact_number.clone(),
            appliance_type: self.appliance_type.clone(),
            enrolled_at: self.enrolled_at,
            revision: self.revision,
            adherence_history: self
                .adherence_history
                .iter()
                .map(AdherenceHistoryEntry::view)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientView {
    pub patient_id: PatientId,
    pub name: String,
    pub contact_number: String,
    pub appliance_type: Option<String>,
    pub enrolled_at: DateTime<Utc>,
    pub revision: u64,
    pub adherence_history: Vec<AdherenceEntryView>,
}
