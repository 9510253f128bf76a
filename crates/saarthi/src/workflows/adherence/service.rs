use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::domain::{
    AdherenceEntryView, AdherenceHistoryEntry, EntryScore, PatientEnrollment, PatientId,
    PatientRecord, PatientView,
};
use super::intake::{AdherenceEntryRequest, IntakeError};
use super::repository::{PatientRepository, RepositoryError};
use super::scoring::ScoringEngine;
use super::summary::{summarize, AdherenceSummary};
use crate::config::AdherenceConfig;

/// Service composing the repository and the scoring engine.
pub struct AdherenceService<R> {
    repository: Arc<R>,
    engine: Arc<ScoringEngine>,
    config: AdherenceConfig,
}

static PATIENT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_patient_id() -> PatientId {
    let id = PATIENT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    PatientId(format!("pat-{id:06}"))
}

impl<R> AdherenceService<R>
where
    R: PatientRepository + 'static,
{
    pub fn new(repository: Arc<R>, config: AdherenceConfig) -> Self {
        let engine = ScoringEngine::standard(config.calendar);
        Self::with_engine(repository, engine, config)
    }

    pub fn with_engine(repository: Arc<R>, engine: ScoringEngine, config: AdherenceConfig) -> Self {
        Self {
            repository,
            engine: Arc::new(engine),
            config,
        }
    }

    pub fn engine(&self) -> &ScoringEngine {
        &self.engine
    }

    /// Create a patient with an empty history. Contact numbers are unique.
    pub fn enroll(
        &self,
        enrollment: PatientEnrollment,
        now: DateTime<Utc>,
    ) -> Result<PatientRecord, AdherenceServiceError> {
        let name = enrollment.name.trim();
        if name.is_empty() {
            return Err(IntakeError::MissingField("name").into());
        }
        let contact_number = enrollment.contact_number.trim();
        if contact_number.is_empty() {
            return Err(IntakeError::MissingField("contactNumber").into());
        }

        if self.repository.find_by_contact(contact_number)?.is_some() {
            return Err(RepositoryError::Conflict.into());
        }

        let record = PatientRecord {
            patient_id: next_patient_id(),
            name: name.to_string(),
            contact_number: contact_number.to_string(),
            appliance_type: enrollment
                .appliance_type
                .map(|appliance| appliance.trim().to_string())
                .filter(|appliance| !appliance.is_empty()),
            enrolled_at: now,
            revision: 0,
            adherence_history: Vec::new(),
        };

        let stored = self.repository.insert(record)?;
        info!(patient_id = %stored.patient_id, "patient enrolled");
        Ok(stored)
    }

    /// Validate, score, and append one check-in.
    ///
    /// The score is computed against the history read in the same attempt; if another write
    /// lands first the record is reloaded and rescored, up to `max_write_attempts` times.
    pub fn record_entry(
        &self,
        patient_id: &PatientId,
        request: AdherenceEntryRequest,
        now: DateTime<Utc>,
    ) -> Result<RecordedEntry, AdherenceServiceError> {
        if patient_id.0.trim().is_empty() {
            return Err(IntakeError::MissingPatientId.into());
        }

        let validated = request.validate(now, self.engine.calendar())?;
        let attempts = self.config.max_write_attempts.max(1);

        for attempt in 1..=attempts {
            let mut record = self
                .repository
                .fetch(patient_id)?
                .ok_or(RepositoryError::NotFound)?;
            let expected_revision = record.revision;

            let score = match validated.override_score {
                Some(value) => EntryScore::Overridden { value },
                None => EntryScore::Computed {
                    breakdown: self
                        .engine
                        .score(&validated.submission, &record.adherence_history),
                },
            };
            if let Some(breakdown) = score.breakdown() {
                debug!(patient_id = %patient_id, ?breakdown, "adherence breakdown computed");
            }

            let entry = validated.to_entry(score);
            record.adherence_history.push(entry.clone());

            match self.repository.replace(record, expected_revision) {
                Ok(stored) => {
                    info!(
                        patient_id = %patient_id,
                        adherent = entry.adherent,
                        score = entry.score_value(),
                        source = entry.score.as_ref().map(EntryScore::source_label),
                        revision = stored.revision,
                        "adherence entry recorded"
                    );
                    return Ok(RecordedEntry {
                        patient_id: patient_id.clone(),
                        entry,
                        revision: stored.revision,
                    });
                }
                Err(RepositoryError::StaleRevision { expected, found }) => {
                    warn!(
                        patient_id = %patient_id,
                        attempt,
                        expected,
                        found,
                        "patient record changed while recording adherence; rescoring"
                    );
                }
                Err(other) => return Err(other.into()),
            }
        }

        Err(AdherenceServiceError::ConcurrentModification {
            patient_id: patient_id.clone(),
            attempts,
        })
    }

    pub fn summary(
        &self,
        patient_id: &PatientId,
        now: DateTime<Utc>,
    ) -> Result<AdherenceSummary, AdherenceServiceError> {
        let record = self.patient(patient_id)?;
        Ok(summarize(
            &record,
            now,
            self.config.summary_window_days,
            self.engine.calendar(),
        ))
    }

    /// Full patient document plus the adherence percentage over the summary window.
    pub fn details(
        &self,
        patient_id: &PatientId,
        now: DateTime<Utc>,
    ) -> Result<PatientDetailsView, AdherenceServiceError> {
        let record = self.patient(patient_id)?;
        let summary = summarize(
            &record,
            now,
            self.config.summary_window_days,
            self.engine.calendar(),
        );
        Ok(PatientDetailsView {
            name: record.name.clone(),
            details: record.view(),
            adherence_percent: summary.adherence_percent,
        })
    }

    pub fn patient(&self, patient_id: &PatientId) -> Result<PatientRecord, AdherenceServiceError> {
        let record = self
            .repository
            .fetch(patient_id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(record)
    }
}

/// Outcome of a successful check-in.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedEntry {
    pub patient_id: PatientId,
    pub entry: AdherenceHistoryEntry,
    pub revision: u64,
}

impl RecordedEntry {
    pub fn explanation(&self) -> String {
        match &self.entry.score {
            Some(EntryScore::Computed { breakdown }) => breakdown.explain(),
            Some(EntryScore::Overridden { value }) => format!("Score set manually → {value}"),
            None => "Not scored".to_string(),
        }
    }

    pub fn response(&self) -> AdherenceEntryResponse {
        AdherenceEntryResponse {
            message: "Adherence entry added",
            patient_id: self.patient_id.clone(),
            entry: self.entry.view(),
            explanation: self.explanation(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdherenceEntryResponse {
    pub message: &'static str,
    pub patient_id: PatientId,
    pub entry: AdherenceEntryView,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientDetailsView {
    pub name: String,
    pub details: PatientView,
    pub adherence_percent: u8,
}

/// Error raised by the adherence service.
#[derive(Debug, thiserror::Error)]
pub enum AdherenceServiceError {
    #[error(transparent)]
    Intake(#[from] IntakeError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("patient {patient_id} was modified concurrently; gave up after {attempts} attempts")]
    ConcurrentModification { patient_id: PatientId, attempts: u32 },
}
