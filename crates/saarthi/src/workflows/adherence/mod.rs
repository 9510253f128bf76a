//! Daily adherence intake, scoring, and reporting.
//!
//! The scoring engine is a pure function of the submission and the patient's prior history.
//! Everything stateful (loading history, appending the scored entry, revision checks) lives in
//! [`AdherenceService`], and [`adherence_router`] exposes it over HTTP.

pub mod calendar;
pub mod domain;
pub mod import;
pub mod intake;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod service;
pub mod summary;

#[cfg(test)]
mod tests;

pub use calendar::CalendarZone;
pub use domain::{
    AdherenceEntryView, AdherenceHistoryEntry, AdherenceSubmission, DurationReport, EntryScore,
    PatientEnrollment, PatientId, PatientRecord, PatientView, WearBucket,
};
pub use import::{HistoryImportError, HistoryImporter};
pub use intake::{AdherenceEntryRequest, IntakeError};
pub use repository::{PatientRepository, RepositoryError};
pub use router::adherence_router;
pub use scoring::{compute_score, DurationPoints, ScoreBreakdown, ScoringEngine, ScoringRubric};
pub use service::{
    AdherenceEntryResponse, AdherenceService, AdherenceServiceError, PatientDetailsView,
    RecordedEntry,
};
pub use summary::AdherenceSummary;
