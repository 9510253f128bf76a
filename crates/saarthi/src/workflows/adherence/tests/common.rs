use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;

use crate::config::AdherenceConfig;
use crate::workflows::adherence::domain::{
    AdherenceHistoryEntry, AdherenceSubmission, PatientEnrollment, PatientId, PatientRecord,
};
use crate::workflows::adherence::repository::{PatientRepository, RepositoryError};
use crate::workflows::adherence::service::AdherenceService;

pub(super) fn at(year: i32, month: u32, day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, 0, 0)
        .single()
        .expect("valid instant")
}

/// Reference submission time used across the scoring scenarios.
pub(super) fn submission_time() -> DateTime<Utc> {
    at(2025, 3, 10, 9)
}

pub(super) fn adherent_submission() -> AdherenceSubmission {
    AdherenceSubmission::new(true, submission_time())
}

pub(super) fn entry(date: DateTime<Utc>, adherent: bool) -> AdherenceHistoryEntry {
    AdherenceHistoryEntry::unscored(date, adherent)
}

/// Adherent entries on each of the `days` calendar days before `before`, oldest first.
pub(super) fn streak_history(before: DateTime<Utc>, days: i64) -> Vec<AdherenceHistoryEntry> {
    (1..=days)
        .rev()
        .map(|offset| entry(before - Duration::days(offset), true))
        .collect()
}

pub(super) fn enrollment(contact_number: &str) -> PatientEnrollment {
    PatientEnrollment {
        name: "Asha Verma".to_string(),
        contact_number: contact_number.to_string(),
        appliance_type: Some("Aligner".to_string()),
    }
}

pub(super) fn build_service() -> (AdherenceService<MemoryRepository>, Arc<MemoryRepository>) {
    let repository = Arc::new(MemoryRepository::default());
    let service = AdherenceService::new(repository.clone(), AdherenceConfig::default());
    (service, repository)
}

pub(super) fn enroll<R>(service: &AdherenceService<R>, contact_number: &str) -> PatientId
where
    R: PatientRepository + 'static,
{
    service
        .enroll(enrollment(contact_number), submission_time() - Duration::days(60))
        .expect("enrollment succeeds")
        .patient_id
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    records: Arc<Mutex<HashMap<PatientId, PatientRecord>>>,
}

impl PatientRepository for MemoryRepository {
    fn insert(&self, record: PatientRecord) -> Result<PatientRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("lock");
        if guard.contains_key(&record.patient_id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.patient_id.clone(), record.clone());
        Ok(record)
    }

    fn fetch(&self, id: &PatientId) -> Result<Option<PatientRecord>, RepositoryError> {
        let guard = self.records.lock().expect("lock");
        Ok(guard.get(id).cloned())
    }

    fn find_by_contact(
        &self,
        contact_number: &str,
    ) -> Result<Option<PatientRecord>, RepositoryError> {
        let guard = self.records.lock().expect("lock");
        Ok(guard
            .values()
            .find(|record| record.contact_number == contact_number)
            .cloned())
    }

    fn replace(
        &self,
        mut record: PatientRecord,
        expected_revision: u64,
    ) -> Result<PatientRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("lock");
        let found = guard
            .get(&record.patient_id)
            .map(|stored| stored.revision)
            .ok_or(RepositoryError::NotFound)?;
        if found != expected_revision {
            return Err(RepositoryError::StaleRevision {
                expected: expected_revision,
                found,
            });
        }
        record.revision = expected_revision + 1;
        guard.insert(record.patient_id.clone(), record.clone());
        Ok(record)
    }
}

impl MemoryRepository {
    pub(super) fn history(&self, id: &PatientId) -> Vec<AdherenceHistoryEntry> {
        self.fetch(id)
            .expect("fetch succeeds")
            .map(|record| record.adherence_history)
            .unwrap_or_default()
    }

    /// Append directly, bypassing scoring, to seed prior history.
    pub(super) fn seed_history(&self, id: &PatientId, entries: Vec<AdherenceHistoryEntry>) {
        let mut guard = self.records.lock().expect("lock");
        let record = guard.get_mut(id).expect("patient exists");
        record.adherence_history.extend(entries);
        record.revision += 1;
    }
}

/// Simulates another writer landing between the read and the write of a check-in.
#[derive(Default, Clone)]
pub(super) struct RacingRepository {
    pub(super) inner: MemoryRepository,
    races_remaining: Arc<AtomicU32>,
    racing_entry: Arc<Mutex<Option<AdherenceHistoryEntry>>>,
}

impl RacingRepository {
    pub(super) fn new(races: u32, racing_entry: AdherenceHistoryEntry) -> Self {
        Self {
            inner: MemoryRepository::default(),
            races_remaining: Arc::new(AtomicU32::new(races)),
            racing_entry: Arc::new(Mutex::new(Some(racing_entry))),
        }
    }
}

impl PatientRepository for RacingRepository {
    fn insert(&self, record: PatientRecord) -> Result<PatientRecord, RepositoryError> {
        self.inner.insert(record)
    }

    fn fetch(&self, id: &PatientId) -> Result<Option<PatientRecord>, RepositoryError> {
        self.inner.fetch(id)
    }

    fn find_by_contact(
        &self,
        contact_number: &str,
    ) -> Result<Option<PatientRecord>, RepositoryError> {
        self.inner.find_by_contact(contact_number)
    }

    fn replace(
        &self,
        record: PatientRecord,
        expected_revision: u64,
    ) -> Result<PatientRecord, RepositoryError> {
        let remaining = self.races_remaining.load(Ordering::SeqCst);
        if remaining > 0 {
            self.races_remaining.store(remaining - 1, Ordering::SeqCst);
            let racing = self.racing_entry.lock().expect("lock").take();
            self.inner
                .seed_history(&record.patient_id, racing.into_iter().collect());
        }
        self.inner.replace(record, expected_revision)
    }
}

pub(super) struct UnavailableRepository;

impl PatientRepository for UnavailableRepository {
    fn insert(&self, _record: PatientRecord) -> Result<PatientRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &PatientId) -> Result<Option<PatientRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn find_by_contact(
        &self,
        _contact_number: &str,
    ) -> Result<Option<PatientRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn replace(
        &self,
        _record: PatientRecord,
        _expected_revision: u64,
    ) -> Result<PatientRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("valid json body")
}
