use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use saarthi::workflows::adherence::{
    PatientId, PatientRecord, PatientRepository, RepositoryError,
};
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Process-local patient store. Every write bumps the record revision.
#[derive(Default, Clone)]
pub(crate) struct InMemoryPatientRepository {
    records: Arc<Mutex<HashMap<PatientId, PatientRecord>>>,
}

impl InMemoryPatientRepository {
    fn lock(&self) -> Result<MutexGuard<'_, HashMap<PatientId, PatientRecord>>, RepositoryError> {
        self.records
            .lock()
            .map_err(|_| RepositoryError::Unavailable("patient store mutex poisoned".to_string()))
    }
}

impl PatientRepository for InMemoryPatientRepository {
    fn insert(&self, record: PatientRecord) -> Result<PatientRecord, RepositoryError> {
        let mut guard = self.lock()?;
        let duplicate_contact = guard
            .values()
            .any(|existing| existing.contact_number == record.contact_number);
        if duplicate_contact || guard.contains_key(&record.patient_id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.patient_id.clone(), record.clone());
        Ok(record)
    }

    fn fetch(&self, id: &PatientId) -> Result<Option<PatientRecord>, RepositoryError> {
        let guard = self.lock()?;
        Ok(guard.get(id).cloned())
    }

    fn find_by_contact(
        &self,
        contact_number: &str,
    ) -> Result<Option<PatientRecord>, RepositoryError> {
        let guard = self.lock()?;
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
        let mut guard = self.lock()?;
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

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
