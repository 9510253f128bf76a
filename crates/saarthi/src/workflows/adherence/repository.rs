use super::domain::{PatientId, PatientRecord};

/// Storage abstraction for patient documents and their adherence history.
///
/// Writes are optimistic: `replace` only succeeds while the stored revision still matches the
/// revision the caller read, which serializes concurrent check-ins for the same patient
/// without a global lock.
pub trait PatientRepository: Send + Sync {
    fn insert(&self, record: PatientRecord) -> Result<PatientRecord, RepositoryError>;
    fn fetch(&self, id: &PatientId) -> Result<Option<PatientRecord>, RepositoryError>;
    fn find_by_contact(&self, contact_number: &str)
        -> Result<Option<PatientRecord>, RepositoryError>;
    /// Store `record` if the current revision equals `expected_revision`. The stored copy is
    /// returned with its revision set to `expected_revision + 1`.
    fn replace(
        &self,
        record: PatientRecord,
        expected_revision: u64,
    ) -> Result<PatientRecord, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("patient not found")]
    NotFound,
    #[error("patient record changed (expected revision {expected}, found {found})")]
    StaleRevision { expected: u64, found: u64 },
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
