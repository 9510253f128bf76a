//! Adherence tracking for orthodontic appliance wear.
//!
//! Patients submit a daily check-in, the scoring engine converts it into a 0-100 score with an
//! itemized breakdown, and the service layer persists the result on the patient's append-only
//! adherence history.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
