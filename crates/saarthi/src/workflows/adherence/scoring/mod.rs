mod rubric;
mod rules;
pub(crate) mod streak;

pub use rubric::{DurationPoints, ScoringRubric};

use serde::{Deserialize, Serialize};

use super::calendar::CalendarZone;
use super::domain::{AdherenceHistoryEntry, AdherenceSubmission};

/// Itemized accounting of a computed score. The bonuses sum to `total_before_clamp`, and
/// `final_score` is that total clamped to the rubric maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    /// False when the appliance was not worn and no factor was scored.
    pub adherent: bool,
    pub base: u32,
    pub duration_points: u32,
    pub useful_points: u32,
    pub photo_points: u32,
    pub appliance_points: u32,
    pub streak_points: u32,
    pub total_before_clamp: u32,
    #[serde(rename = "final")]
    pub final_score: u8,
}

impl ScoreBreakdown {
    pub const fn not_adherent() -> Self {
        Self {
            adherent: false,
            base: 0,
            duration_points: 0,
            useful_points: 0,
            photo_points: 0,
            appliance_points: 0,
            streak_points: 0,
            total_before_clamp: 0,
            final_score: 0,
        }
    }

    pub fn score(&self) -> u8 {
        self.final_score
    }

    /// Human readable summary, e.g. `Base: 50, Duration: +22, Photo: +10, Streak: +9 → 91`.
    pub fn explain(&self) -> String {
        if !self.adherent {
            return "Appliance not worn → 0".to_string();
        }

        let mut parts = vec![format!("Base: {}", self.base)];
        let bonuses = [
            ("Duration", self.duration_points),
            ("Useful", self.useful_points),
            ("Photo", self.photo_points),
            ("Appliance", self.appliance_points),
            ("Streak", self.streak_points),
        ];
        parts.extend(
            bonuses
                .into_iter()
                .filter(|(_, points)| *points > 0)
                .map(|(label, points)| format!("{label}: +{points}")),
        );

        let mut explanation = format!("{} → {}", parts.join(", "), self.final_score);
        if self.total_before_clamp > u32::from(self.final_score) {
            explanation.push_str(&format!(" (capped from {})", self.total_before_clamp));
        }
        explanation
    }
}

/// Stateless scorer applying a rubric to one submission and the patient's prior history.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringEngine {
    rubric: ScoringRubric,
    calendar: CalendarZone,
}

impl ScoringEngine {
    pub fn new(rubric: ScoringRubric, calendar: CalendarZone) -> Self {
        Self { rubric, calendar }
    }

    pub fn standard(calendar: CalendarZone) -> Self {
        Self::new(ScoringRubric::standard(), calendar)
    }

    pub fn rubric(&self) -> &ScoringRubric {
        &self.rubric
    }

    pub fn calendar(&self) -> CalendarZone {
        self.calendar
    }

    /// Score a submission against the history as it existed before the submission.
    ///
    /// Not wearing the appliance short-circuits to zero; no other factor is looked at.
    pub fn score(
        &self,
        submission: &AdherenceSubmission,
        prior_history: &[AdherenceHistoryEntry],
    ) -> ScoreBreakdown {
        if !submission.adherent {
            return ScoreBreakdown::not_adherent();
        }

        let rubric = &self.rubric;
        let submission_day = self.calendar.day_of(submission.submitted_at);
        let streak_days = streak::prior_streak(
            prior_history,
            submission_day,
            self.calendar,
            rubric.streak_cap_days,
        );

        let base = rubric.base_points;
        let duration_points = rules::duration_points(submission.duration.as_ref(), rubric);
        let useful_points = rules::useful_points(submission.was_useful, rubric);
        let photo_points = rules::photo_points(submission.has_photo, rubric);
        let appliance_points =
            rules::appliance_points(submission.appliance_type.as_deref(), rubric);
        let streak_points = rules::streak_points(streak_days, rubric);

        let total_before_clamp = [
            base,
            duration_points,
            useful_points,
            photo_points,
            appliance_points,
            streak_points,
        ]
        .into_iter()
        .fold(0u32, u32::saturating_add);

        let ceiling = rubric.max_score.min(100);
        let final_score =
            u8::try_from(total_before_clamp.min(u32::from(ceiling))).unwrap_or(ceiling);

        ScoreBreakdown {
            adherent: true,
            base,
            duration_points,
            useful_points,
            photo_points,
            appliance_points,
            streak_points,
            total_before_clamp,
            final_score,
        }
    }
}

/// Score with the standard rubric, reading calendar days in UTC.
///
/// Use [`ScoringEngine`] with a clinic [`CalendarZone`] when days should follow local time.
pub fn compute_score(
    submission: &AdherenceSubmission,
    prior_history: &[AdherenceHistoryEntry],
) -> ScoreBreakdown {
    ScoringEngine::standard(CalendarZone::utc()).score(submission, prior_history)
}
