use serde::{Deserialize, Serialize};

use super::super::domain::WearBucket;

/// Points awarded per wear-duration bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationPoints {
    pub under_six: u32,
    pub six_to_ten: u32,
    pub ten_to_fourteen: u32,
    pub fourteen_to_eighteen: u32,
    pub over_eighteen: u32,
}

/// Point weights applied by the scoring engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringRubric {
    pub base_points: u32,
    pub duration_points: DurationPoints,
    /// Raw minutes at or above this earn the full `max_minutes_points`.
    pub full_credit_minutes: f64,
    pub max_minutes_points: u32,
    pub useful_points: u32,
    pub photo_points: u32,
    pub aligner_points: u32,
    pub brace_points: u32,
    pub streak_points_per_day: u32,
    pub streak_cap_days: u32,
    pub max_score: u8,
}

impl ScoringRubric {
    pub fn standard() -> Self {
        Self {
            base_points: 50,
            duration_points: DurationPoints {
                under_six: 0,
                six_to_ten: 8,
                ten_to_fourteen: 15,
                fourteen_to_eighteen: 22,
                over_eighteen: 30,
            },
            full_credit_minutes: 120.0,
            max_minutes_points: 30,
            useful_points: 10,
            photo_points: 10,
            aligner_points: 6,
            brace_points: 4,
            streak_points_per_day: 3,
            streak_cap_days: 7,
            max_score: 100,
        }
    }

    pub(crate) fn bucket_points(&self, bucket: WearBucket) -> u32 {
        let points = &self.duration_points;
        match bucket {
            WearBucket::UnderSix => points.under_six,
            WearBucket::SixToTen => points.six_to_ten,
            WearBucket::TenToFourteen => points.ten_to_fourteen,
            WearBucket::FourteenToEighteen => points.fourteen_to_eighteen,
            WearBucket::OverEighteen => points.over_eighteen,
        }
    }
}

impl Default for ScoringRubric {
    fn default() -> Self {
        Self::standard()
    }
}
