use super::super::domain::DurationReport;
use super::rubric::ScoringRubric;

pub(crate) fn duration_points(duration: Option<&DurationReport>, rubric: &ScoringRubric) -> u32 {
    match duration {
        Some(DurationReport::Bucket(bucket)) => rubric.bucket_points(*bucket),
        Some(DurationReport::Minutes(minutes)) => minutes_points(*minutes, rubric),
        None => 0,
    }
}

fn minutes_points(minutes: f64, rubric: &ScoringRubric) -> u32 {
    let full_credit = rubric.full_credit_minutes;
    if !minutes.is_finite() || !full_credit.is_finite() || full_credit <= 0.0 {
        return 0;
    }

    let worn = minutes.clamp(0.0, full_credit);
    ((worn / full_credit) * f64::from(rubric.max_minutes_points)).round() as u32
}

pub(crate) fn useful_points(was_useful: Option<bool>, rubric: &ScoringRubric) -> u32 {
    if was_useful == Some(true) {
        rubric.useful_points
    } else {
        0
    }
}

pub(crate) fn photo_points(has_photo: bool, rubric: &ScoringRubric) -> u32 {
    if has_photo {
        rubric.photo_points
    } else {
        0
    }
}

/// Aligners take precedence when the free text mentions both.
pub(crate) fn appliance_points(appliance_type: Option<&str>, rubric: &ScoringRubric) -> u32 {
    let Some(appliance) = appliance_type else {
        return 0;
    };

    let normalized = appliance.to_lowercase();
    if normalized.contains("aligner") {
        rubric.aligner_points
    } else if normalized.contains("brace") {
        rubric.brace_points
    } else {
        0
    }
}

pub(crate) fn streak_points(streak_days: u32, rubric: &ScoringRubric) -> u32 {
    streak_days
        .min(rubric.streak_cap_days)
        .saturating_mul(rubric.streak_points_per_day)
}
