use super::common::*;
use crate::workflows::adherence::calendar::CalendarZone;
use crate::workflows::adherence::domain::{AdherenceSubmission, DurationReport, WearBucket};
use crate::workflows::adherence::scoring::{
    compute_score, ScoreBreakdown, ScoringEngine, ScoringRubric,
};
use chrono::Duration;

fn with_duration(label: &str) -> AdherenceSubmission {
    AdherenceSubmission {
        duration: DurationReport::parse(label),
        ..adherent_submission()
    }
}

#[test]
fn short_wear_scores_base_only() {
    let breakdown = compute_score(&with_duration("<6 hrs"), &[]);

    assert_eq!(
        breakdown,
        ScoreBreakdown {
            adherent: true,
            base: 50,
            duration_points: 0,
            useful_points: 0,
            photo_points: 0,
            appliance_points: 0,
            streak_points: 0,
            total_before_clamp: 50,
            final_score: 50,
        }
    );
}

#[test]
fn adherent_without_details_scores_fifty() {
    let breakdown = compute_score(&adherent_submission(), &[]);
    assert_eq!(breakdown.score(), 50);
    assert_eq!(breakdown.total_before_clamp, 50);
}

#[test]
fn full_marks_are_clamped_to_one_hundred() {
    let submission = AdherenceSubmission {
        was_useful: Some(true),
        has_photo: true,
        appliance_type: Some("Aligner".to_string()),
        ..with_duration(">18 hrs")
    };

    let breakdown = compute_score(&submission, &[]);

    assert_eq!(breakdown.base, 50);
    assert_eq!(breakdown.duration_points, 30);
    assert_eq!(breakdown.useful_points, 10);
    assert_eq!(breakdown.photo_points, 10);
    assert_eq!(breakdown.appliance_points, 6);
    assert_eq!(breakdown.streak_points, 0);
    assert_eq!(breakdown.total_before_clamp, 106);
    assert_eq!(breakdown.final_score, 100);
}

#[test]
fn not_wearing_the_appliance_zeroes_everything() {
    let submission = AdherenceSubmission {
        adherent: false,
        was_useful: Some(true),
        has_photo: true,
        appliance_type: Some("Braces".to_string()),
        ..with_duration(">18 hrs")
    };
    let history = streak_history(submission_time(), 5);

    let breakdown = compute_score(&submission, &history);

    assert_eq!(breakdown, ScoreBreakdown::not_adherent());
    assert_eq!(breakdown.score(), 0);
}

#[test]
fn three_day_streak_adds_nine_points() {
    let history = vec![
        entry(at(2025, 3, 7, 21), true),
        entry(at(2025, 3, 8, 7), true),
        entry(at(2025, 3, 9, 13), true),
    ];

    let breakdown = compute_score(&with_duration("10-14 hrs"), &history);

    assert_eq!(breakdown.duration_points, 15);
    assert_eq!(breakdown.streak_points, 9);
    assert_eq!(breakdown.final_score, 74);
}

#[test]
fn streak_is_capped_at_seven_days() {
    let history = streak_history(submission_time(), 10);

    let breakdown = compute_score(&adherent_submission(), &history);

    assert_eq!(breakdown.streak_points, 21);
    assert_eq!(breakdown.final_score, 71);
}

#[test]
fn raw_minutes_are_scaled() {
    let breakdown = compute_score(&with_duration("45"), &[]);
    assert_eq!(breakdown.duration_points, 11);
    assert_eq!(breakdown.final_score, 61);
}

#[test]
fn unrecognized_duration_and_appliance_contribute_nothing() {
    let submission = AdherenceSubmission {
        appliance_type: Some("Headgear".to_string()),
        ..with_duration("all night")
    };
    let breakdown = compute_score(&submission, &[]);
    assert_eq!(breakdown.duration_points, 0);
    assert_eq!(breakdown.appliance_points, 0);
    assert_eq!(breakdown.final_score, 50);
}

#[test]
fn streak_stops_at_the_first_gap() {
    let history = vec![
        entry(at(2025, 3, 5, 9), true),
        entry(at(2025, 3, 6, 9), true),
        // 2025-03-07 missing
        entry(at(2025, 3, 8, 9), true),
        entry(at(2025, 3, 9, 9), true),
    ];

    let breakdown = compute_score(&adherent_submission(), &history);
    assert_eq!(breakdown.streak_points, 6);
}

#[test]
fn missed_yesterday_means_no_streak() {
    let mut history = streak_history(at(2025, 3, 9, 9), 4);
    history.push(entry(at(2025, 3, 9, 20), false));

    let breakdown = compute_score(&adherent_submission(), &history);
    assert_eq!(breakdown.streak_points, 0);
}

#[test]
fn entries_from_the_submission_day_do_not_count() {
    let history = vec![
        entry(at(2025, 3, 9, 9), true),
        entry(at(2025, 3, 10, 6), true),
    ];

    let breakdown = compute_score(&adherent_submission(), &history);
    assert_eq!(breakdown.streak_points, 3);
}

#[test]
fn history_is_sorted_before_walking() {
    let history = vec![
        entry(at(2025, 3, 9, 9), true),
        entry(at(2025, 3, 7, 9), true),
        entry(at(2025, 3, 8, 9), true),
    ];

    let breakdown = compute_score(&adherent_submission(), &history);
    assert_eq!(breakdown.streak_points, 9);
}

#[test]
fn latest_entry_of_a_day_decides_that_day() {
    let corrected = vec![
        entry(at(2025, 3, 9, 8), false),
        entry(at(2025, 3, 9, 22), true),
    ];
    assert_eq!(
        compute_score(&adherent_submission(), &corrected).streak_points,
        3
    );

    // Inserted out of order: the later timestamp still wins.
    let retracted = vec![
        entry(at(2025, 3, 9, 22), false),
        entry(at(2025, 3, 9, 8), true),
    ];
    assert_eq!(
        compute_score(&adherent_submission(), &retracted).streak_points,
        0
    );
}

#[test]
fn calendar_days_follow_the_clinic_offset() {
    // 20:00 UTC on the 8th is already the 9th in India (+05:30).
    let history = vec![entry(at(2025, 3, 8, 20), true)];
    let submission = adherent_submission();

    let utc = ScoringEngine::standard(CalendarZone::utc());
    assert_eq!(utc.score(&submission, &history).streak_points, 0);

    let ist = ScoringEngine::standard(CalendarZone::from_offset_minutes(330).expect("offset"));
    assert_eq!(ist.score(&submission, &history).streak_points, 3);
}

#[test]
fn scoring_is_idempotent() {
    let submission = AdherenceSubmission {
        duration: Some(DurationReport::Bucket(WearBucket::FourteenToEighteen)),
        has_photo: true,
        ..adherent_submission()
    };
    let history = streak_history(submission_time(), 3);

    let first = compute_score(&submission, &history);
    let second = compute_score(&submission, &history);
    assert_eq!(first, second);
}

#[test]
fn streak_points_never_decrease_with_longer_streaks() {
    let mut previous = 0;
    for days in 0..=10 {
        let history = streak_history(submission_time(), days);
        let breakdown = compute_score(&adherent_submission(), &history);
        assert!(breakdown.streak_points >= previous);
        assert!(breakdown.streak_points <= 21);
        assert!(breakdown.final_score <= 100);
        assert_eq!(
            u32::from(breakdown.final_score),
            breakdown.total_before_clamp.min(100)
        );
        previous = breakdown.streak_points;
    }
    assert_eq!(previous, 21);
}

#[test]
fn explanation_lists_non_zero_contributions() {
    let submission = AdherenceSubmission {
        has_photo: true,
        ..with_duration("14-18 hrs")
    };
    let history = streak_history(submission_time() - Duration::hours(1), 3);

    let breakdown = compute_score(&submission, &history);
    assert_eq!(
        breakdown.explain(),
        "Base: 50, Duration: +22, Photo: +10, Streak: +9 → 91"
    );

    let capped = AdherenceSubmission {
        was_useful: Some(true),
        has_photo: true,
        appliance_type: Some("aligner".to_string()),
        ..with_duration(">18 hrs")
    };
    assert!(compute_score(&capped, &[])
        .explain()
        .ends_with("→ 100 (capped from 106)"));
    assert_eq!(
        ScoreBreakdown::not_adherent().explain(),
        "Appliance not worn → 0"
    );
}

#[test]
fn zero_base_rubric_still_explains_an_adherent_check_in() {
    let engine = ScoringEngine::new(
        ScoringRubric {
            base_points: 0,
            ..ScoringRubric::standard()
        },
        CalendarZone::utc(),
    );

    let worn = engine.score(&adherent_submission(), &[]);
    assert!(worn.adherent);
    assert_eq!(worn.score(), 0);
    assert_eq!(worn.explain(), "Base: 0 → 0");

    let missed = engine.score(&AdherenceSubmission::new(false, submission_time()), &[]);
    assert!(!missed.adherent);
    assert_eq!(missed.explain(), "Appliance not worn → 0");
}
