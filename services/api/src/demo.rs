use crate::infra::InMemoryPatientRepository;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use clap::Args;
use saarthi::config::{AdherenceConfig, AppConfig};
use saarthi::error::AppError;
use saarthi::workflows::adherence::{
    AdherenceEntryRequest, AdherenceHistoryEntry, AdherenceService, AdherenceSubmission,
    CalendarZone, DurationReport, HistoryImporter, PatientEnrollment, ScoreBreakdown,
    ScoringEngine, WearBucket,
};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// Record the appliance as not worn (scores 0)
    #[arg(long)]
    pub(crate) not_adherent: bool,
    /// Wear duration as reported on the form, e.g. "14-18 hrs" or "240"
    #[arg(long)]
    pub(crate) duration: Option<String>,
    /// Wear duration in minutes; takes precedence over --duration
    #[arg(long, conflicts_with = "duration")]
    pub(crate) minutes: Option<f64>,
    /// Patient found the appliance useful that day
    #[arg(long)]
    pub(crate) useful: bool,
    /// A photo was attached to the check-in
    #[arg(long)]
    pub(crate) photo: bool,
    /// Appliance description, e.g. "Aligner" or "Braces"
    #[arg(long)]
    pub(crate) appliance: Option<String>,
    /// Check-in date (YYYY-MM-DD). Defaults to today in the clinic calendar.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) date: Option<NaiveDate>,
    /// CSV export of prior check-ins used for the streak
    #[arg(long)]
    pub(crate) history: Option<PathBuf>,
    /// Print the result as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Day of the final check-in (YYYY-MM-DD). Defaults to today in the clinic calendar.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Adherent days replayed before today's check-in
    #[arg(long, default_value_t = 7)]
    pub(crate) streak_days: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScoreReport {
    date: NaiveDate,
    utc_offset_minutes: i32,
    history_entries: usize,
    score: u8,
    breakdown: ScoreBreakdown,
    explanation: String,
}

pub(crate) fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let calendar = AppConfig::load()?.adherence.calendar;
    let report = score_check_in(ScoreInput::from(&args), calendar, Utc::now())?;

    if args.json {
        let json = serde_json::to_string_pretty(&report)
            .map_err(|err| AppError::InvalidInput(format!("unable to render report: {err}")))?;
        println!("{json}");
        return Ok(());
    }

    println!(
        "Adherence score for {} (UTC{})",
        report.date,
        calendar.offset()
    );
    println!("- prior entries considered: {}", report.history_entries);
    let breakdown = &report.breakdown;
    println!(
        "- base {} | duration +{} | useful +{} | photo +{} | appliance +{} | streak +{}",
        breakdown.base,
        breakdown.duration_points,
        breakdown.useful_points,
        breakdown.photo_points,
        breakdown.appliance_points,
        breakdown.streak_points,
    );
    println!("Score: {}", report.score);
    println!("{}", report.explanation);
    Ok(())
}

struct ScoreInput {
    adherent: bool,
    duration: Option<String>,
    minutes: Option<f64>,
    useful: bool,
    photo: bool,
    appliance: Option<String>,
    date: Option<NaiveDate>,
    history: Option<PathBuf>,
}

impl From<&ScoreArgs> for ScoreInput {
    fn from(args: &ScoreArgs) -> Self {
        Self {
            adherent: !args.not_adherent,
            duration: args.duration.clone(),
            minutes: args.minutes,
            useful: args.useful,
            photo: args.photo,
            appliance: args.appliance.clone(),
            date: args.date,
            history: args.history.clone(),
        }
    }
}

fn score_check_in(
    input: ScoreInput,
    calendar: CalendarZone,
    now: DateTime<Utc>,
) -> Result<ScoreReport, AppError> {
    let date = input.date.unwrap_or_else(|| calendar.day_of(now));
    let submitted_at = midday(calendar, date)?;

    let duration = match input.minutes {
        Some(minutes) if !minutes.is_finite() => {
            return Err(AppError::InvalidInput(format!(
                "--minutes must be a finite number (got {minutes})"
            )))
        }
        Some(minutes) => Some(DurationReport::Minutes(minutes)),
        None => input.duration.as_deref().and_then(DurationReport::parse),
    };

    let history: Vec<AdherenceHistoryEntry> = match input.history {
        Some(path) => HistoryImporter::from_path(path, calendar)?,
        None => Vec::new(),
    };

    let submission = AdherenceSubmission {
        adherent: input.adherent,
        duration,
        was_useful: Some(input.useful),
        has_photo: input.photo,
        appliance_type: input.appliance,
        submitted_at,
    };

    let breakdown = ScoringEngine::standard(calendar).score(&submission, &history);
    Ok(ScoreReport {
        date,
        utc_offset_minutes: calendar.offset_minutes(),
        history_entries: history.len(),
        score: breakdown.score(),
        breakdown,
        explanation: breakdown.explain(),
    })
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?.adherence;
    let today = args
        .today
        .unwrap_or_else(|| config.calendar.day_of(Utc::now()));
    replay_demo(config, today, args.streak_days)
}

fn replay_demo(
    config: AdherenceConfig,
    today: NaiveDate,
    streak_days: u32,
) -> Result<(), AppError> {
    let calendar = config.calendar;
    let repository = Arc::new(InMemoryPatientRepository::default());
    let service = AdherenceService::new(repository, config);
    let now = midday(calendar, today)? + Duration::hours(8);

    println!("Saarthi adherence demo");
    let first_day = days_before(today, streak_days.saturating_add(1))?;
    let patient = service.enroll(
        PatientEnrollment {
            name: "Demo Patient".to_string(),
            contact_number: "+91-98000-00000".to_string(),
            appliance_type: Some("Clear Aligner".to_string()),
        },
        midday(calendar, first_day)?,
    )?;
    println!(
        "Enrolled {} ({}) on {}",
        patient.name, patient.patient_id, first_day
    );

    // One missed day, then the streak leading up to today.
    let missed = service.record_entry(
        &patient.patient_id,
        AdherenceEntryRequest {
            adherence: Some(false),
            notes: Some("Forgot the trays at a sleepover".to_string()),
            date: Some(first_day.format("%Y-%m-%d").to_string()),
            ..AdherenceEntryRequest::default()
        },
        now,
    )?;
    println!("\nCheck-ins");
    println!("  {} | {}", first_day, missed.explanation());

    for offset in (1..=streak_days).rev() {
        let day = days_before(today, offset)?;
        let bucket = WearBucket::ALL[(offset as usize) % WearBucket::ALL.len()];
        let recorded = service.record_entry(
            &patient.patient_id,
            AdherenceEntryRequest {
                adherence: Some(true),
                duration: Some(bucket.label().to_string()),
                useful: Some(offset % 2 == 0),
                photo_url: (offset % 3 == 0)
                    .then(|| format!("https://photos.saarthi.example/demo/{day}.jpg")),
                appliance_type: patient.appliance_type.clone(),
                date: Some(day.format("%Y-%m-%d").to_string()),
                ..AdherenceEntryRequest::default()
            },
            now,
        )?;
        println!("  {} | {}", day, recorded.explanation());
    }

    let todays = service.record_entry(
        &patient.patient_id,
        AdherenceEntryRequest {
            adherence: Some(true),
            duration: Some(WearBucket::OverEighteen.label().to_string()),
            useful: Some(true),
            appliance_type: patient.appliance_type.clone(),
            ..AdherenceEntryRequest::default()
        },
        now,
    )?;
    println!("  {} | {}", today, todays.explanation());

    let summary = service.summary(&patient.patient_id, now)?;
    println!(
        "\nSummary (last {} days): {} entries | {}% adherent | streak {} day(s) | answered today: {}",
        summary.window_days,
        summary.entries_in_window,
        summary.adherence_percent,
        summary.current_streak,
        if summary.answered_today { "yes" } else { "no" }
    );
    match serde_json::to_string_pretty(&todays.response()) {
        Ok(json) => println!("\nLatest check-in payload:\n{json}"),
        Err(err) => println!("\nLatest check-in payload unavailable: {err}"),
    }

    Ok(())
}

fn days_before(day: NaiveDate, days: u32) -> Result<NaiveDate, AppError> {
    day.checked_sub_signed(Duration::days(i64::from(days)))
        .ok_or_else(|| AppError::InvalidInput(format!("{day} minus {days} days is out of range")))
}

fn midday(calendar: CalendarZone, day: NaiveDate) -> Result<DateTime<Utc>, AppError> {
    calendar
        .start_of_day(day)
        .map(|start| start + Duration::hours(12))
        .ok_or_else(|| {
            AppError::InvalidInput(format!("{day} has no midnight in the clinic calendar"))
        })
}
