//! Dashboard summary entry point.
//!
//! # Responsibility
//! - Wire configuration, logging and the configured backend into a store.
//! - Print today's dashboard numbers in a deterministic plain-text layout.

use chrono::NaiveDate;
use log::{error, info};
use routina_core::stats::{
    classify_day, day_activity, days_left, summarize, upcoming_tasks, CompletionMood, Urgency,
    UPCOMING_LIMIT,
};
use routina_core::{
    open_backend, AppConfig, AppStore, Clock, CollectionBackend, DataService, IdGenerator,
    SystemClock,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("routina: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), String> {
    let config = AppConfig::from_env()?;
    std::fs::create_dir_all(&config.data_dir).map_err(|err| {
        format!(
            "failed to create data directory `{}`: {err}",
            config.data_dir.display()
        )
    })?;

    let log_dir = config.log_dir();
    let log_dir = log_dir
        .to_str()
        .ok_or_else(|| format!("log directory `{}` is not valid UTF-8", log_dir.display()))?;
    routina_core::init_logging(config.log_level, log_dir)?;
    info!(
        "event=cli_start module=cli status=ok version={} backend={}",
        routina_core::core_version(),
        config.backend
    );

    let store = AppStore::load(DataService::new(open_backend(&config)));
    let today = SystemClock.today();
    print_dashboard(&store, today);

    if let Some(message) = store.error() {
        error!("event=cli_load module=cli status=error error={message}");
    }
    Ok(())
}

fn print_dashboard<B, C, G>(store: &AppStore<B, C, G>, today: NaiveDate)
where
    B: CollectionBackend,
    C: Clock,
    G: IdGenerator,
{
    let summary = summarize(store.snapshot(), today);
    let mood = CompletionMood::from_rate(summary.completion_rate);

    println!("routina {} ({today})", routina_core::core_version());
    if let Some(message) = store.error() {
        println!("! storage unavailable: {message}");
    }
    if store.is_sample_data() {
        println!("! showing sample data");
    }

    println!(
        "today        {}h {:02}m",
        summary.today_minutes / 60,
        summary.today_minutes % 60
    );
    println!(
        "this week    {}h {:02}m",
        summary.week_minutes / 60,
        summary.week_minutes % 60
    );
    println!(
        "daily tasks  {}/{} ({:.0}%) {}",
        summary.daily_completed,
        summary.daily_total,
        summary.completion_rate,
        mood.glyph()
    );
    println!(
        "goals        {} active, {}% average",
        summary.active_goals, summary.average_goal_progress
    );
    println!("streak       {}", summary.total_streak);

    let day = day_activity(store.tasks(), store.work_sessions(), today).stats();
    println!("calendar     {}", classify_day(&day).glyph());

    let upcoming = upcoming_tasks(store.tasks(), UPCOMING_LIMIT);
    if upcoming.is_empty() {
        return;
    }
    println!("upcoming");
    for task in upcoming {
        let Some(due) = task.due_date else {
            continue;
        };
        let left = days_left(due, today);
        let marker = match Urgency::from_days_left(left) {
            Urgency::Urgent => "!!",
            Urgency::Soon => "! ",
            Urgency::Later => "  ",
        };
        println!("  {marker} {} {} (due {due}, {left}d)", task.emoji, task.title);
    }
}
