//! Derived statistics over store snapshots.
//!
//! # Responsibility
//! - Compute day-level and period-level summaries from raw collections.
//!
//! # Invariants
//! - Every function is pure; inputs are never mutated.
//! - Rates never divide by zero; empty inputs yield 0.

pub mod dashboard;
pub mod day;
pub mod totals;

pub use dashboard::{
    active_goals, average_goal_progress, days_left, summarize, upcoming_tasks, DashboardSummary,
    Urgency, UPCOMING_LIMIT,
};
pub use day::{classify_day, day_activity, month_summary, DayActivity, DayIntensity, DayStats, DaySummary};
pub use totals::{
    completion_rate, minutes_between, minutes_on, minutes_since, total_minutes, CompletionMood,
    WEEK_DAYS,
};
