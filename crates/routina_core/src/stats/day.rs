//! Per-day lookup and calendar classification.
//!
//! # Invariants
//! - Classification rules are evaluated in order; the first match wins.
//! - An unmet deadline always classifies as `Warning`, regardless of volume.

use super::totals::minutes_on;
use crate::model::task::Task;
use crate::model::work_session::WorkSession;
use chrono::{Datelike, NaiveDate};

const HIGH_MINUTES: u64 = 4 * 60;
const HIGH_COMPLETED: usize = 3;
const MEDIUM_MINUTES: u64 = 2 * 60;
const MEDIUM_COMPLETED: usize = 2;

/// Records that fall on one calendar day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayActivity<'a> {
    pub date: NaiveDate,
    pub tasks: Vec<&'a Task>,
    pub work_sessions: Vec<&'a WorkSession>,
}

/// Counts derived from a [`DayActivity`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DayStats {
    pub tasks_completed: usize,
    pub tasks_total: usize,
    pub work_minutes: u64,
    /// A task is due on this day and not completed.
    pub has_deadline: bool,
}

impl DayStats {
    pub fn work_hours(&self) -> f64 {
        self.work_minutes as f64 / 60.0
    }

    pub fn has_activity(&self) -> bool {
        self.work_minutes > 0 || self.tasks_completed > 0
    }
}

/// Calendar glyph class for a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DayIntensity {
    Warning,
    High,
    Medium,
    Low,
    None,
}

impl DayIntensity {
    pub fn glyph(self) -> &'static str {
        match self {
            Self::Warning => "⚠️",
            Self::High => "🔥",
            Self::Medium => "📘",
            Self::Low => "✅",
            Self::None => "😐",
        }
    }
}

/// One cell of a month calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DaySummary {
    pub date: NaiveDate,
    pub stats: DayStats,
    pub intensity: DayIntensity,
}

/// Selects tasks and sessions for `date`.
///
/// A task matches when its due date is `date`, or when it is a completed daily
/// task. Tasks keep no per-day completion history, so a completed daily task
/// matches every day until it is un-completed; callers needing per-occurrence
/// accuracy must track it themselves.
pub fn day_activity<'a>(
    tasks: &'a [Task],
    work_sessions: &'a [WorkSession],
    date: NaiveDate,
) -> DayActivity<'a> {
    DayActivity {
        date,
        tasks: tasks
            .iter()
            .filter(|task| task.due_date == Some(date) || (task.is_daily() && task.completed))
            .collect(),
        work_sessions: work_sessions
            .iter()
            .filter(|session| session.date == date)
            .collect(),
    }
}

impl DayActivity<'_> {
    pub fn stats(&self) -> DayStats {
        DayStats {
            tasks_completed: self.tasks.iter().filter(|task| task.completed).count(),
            tasks_total: self.tasks.len(),
            work_minutes: minutes_on(self.work_sessions.iter().copied(), self.date),
            has_deadline: self
                .tasks
                .iter()
                .any(|task| task.due_date == Some(self.date) && !task.completed),
        }
    }
}

pub fn classify_day(stats: &DayStats) -> DayIntensity {
    if stats.has_deadline {
        DayIntensity::Warning
    } else if stats.work_minutes >= HIGH_MINUTES && stats.tasks_completed >= HIGH_COMPLETED {
        DayIntensity::High
    } else if stats.work_minutes >= MEDIUM_MINUTES || stats.tasks_completed >= MEDIUM_COMPLETED {
        DayIntensity::Medium
    } else if stats.has_activity() {
        DayIntensity::Low
    } else {
        DayIntensity::None
    }
}

/// Stats and classification for every day of the month containing `any_day`.
pub fn month_summary(
    tasks: &[Task],
    work_sessions: &[WorkSession],
    any_day: NaiveDate,
) -> Vec<DaySummary> {
    let Some(first) = any_day.with_day(1) else {
        return Vec::new();
    };
    first
        .iter_days()
        .take_while(|date| date.month() == first.month())
        .map(|date| {
            let stats = day_activity(tasks, work_sessions, date).stats();
            DaySummary {
                date,
                stats,
                intensity: classify_day(&stats),
            }
        })
        .collect()
}
