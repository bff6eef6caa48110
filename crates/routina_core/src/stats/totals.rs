//! Time totals and completion rates.

use crate::model::task::Task;
use crate::model::work_session::WorkSession;
use chrono::{Days, NaiveDate};

/// Length of the rolling "this week" window, in calendar days including today.
pub const WEEK_DAYS: u64 = 7;

/// Sum of `duration` minutes over sessions matching `predicate`.
pub fn total_minutes<'a, I, P>(sessions: I, predicate: P) -> u64
where
    I: IntoIterator<Item = &'a WorkSession>,
    P: Fn(&WorkSession) -> bool,
{
    sessions
        .into_iter()
        .filter(|session| predicate(*session))
        .map(|session| u64::from(session.duration))
        .sum()
}

/// Minutes logged on `date`.
pub fn minutes_on<'a>(sessions: impl IntoIterator<Item = &'a WorkSession>, date: NaiveDate) -> u64 {
    total_minutes(sessions, |session| session.date == date)
}

/// Minutes logged in the `days` calendar days ending on `today`, inclusive.
///
/// `days = 7` covers `today - 6 ..= today`; `days = 0` is always 0.
pub fn minutes_since<'a>(
    sessions: impl IntoIterator<Item = &'a WorkSession>,
    today: NaiveDate,
    days: u64,
) -> u64 {
    if days == 0 {
        return 0;
    }
    let start = today
        .checked_sub_days(Days::new(days - 1))
        .unwrap_or(NaiveDate::MIN);
    minutes_between(sessions, start, today)
}

/// Minutes logged within `[start, end]`, both inclusive.
pub fn minutes_between<'a>(
    sessions: impl IntoIterator<Item = &'a WorkSession>,
    start: NaiveDate,
    end: NaiveDate,
) -> u64 {
    total_minutes(sessions, |session| session.date >= start && session.date <= end)
}

/// Completed daily tasks over all daily tasks, as a percentage.
///
/// Returns exactly `0.0` when there are no daily tasks.
pub fn completion_rate(tasks: &[Task]) -> f64 {
    let (completed, total) = tasks
        .iter()
        .filter(|task| task.is_daily())
        .fold((0_usize, 0_usize), |(completed, total), task| {
            (completed + usize::from(task.completed), total + 1)
        });
    if total == 0 {
        return 0.0;
    }
    completed as f64 / total as f64 * 100.0
}

/// Encouragement tier for a completion rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompletionMood {
    /// 80% and above.
    OnFire,
    /// 60% and above.
    Great,
    /// 40% and above.
    Steady,
    GettingStarted,
}

impl CompletionMood {
    pub fn from_rate(rate: f64) -> Self {
        if rate >= 80.0 {
            Self::OnFire
        } else if rate >= 60.0 {
            Self::Great
        } else if rate >= 40.0 {
            Self::Steady
        } else {
            Self::GettingStarted
        }
    }

    pub fn glyph(self) -> &'static str {
        match self {
            Self::OnFire => "🔥",
            Self::Great => "😊",
            Self::Steady => "😐",
            Self::GettingStarted => "😴",
        }
    }
}
