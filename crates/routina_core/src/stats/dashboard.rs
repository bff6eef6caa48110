//! Dashboard aggregates over a store snapshot.

use super::totals::{completion_rate, minutes_on, minutes_since, WEEK_DAYS};
use crate::model::goal::Goal;
use crate::model::task::Task;
use crate::store::Snapshot;
use chrono::NaiveDate;

/// Number of upcoming deadlines shown on the dashboard.
pub const UPCOMING_LIMIT: usize = 3;

/// Headline numbers for the dashboard.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DashboardSummary {
    pub daily_completed: usize,
    pub daily_total: usize,
    pub completion_rate: f64,
    pub today_minutes: u64,
    pub week_minutes: u64,
    pub active_goals: usize,
    pub average_goal_progress: u8,
    pub total_streak: u32,
}

/// How close an upcoming deadline is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Urgency {
    /// Due within a day, or overdue.
    Urgent,
    /// Due within three days.
    Soon,
    Later,
}

impl Urgency {
    pub fn from_days_left(days_left: i64) -> Self {
        if days_left <= 1 {
            Self::Urgent
        } else if days_left <= 3 {
            Self::Soon
        } else {
            Self::Later
        }
    }
}

pub fn summarize(snapshot: &Snapshot, today: NaiveDate) -> DashboardSummary {
    let daily = snapshot.tasks.iter().filter(|task| task.is_daily());
    let daily_total = daily.clone().count();
    let daily_completed = daily.filter(|task| task.completed).count();

    DashboardSummary {
        daily_completed,
        daily_total,
        completion_rate: completion_rate(&snapshot.tasks),
        today_minutes: minutes_on(&snapshot.work_sessions, today),
        week_minutes: minutes_since(&snapshot.work_sessions, today, WEEK_DAYS),
        active_goals: active_goals(&snapshot.goals),
        average_goal_progress: average_goal_progress(&snapshot.goals),
        total_streak: snapshot.total_streak,
    }
}

/// Goals below 100% progress.
pub fn active_goals(goals: &[Goal]) -> usize {
    goals.iter().filter(|goal| goal.is_active()).count()
}

/// Mean progress rounded to the nearest percent; 0 with no goals.
pub fn average_goal_progress(goals: &[Goal]) -> u8 {
    if goals.is_empty() {
        return 0;
    }
    let sum: u64 = goals.iter().map(|goal| u64::from(goal.progress)).sum();
    (sum as f64 / goals.len() as f64).round() as u8
}

/// Incomplete tasks with a due date, soonest first, at most `limit`.
pub fn upcoming_tasks(tasks: &[Task], limit: usize) -> Vec<&Task> {
    let mut upcoming: Vec<&Task> = tasks
        .iter()
        .filter(|task| !task.completed && task.due_date.is_some())
        .collect();
    upcoming.sort_by_key(|task| task.due_date);
    upcoming.truncate(limit);
    upcoming
}

/// Whole days from `today` until `due`; negative when overdue.
pub fn days_left(due: NaiveDate, today: NaiveDate) -> i64 {
    (due - today).num_days()
}

#[cfg(test)]
mod tests {
    use super::{days_left, Urgency};
    use chrono::NaiveDate;

    #[test]
    fn urgency_thresholds() {
        let today = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
        let due = |day| NaiveDate::from_ymd_opt(2025, 1, day).unwrap();

        assert_eq!(Urgency::from_days_left(days_left(due(8), today)), Urgency::Urgent);
        assert_eq!(Urgency::from_days_left(days_left(due(11), today)), Urgency::Urgent);
        assert_eq!(Urgency::from_days_left(days_left(due(13), today)), Urgency::Soon);
        assert_eq!(Urgency::from_days_left(days_left(due(14), today)), Urgency::Later);
    }
}
