//! Built-in sample dataset shown when the initial load fails.

use super::Snapshot;
use crate::model::clock::Clock;
use crate::model::goal::Goal;
use crate::model::ids::EntityId;
use crate::model::task::{Priority, Task, TaskKind};
use crate::model::work_session::WorkSession;
use chrono::NaiveDate;

const SAMPLE_TOTAL_STREAK: u32 = 7;

/// Three tasks, two goals and two sessions logged today; no reflections.
pub fn sample_snapshot(clock: &impl Clock) -> Snapshot {
    let created_at = clock.now_utc();
    let today = clock.today();

    let tasks = vec![
        Task {
            id: EntityId::new("1"),
            title: "Revise Linked Lists".to_string(),
            kind: TaskKind::Daily,
            completed: true,
            streak: 3,
            category: "DSA".to_string(),
            emoji: "🔗".to_string(),
            due_date: None,
            priority: Priority::High,
            tags: strings(&["coding", "interview-prep"]),
            created_at,
        },
        Task {
            id: EntityId::new("2"),
            title: "Finish Lab Report".to_string(),
            kind: TaskKind::Weekly,
            completed: false,
            streak: 0,
            category: "Physics".to_string(),
            emoji: "⚗️".to_string(),
            due_date: NaiveDate::from_ymd_opt(2025, 1, 15),
            priority: Priority::High,
            tags: strings(&["lab", "assignment"]),
            created_at,
        },
        Task {
            id: EntityId::new("3"),
            title: "Drink 8 glasses of water".to_string(),
            kind: TaskKind::Daily,
            completed: false,
            streak: 5,
            category: "Health".to_string(),
            emoji: "💧".to_string(),
            due_date: None,
            priority: Priority::Medium,
            tags: strings(&["health", "habit"]),
            created_at,
        },
    ];

    let goals = vec![
        Goal {
            id: EntityId::new("1"),
            title: "Complete DSA Course".to_string(),
            description:
                "Finish 70% of the Data Structures and Algorithms course before semester ends"
                    .to_string(),
            deadline: NaiveDate::from_ymd_opt(2025, 5, 15).unwrap_or(today),
            progress: 45,
            subtasks: strings(&[
                "Arrays & Strings",
                "Linked Lists",
                "Trees",
                "Graphs",
                "Dynamic Programming",
            ]),
            category: "Academic".to_string(),
            motivational_quote: Some("Code is poetry written in logic! 💻✨".to_string()),
        },
        Goal {
            id: EntityId::new("2"),
            title: "Build Portfolio Website".to_string(),
            description: "Create a professional portfolio to showcase projects".to_string(),
            deadline: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap_or(today),
            progress: 20,
            subtasks: strings(&["Design mockups", "Frontend development", "Deploy to Vercel"]),
            category: "Career".to_string(),
            motivational_quote: None,
        },
    ];

    let work_sessions = vec![
        WorkSession {
            id: EntityId::new("1"),
            project: "DSA Practice".to_string(),
            duration: 120,
            tags: strings(&["coding", "leetcode"]),
            date: today,
            notes: "Solved 5 medium problems on binary trees".to_string(),
            mood: Some("🧠".to_string()),
        },
        WorkSession {
            id: EntityId::new("2"),
            project: "React Portfolio".to_string(),
            duration: 90,
            tags: strings(&["frontend", "react"]),
            date: today,
            notes: "Built the hero section with animations".to_string(),
            mood: Some("🚀".to_string()),
        },
    ];

    Snapshot {
        tasks,
        goals,
        work_sessions,
        reflections: Vec::new(),
        total_streak: SAMPLE_TOTAL_STREAK,
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}
