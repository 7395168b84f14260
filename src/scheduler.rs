use crate::models::{DailyRecord, calculate_hours, date_key, month_key, goal_path, today_key};
use crate::notify::Notification;
use crate::state::AppState;
use chrono::{DateTime, Duration as ChronoDuration, Local, Timelike};
use rand::seq::SliceRandom;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// Main-checkpoint notifications allowed per calendar date.
pub const DAILY_CAP: u32 = 3;

const CADENCE_PERIOD: Duration = Duration::from_secs(2 * 60 * 60);
const COUNTER_PREFIX: &str = "reminders.sent.";

/// The three fixed wall-clock reminder slots. Each is one-shot per
/// process start: a slot already past when the server comes up is never
/// armed, and nothing re-arms slots after midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Checkpoint {
    Morning,
    Midday,
    Evening,
}

impl Checkpoint {
    pub const ALL: [Checkpoint; 3] = [Checkpoint::Morning, Checkpoint::Midday, Checkpoint::Evening];

    pub fn hour(self) -> u32 {
        match self {
            Checkpoint::Morning => 8,
            Checkpoint::Midday => 13,
            Checkpoint::Evening => 20,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Checkpoint::Morning => "08:00",
            Checkpoint::Midday => "13:00",
            Checkpoint::Evening => "20:00",
        }
    }
}

/// Spawns one one-shot task per checkpoint plus the recurring cadence
/// loop. Tasks are fire-and-forget; each checkpoint task exits after its
/// single evaluation.
pub fn arm(state: AppState) {
    for checkpoint in Checkpoint::ALL {
        let state = state.clone();
        tokio::spawn(async move {
            let Some(delay) = delay_until(checkpoint.hour(), Local::now()) else {
                info!("checkpoint {} already past, not arming", checkpoint.label());
                return;
            };
            tokio::time::sleep(delay).await;
            run_checkpoint(&state, checkpoint).await;
        });
    }

    tokio::spawn(async move {
        loop {
            tokio::time::sleep(CADENCE_PERIOD).await;
            run_cadence(&state).await;
        }
    });
}

/// Time until `hour`:00 today, or `None` once that mark has passed.
pub fn delay_until(hour: u32, now: DateTime<Local>) -> Option<Duration> {
    let target = now.date_naive().and_hms_opt(hour, 0, 0)?;
    (target - now.naive_local()).to_std().ok()
}

/// Evaluates one main checkpoint: reads today's record and the dispatch
/// count, fires at most one notification, and bumps the counter when it
/// does.
pub async fn run_checkpoint(state: &AppState, checkpoint: Checkpoint) {
    let date = today_key();
    let record = fetch_record(state, &date).await;

    let sent = sent_count(&state.counter_path, &date);
    if sent >= DAILY_CAP {
        info!(
            "checkpoint {} skipped: daily cap reached ({sent}/{DAILY_CAP})",
            checkpoint.label()
        );
        return;
    }

    let picked = pick_reminder(checkpoint, &record, &mut rand::thread_rng());
    match picked {
        Some(notification) => {
            info!("checkpoint {} firing: {}", checkpoint.label(), notification.title);
            state.notifier.send(notification).await;
            record_send(&state.counter_path, &date);
        }
        None => info!("checkpoint {} skipped: nothing left to log", checkpoint.label()),
    }
}

/// A missing record reads as empty, so an unlogged day looks entirely
/// unmet. A failed load behaves the same way and can over-notify.
async fn fetch_record(state: &AppState, date: &str) -> DailyRecord {
    let data = state.data.lock().await;
    data.days.get(date).cloned().unwrap_or_default()
}

/// Candidate messages for a checkpoint. The morning slot is a priority
/// chain and yields at most one candidate; midday and evening build a
/// pool covering whichever fields are still unmet.
pub fn checkpoint_candidates(checkpoint: Checkpoint, record: &DailyRecord) -> Vec<Notification> {
    match checkpoint {
        Checkpoint::Morning => {
            if record.sleep_start_time.is_none() {
                vec![Notification::new(
                    "Good morning",
                    "Log when you went to sleep last night.",
                )]
            } else if record.work_start_time.is_none() {
                vec![Notification::new(
                    "Ready to start?",
                    "Log your work start time for today.",
                )]
            } else if record.motivation_level.is_none() {
                vec![Notification::new(
                    "Quick check-in",
                    "How motivated do you feel today? Log it on the dashboard.",
                )]
            } else {
                Vec::new()
            }
        }
        Checkpoint::Midday => {
            let mut pool = Vec::new();
            if record.motivation_level.is_none() {
                pool.push(Notification::new(
                    "Midday check-in",
                    "Take ten seconds to log your motivation level.",
                ));
                pool.push(Notification::new(
                    "How is it going?",
                    "Your motivation level is still blank for today.",
                ));
            }
            if record.did_workout.is_none() {
                pool.push(Notification::new(
                    "Move a little",
                    "Did you work out today? Log it either way.",
                ));
                pool.push(Notification::new(
                    "Workout reminder",
                    "A short session still counts. Log your workout.",
                ));
            }
            pool
        }
        Checkpoint::Evening => {
            let mut pool = Vec::new();
            if record.hours_worked.is_none() {
                pool.push(Notification::new(
                    "Wrap up the day",
                    "Log your work end time so your hours are counted.",
                ));
            }
            if record.earnings.is_none() {
                pool.push(Notification::new(
                    "Earnings missing",
                    "How much did you earn today? Add it to the dashboard.",
                ));
                pool.push(Notification::new(
                    "Close the books",
                    "Today's earnings are still blank.",
                ));
            }
            if record.projects_count.is_none() {
                pool.push(Notification::new(
                    "Project count",
                    "How many projects did you touch today?",
                ));
            }
            pool
        }
    }
}

/// At most one notification per checkpoint, chosen uniformly from the
/// candidate pool.
pub fn pick_reminder(
    checkpoint: Checkpoint,
    record: &DailyRecord,
    rng: &mut impl rand::Rng,
) -> Option<Notification> {
    checkpoint_candidates(checkpoint, record).choose(rng).cloned()
}

/// Inputs for the recurring cadence heuristics. Several of these have no
/// producer in the current data model and stay at their defaults, which
/// keeps those heuristics quiet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CadenceSnapshot {
    pub sleep_hours_last_night: Option<f64>,
    pub workouts_this_week: u32,
    pub hours_worked_today: Option<f64>,
    pub continuous_work_hours: Option<f64>,
    pub missed_workout_yesterday: bool,
    pub monthly_earnings: f64,
    pub selected_goal: Option<f64>,
}

/// The uncapped 2-hour heuristics. Every satisfied heuristic fires, with
/// no de-duplication across ticks.
pub fn cadence_reminders(snapshot: &CadenceSnapshot) -> Vec<Notification> {
    let mut out = Vec::new();

    if let Some(hours) = snapshot.sleep_hours_last_night {
        if hours < 6.0 {
            out.push(Notification::new(
                "Short night",
                "You slept under six hours. Consider an earlier night today.",
            ));
        }
    }

    if snapshot.workouts_this_week >= 3 {
        out.push(Notification::new(
            "Streak going",
            "Three or more workouts this week. Keep it up.",
        ));
    }

    if let Some(hours) = snapshot.hours_worked_today {
        if hours >= 6.0 {
            out.push(Notification::new(
                "Solid progress",
                "Over six hours logged today already.",
            ));
        }
    }

    if let Some(hours) = snapshot.continuous_work_hours {
        if hours >= 3.0 {
            out.push(Notification::new(
                "Take a break",
                "You have been working for three hours straight.",
            ));
        }
    }

    if let Some(goal) = snapshot.selected_goal {
        if goal > 0.0 && snapshot.monthly_earnings >= goal * 0.8 {
            out.push(Notification::new(
                "Almost there",
                "You are within 20% of this month's earnings goal.",
            ));
        }
    }

    if snapshot.missed_workout_yesterday {
        out.push(Notification::new(
            "Back at it",
            "No workout yesterday. Today is a good day to move.",
        ));
    }

    out
}

pub async fn run_cadence(state: &AppState) {
    let snapshot = cadence_snapshot(state, Local::now()).await;
    for notification in cadence_reminders(&snapshot) {
        state.notifier.send(notification).await;
    }
}

/// Assembles what the cadence heuristics can see from stored data. Week
/// and month windows are relative to `now`'s local date.
pub async fn cadence_snapshot(state: &AppState, now: DateTime<Local>) -> CadenceSnapshot {
    let today = now.date_naive();
    let data = state.data.lock().await;

    let record = data.days.get(&date_key(today)).cloned().unwrap_or_default();
    let yesterday = data
        .days
        .get(&date_key(today - ChronoDuration::days(1)))
        .cloned()
        .unwrap_or_default();

    let sleep_hours_last_night = match (record.sleep_start_time, record.sleep_end_time) {
        (Some(start), Some(end)) => Some(f64::from(calculate_hours(start, end))),
        _ => None,
    };

    let mut workouts_this_week = 0;
    for offset in 0..7 {
        let day = data
            .days
            .get(&date_key(today - ChronoDuration::days(offset)))
            .cloned()
            .unwrap_or_default();
        if day.did_workout == Some(true) {
            workouts_this_week += 1;
        }
    }

    let month = month_key(today);
    let monthly_earnings: f64 = data
        .days
        .iter()
        .filter(|(date, _)| date.starts_with(&month))
        .filter_map(|(_, day)| day.earnings)
        .sum();

    // Only meaningful while a session is open with no break logged yet.
    let continuous_work_hours = match (record.work_start_time, record.work_end_time) {
        (Some(start), None) if record.work_break.total == 0 && !record.work_break.is_active => {
            let now_hour = now.hour();
            (now_hour > start).then(|| f64::from(now_hour - start))
        }
        _ => None,
    };

    let selected_goal = data
        .goals
        .get(&goal_path(&state.session.user_id, &month))
        .map(|goal| goal.amount);

    CadenceSnapshot {
        sleep_hours_last_night,
        workouts_this_week,
        hours_worked_today: record.hours_worked,
        continuous_work_hours,
        missed_workout_yesterday: yesterday.did_workout == Some(false),
        monthly_earnings,
        selected_goal,
    }
}

fn counter_key(date: &str) -> String {
    format!("{COUNTER_PREFIX}{date}")
}

fn load_counts(path: &Path) -> BTreeMap<String, u32> {
    match std::fs::read(path) {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(counts) => counts,
            Err(err) => {
                warn!("failed to parse reminder counts: {err}");
                BTreeMap::new()
            }
        },
        Err(_) => BTreeMap::new(),
    }
}

/// Main-checkpoint notifications already sent on `date`. Stale dates are
/// simply never read again; nothing prunes them.
pub fn sent_count(path: &Path, date: &str) -> u32 {
    load_counts(path)
        .get(&counter_key(date))
        .copied()
        .unwrap_or(0)
}

/// Read-modify-write of the dispatch counter. Not synchronized across
/// processes; two concurrent writers can lose an increment.
pub fn record_send(path: &Path, date: &str) {
    let mut counts = load_counts(path);
    *counts.entry(counter_key(date)).or_insert(0) += 1;

    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    match serde_json::to_vec_pretty(&counts) {
        Ok(payload) => {
            if let Err(err) = std::fs::write(path, payload) {
                warn!("failed to write reminder counts: {err}");
            }
        }
        Err(err) => warn!("failed to serialize reminder counts: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AppData, GoalDocument};
    use crate::notify::Permission;
    use crate::state::{AppState, SessionInfo};
    use chrono::TimeZone;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::path::PathBuf;

    fn unique_path(tag: &str) -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!(
            "freelance_tracker_{tag}_{}_{nanos}.json",
            std::process::id()
        ))
    }

    fn test_state(data: AppData) -> AppState {
        AppState::new(
            unique_path("data"),
            unique_path("counts"),
            data,
            SessionInfo {
                user_id: "local-user".to_string(),
                name: "Freelancer".to_string(),
            },
        )
    }

    #[test]
    fn morning_priority_prefers_work_start_over_motivation() {
        let record = DailyRecord {
            sleep_start_time: Some(23),
            ..Default::default()
        };
        let candidates = checkpoint_candidates(Checkpoint::Morning, &record);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].title, "Ready to start?");
    }

    #[test]
    fn morning_priority_starts_with_sleep() {
        let candidates = checkpoint_candidates(Checkpoint::Morning, &DailyRecord::default());
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].title, "Good morning");
    }

    #[test]
    fn complete_morning_record_yields_nothing() {
        let record = DailyRecord {
            sleep_start_time: Some(23),
            work_start_time: Some(9),
            motivation_level: Some(4),
            ..Default::default()
        };
        assert!(checkpoint_candidates(Checkpoint::Morning, &record).is_empty());
        assert!(pick_reminder(Checkpoint::Morning, &record, &mut StdRng::seed_from_u64(1)).is_none());
    }

    #[test]
    fn midday_pool_covers_only_unmet_fields() {
        let record = DailyRecord {
            motivation_level: Some(3),
            ..Default::default()
        };
        let pool = checkpoint_candidates(Checkpoint::Midday, &record);
        assert!(!pool.is_empty());
        assert!(pool.iter().all(|n| n.title.contains("orkout") || n.title == "Move a little"));
    }

    #[test]
    fn evening_pool_empty_once_day_is_closed_out() {
        let record = DailyRecord {
            hours_worked: Some(7.0),
            earnings: Some(250.0),
            projects_count: Some(2),
            ..Default::default()
        };
        assert!(checkpoint_candidates(Checkpoint::Evening, &record).is_empty());
    }

    #[test]
    fn pick_reminder_draws_from_the_pool() {
        let record = DailyRecord::default();
        let pool = checkpoint_candidates(Checkpoint::Evening, &record);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let picked = pick_reminder(Checkpoint::Evening, &record, &mut rng).unwrap();
            assert!(pool.contains(&picked));
        }
    }

    #[test]
    fn delay_until_is_none_once_past() {
        let now = Local.with_ymd_and_hms(2026, 3, 10, 9, 30, 0).unwrap();
        assert!(delay_until(8, now).is_none());
        let delay = delay_until(13, now).unwrap();
        assert_eq!(delay.as_secs(), 3 * 3600 + 30 * 60);
    }

    #[test]
    fn counter_increments_per_date() {
        let path = unique_path("counter");
        assert_eq!(sent_count(&path, "2026-03-10"), 0);
        record_send(&path, "2026-03-10");
        record_send(&path, "2026-03-10");
        record_send(&path, "2026-03-11");
        assert_eq!(sent_count(&path, "2026-03-10"), 2);
        assert_eq!(sent_count(&path, "2026-03-11"), 1);
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn cap_allows_three_sequential_fires_then_suppresses() {
        let state = test_state(AppData::default());
        state.notifier.set_permission(Permission::Granted).await;

        // Empty record: every checkpoint has something to remind about.
        let date = today_key();
        run_checkpoint(&state, Checkpoint::Morning).await;
        run_checkpoint(&state, Checkpoint::Midday).await;
        run_checkpoint(&state, Checkpoint::Evening).await;
        assert_eq!(sent_count(&state.counter_path, &date), 3);
        assert_eq!(state.notifier.drain().await.len(), 3);

        // A fourth evaluation on the same date is suppressed by the cap.
        run_checkpoint(&state, Checkpoint::Morning).await;
        assert_eq!(sent_count(&state.counter_path, &date), 3);
        assert!(state.notifier.drain().await.is_empty());

        let _ = std::fs::remove_file(&state.counter_path);
        let _ = std::fs::remove_file(&state.data_path);
    }

    #[tokio::test]
    async fn satisfied_checkpoint_does_not_consume_the_cap() {
        let mut data = AppData::default();
        data.days.insert(
            today_key(),
            DailyRecord {
                sleep_start_time: Some(23),
                work_start_time: Some(9),
                motivation_level: Some(4),
                ..Default::default()
            },
        );
        let state = test_state(data);
        state.notifier.set_permission(Permission::Granted).await;

        run_checkpoint(&state, Checkpoint::Morning).await;
        assert_eq!(sent_count(&state.counter_path, &today_key()), 0);
        assert!(state.notifier.drain().await.is_empty());

        let _ = std::fs::remove_file(&state.counter_path);
    }

    #[test]
    fn default_snapshot_keeps_cadence_quiet() {
        assert!(cadence_reminders(&CadenceSnapshot::default()).is_empty());
    }

    #[test]
    fn cadence_fires_one_notification_per_satisfied_heuristic() {
        let snapshot = CadenceSnapshot {
            sleep_hours_last_night: Some(5.0),
            workouts_this_week: 4,
            hours_worked_today: Some(7.0),
            continuous_work_hours: Some(3.5),
            missed_workout_yesterday: true,
            monthly_earnings: 900.0,
            selected_goal: Some(1000.0),
        };
        assert_eq!(cadence_reminders(&snapshot).len(), 6);
    }

    #[tokio::test]
    async fn snapshot_reads_goal_and_monthly_earnings() {
        let today = Local::now();
        let month = month_key(today.date_naive());
        let mut data = AppData::default();
        data.days.insert(
            today_key(),
            DailyRecord {
                earnings: Some(120.0),
                did_workout: Some(true),
                ..Default::default()
            },
        );
        data.goals.insert(
            goal_path("local-user", &month),
            GoalDocument {
                amount: 1500.0,
                updated_at: "2026-01-01T00:00:00Z".to_string(),
            },
        );
        let state = test_state(data);

        let snapshot = cadence_snapshot(&state, today).await;
        assert_eq!(snapshot.monthly_earnings, 120.0);
        assert_eq!(snapshot.selected_goal, Some(1500.0));
        assert_eq!(snapshot.workouts_this_week, 1);
        assert!(!snapshot.missed_workout_yesterday);
    }
}
