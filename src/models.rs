use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One day of logged activity, keyed by ISO date. Every field starts
/// absent and is filled in one at a time as the user logs their day.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct DailyRecord {
    pub sleep_start_time: Option<u32>,
    pub sleep_end_time: Option<u32>,
    pub work_start_time: Option<u32>,
    pub work_end_time: Option<u32>,
    pub motivation_level: Option<u8>,
    pub anxiety_level: Option<u8>,
    pub did_workout: Option<bool>,
    pub did_walk: Option<bool>,
    pub earnings: Option<f64>,
    pub projects_count: Option<u8>,
    pub hours_worked: Option<f64>,
    pub work_break: WorkBreak,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct WorkBreak {
    pub is_active: bool,
    /// Epoch seconds of the running break, if one is active.
    pub start_time: Option<i64>,
    /// Accumulated break seconds for the day.
    pub total: u64,
}

impl DailyRecord {
    /// Recomputes `hours_worked` from the work span and accumulated break
    /// time. Leaves the field untouched until both endpoints are logged.
    pub fn refresh_hours_worked(&mut self) {
        if let (Some(start), Some(end)) = (self.work_start_time, self.work_end_time) {
            self.hours_worked = Some(adjusted_hours(start, end, self.work_break.total));
        }
    }
}

/// Span between two hour-of-day marks, wrapping past midnight when the
/// end does not come after the start.
pub fn calculate_hours(start: u32, end: u32) -> u32 {
    if end <= start {
        24 - start + end
    } else {
        end - start
    }
}

/// Work span minus break time, clamped so it never goes negative.
pub fn adjusted_hours(start: u32, end: u32, break_seconds: u64) -> f64 {
    let raw = f64::from(calculate_hours(start, end));
    (raw - break_seconds as f64 / 3600.0).max(0.0)
}

pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn month_key(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

pub fn today_key() -> String {
    date_key(Local::now().date_naive())
}

pub fn record_path(profile_id: &str, month: &str) -> String {
    format!("{profile_id}/records/{month}")
}

pub fn goal_path(profile_id: &str, month: &str) -> String {
    format!("{profile_id}/goals/{month}")
}

pub fn stats_path(profile_id: &str, month: &str) -> String {
    format!("{profile_id}/stats/{month}")
}

/// Pre-migration profile document: goals and aggregates lived directly on
/// the profile instead of their own documents.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct LegacyProfileDocument {
    pub name: String,
    pub tagline: String,
    pub default_goal: f64,
    pub created_at: String,
    /// `YYYY-MM` -> goal amount.
    pub monthly_goals: BTreeMap<String, f64>,
    pub aggregates: LegacyAggregates,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct LegacyAggregates {
    pub weekly: BTreeMap<String, f64>,
    /// Keyed by a zero-based month-of-year index rendered as a string.
    pub monthly: BTreeMap<String, LegacyMonthlyAggregate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct LegacyMonthlyAggregate {
    pub earnings: f64,
    pub average: f64,
    pub weekly: BTreeMap<String, f64>,
}

/// Pre-migration user document: a flat field map where per-day entries
/// hide behind `records.<ISO-date>` keys.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct LegacyUserDocument {
    #[serde(flatten)]
    pub fields: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct LegacyDayRecord {
    pub earnings: f64,
    pub projects_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProfileDocument {
    pub name: String,
    pub user_id: String,
    pub tagline: String,
    pub default_goal: f64,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct DaySummary {
    pub earnings: f64,
    pub projects_count: u32,
}

/// One month of migrated records, keyed `{profile}/records/{YYYY-MM}`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct MonthlyRecordDocument {
    /// Day-of-month (as a string) -> that day's summary.
    pub days: BTreeMap<String, DaySummary>,
    pub total_earnings: f64,
    pub projects_completed: u32,
    pub average_daily_earnings: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GoalDocument {
    pub amount: f64,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct StatsDocument {
    pub monthly_earnings: f64,
    pub monthly_average: f64,
    pub weekly_breakdown: BTreeMap<String, f64>,
}

/// Everything the app persists in its document file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppData {
    /// The signed-in user's daily log, keyed by ISO date.
    pub days: BTreeMap<String, DailyRecord>,
    pub legacy_profiles: BTreeMap<String, LegacyProfileDocument>,
    pub legacy_users: BTreeMap<String, LegacyUserDocument>,
    pub profiles: BTreeMap<String, ProfileDocument>,
    pub monthly_records: BTreeMap<String, MonthlyRecordDocument>,
    pub goals: BTreeMap<String, GoalDocument>,
    pub stats: BTreeMap<String, StatsDocument>,
}

#[derive(Debug, Deserialize)]
pub struct DayQuery {
    pub date: Option<String>,
}

/// Partial update for one day's record. Absent fields are left alone;
/// the record is created on the first edit for that date.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct DayPatch {
    pub date: Option<String>,
    pub sleep_start_time: Option<u32>,
    pub sleep_end_time: Option<u32>,
    pub work_start_time: Option<u32>,
    pub work_end_time: Option<u32>,
    pub motivation_level: Option<u8>,
    pub anxiety_level: Option<u8>,
    pub did_workout: Option<bool>,
    pub did_walk: Option<bool>,
    pub earnings: Option<f64>,
    pub projects_count: Option<u8>,
}

#[derive(Debug, Deserialize)]
pub struct BreakRequest {
    pub action: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DayResponse {
    pub date: String,
    pub record: DailyRecord,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user_id: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct PermissionRequest {
    pub decision: String,
}

#[derive(Debug, Serialize)]
pub struct MigrateResponse {
    pub lines: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct DailyEarningsPoint {
    pub date: String,
    pub earnings: f64,
    pub hours_worked: f64,
}

#[derive(Debug, Serialize)]
pub struct WeeklyEarningsPoint {
    pub week: String,
    pub start_date: String,
    pub end_date: String,
    pub earnings: f64,
    pub projects_completed: u32,
}

#[derive(Debug, Serialize)]
pub struct HeatmapCell {
    pub date: String,
    pub earnings: f64,
    pub level: u8,
}

#[derive(Debug, Serialize)]
pub struct MonthSummary {
    pub month: String,
    pub total_earnings: f64,
    pub average_daily_earnings: f64,
    pub projects_completed: u32,
    pub goal_amount: Option<f64>,
    pub goal_progress: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub last_7_days: Vec<DailyEarningsPoint>,
    pub weekly_totals: Vec<WeeklyEarningsPoint>,
    pub heatmap: Vec<HeatmapCell>,
    pub month_summary: MonthSummary,
}

pub fn day_of_month_key(date: NaiveDate) -> String {
    date.day().to_string()
}
