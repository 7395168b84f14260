use crate::models::{
    DailyEarningsPoint, DailyRecord, DashboardStats, HeatmapCell, MonthSummary,
    WeeklyEarningsPoint, date_key, month_key,
};
use chrono::{Datelike, Duration, Local, NaiveDate};
use std::collections::BTreeMap;

const WEEK_COUNT: usize = 8;
const HEATMAP_WEEKS: i64 = 12;

pub fn build_stats(
    days: &BTreeMap<String, DailyRecord>,
    goal_amount: Option<f64>,
) -> DashboardStats {
    build_stats_at(Local::now().date_naive(), days, goal_amount)
}

pub fn build_stats_at(
    today: NaiveDate,
    days: &BTreeMap<String, DailyRecord>,
    goal_amount: Option<f64>,
) -> DashboardStats {
    let mut last_7_days = Vec::with_capacity(7);
    for offset in (0..7).rev() {
        let date = today - Duration::days(offset);
        let record = days.get(&date_key(date)).cloned().unwrap_or_default();
        last_7_days.push(DailyEarningsPoint {
            date: date.to_string(),
            earnings: record.earnings.unwrap_or(0.0),
            hours_worked: record.hours_worked.unwrap_or(0.0),
        });
    }

    let current_week_start = week_start(today);
    let mut weekly_totals = Vec::with_capacity(WEEK_COUNT);
    for offset in (0..WEEK_COUNT).rev() {
        let start = current_week_start - Duration::weeks(offset as i64);
        let end = start + Duration::days(6);

        let mut earnings = 0.0;
        let mut projects: u32 = 0;
        for day_offset in 0..7 {
            let record = days
                .get(&date_key(start + Duration::days(day_offset)))
                .cloned()
                .unwrap_or_default();
            earnings += record.earnings.unwrap_or(0.0);
            projects += u32::from(record.projects_count.unwrap_or(0));
        }

        weekly_totals.push(WeeklyEarningsPoint {
            week: week_label(start),
            start_date: start.to_string(),
            end_date: end.to_string(),
            earnings,
            projects_completed: projects,
        });
    }

    let heatmap_start = current_week_start - Duration::weeks(HEATMAP_WEEKS - 1);
    let mut heatmap = Vec::new();
    let mut cursor = heatmap_start;
    while cursor <= today {
        let earnings = days
            .get(&date_key(cursor))
            .and_then(|record| record.earnings)
            .unwrap_or(0.0);
        heatmap.push(HeatmapCell {
            date: cursor.to_string(),
            earnings,
            level: heat_level(earnings),
        });
        cursor += Duration::days(1);
    }

    DashboardStats {
        last_7_days,
        weekly_totals,
        heatmap,
        month_summary: month_summary(today, days, goal_amount),
    }
}

fn month_summary(
    today: NaiveDate,
    days: &BTreeMap<String, DailyRecord>,
    goal_amount: Option<f64>,
) -> MonthSummary {
    let month = month_key(today);
    let mut total = 0.0;
    let mut projects: u32 = 0;
    let mut logged_days: u32 = 0;

    for (date, record) in days {
        if !date.starts_with(&month) {
            continue;
        }
        if let Some(earnings) = record.earnings {
            total += earnings;
            logged_days += 1;
        }
        projects += u32::from(record.projects_count.unwrap_or(0));
    }

    let average = if logged_days == 0 {
        0.0
    } else {
        total / f64::from(logged_days)
    };
    let goal_progress = goal_amount
        .filter(|amount| *amount > 0.0)
        .map(|amount| total / amount);

    MonthSummary {
        month,
        total_earnings: total,
        average_daily_earnings: average,
        projects_completed: projects,
        goal_amount,
        goal_progress,
    }
}

fn heat_level(earnings: f64) -> u8 {
    if earnings <= 0.0 {
        0
    } else if earnings < 100.0 {
        1
    } else if earnings < 250.0 {
        2
    } else if earnings < 500.0 {
        3
    } else {
        4
    }
}

fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

fn week_label(date: NaiveDate) -> String {
    let iso = date.iso_week();
    format!("{}-W{:02}", iso.year(), iso.week())
}
