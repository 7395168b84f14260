use crate::models::{
    AppData, DaySummary, GoalDocument, LegacyDayRecord, LegacyProfileDocument, LegacyUserDocument,
    MonthlyRecordDocument, ProfileDocument, StatsDocument, day_of_month_key, goal_path, month_key,
    record_path, stats_path,
};
use crate::state::AppState;
use crate::storage::persist_data;
use chrono::{Datelike, Local, NaiveDate};
use std::collections::BTreeMap;
use tracing::{error, info};

const RECORD_KEY_PREFIX: &str = "records.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrateError(pub String);

impl std::fmt::Display for MigrateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for MigrateError {}

/// Staged output of one profile's transform. Applied to the store as a
/// unit: nothing is written until the whole batch built cleanly.
#[derive(Debug, Clone, PartialEq)]
pub struct MigrationBatch {
    pub profile: ProfileDocument,
    /// `YYYY-MM` -> migrated month.
    pub monthly_records: BTreeMap<String, MonthlyRecordDocument>,
    pub goals: BTreeMap<String, GoalDocument>,
    pub stats: BTreeMap<String, StatsDocument>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    Migrated { months: usize, goals: usize },
    Skipped,
}

/// Pure transform from one user's legacy documents to the normalized
/// month-grouped schema. Totals are recomputed from scratch on every
/// run, so repeated runs over the same source converge to identical
/// output (idempotent overwrite, never additive).
///
/// `now` stamps the goal documents; `year` anchors the zero-based month
/// indexes of the legacy monthly aggregates.
pub fn build_migration(
    profile_id: &str,
    profile: &LegacyProfileDocument,
    user: &LegacyUserDocument,
    now: &str,
    year: i32,
) -> Result<MigrationBatch, MigrateError> {
    let mut monthly_records: BTreeMap<String, MonthlyRecordDocument> = BTreeMap::new();

    for (key, value) in &user.fields {
        let Some(date_part) = key.strip_prefix(RECORD_KEY_PREFIX) else {
            continue;
        };
        let date = NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
            .map_err(|err| MigrateError(format!("bad record key {key:?}: {err}")))?;
        let day: LegacyDayRecord = serde_json::from_value(value.clone())
            .map_err(|err| MigrateError(format!("bad record body under {key:?}: {err}")))?;

        let month = monthly_records.entry(month_key(date)).or_default();
        month.total_earnings += day.earnings;
        month.projects_completed += day.projects_count;
        month.days.insert(
            day_of_month_key(date),
            DaySummary {
                earnings: day.earnings,
                projects_count: day.projects_count,
            },
        );
    }

    for month in monthly_records.values_mut() {
        // A month entry only exists once a day landed in it, so the
        // divisor is always at least one.
        month.average_daily_earnings = month.total_earnings / month.days.len() as f64;
    }

    let goals = profile
        .monthly_goals
        .iter()
        .map(|(month, amount)| {
            (
                month.clone(),
                GoalDocument {
                    amount: *amount,
                    updated_at: now.to_string(),
                },
            )
        })
        .collect();

    let mut stats = BTreeMap::new();
    for (index, aggregate) in &profile.aggregates.monthly {
        let month_index: u32 = index
            .parse()
            .map_err(|err| MigrateError(format!("bad monthly aggregate key {index:?}: {err}")))?;
        if month_index > 11 {
            return Err(MigrateError(format!(
                "monthly aggregate key {month_index} out of range"
            )));
        }
        stats.insert(
            format!("{year}-{:02}", month_index + 1),
            StatsDocument {
                monthly_earnings: aggregate.earnings,
                monthly_average: aggregate.average,
                weekly_breakdown: aggregate.weekly.clone(),
            },
        );
    }

    Ok(MigrationBatch {
        profile: ProfileDocument {
            name: profile.name.clone(),
            user_id: profile_id.to_string(),
            tagline: profile.tagline.clone(),
            default_goal: profile.default_goal,
            created_at: profile.created_at.clone(),
        },
        monthly_records,
        goals,
        stats,
    })
}

/// Writes a fully built batch into the store. The lock is held across
/// the whole application, so readers never observe a half-applied batch.
pub fn apply_batch(data: &mut AppData, profile_id: &str, batch: MigrationBatch) {
    data.profiles.insert(profile_id.to_string(), batch.profile);
    for (month, doc) in batch.monthly_records {
        data.monthly_records.insert(record_path(profile_id, &month), doc);
    }
    for (month, doc) in batch.goals {
        data.goals.insert(goal_path(profile_id, &month), doc);
    }
    for (month, doc) in batch.stats {
        data.stats.insert(stats_path(profile_id, &month), doc);
    }
}

/// Migrates a single profile. A missing legacy profile document is a
/// skip, not an error; everything else surfaces as `MigrateError`.
pub async fn migrate_user(state: &AppState, profile_id: &str) -> Result<Outcome, MigrateError> {
    let mut data = state.data.lock().await;

    let Some(profile) = data.legacy_profiles.get(profile_id).cloned() else {
        return Ok(Outcome::Skipped);
    };
    let user = data
        .legacy_users
        .get(profile_id)
        .cloned()
        .unwrap_or_default();

    let now = Local::now().to_rfc3339();
    let batch = build_migration(profile_id, &profile, &user, &now, Local::now().year())?;
    let months = batch.monthly_records.len();
    let goals = batch.goals.len();

    apply_batch(&mut data, profile_id, batch);
    persist_data(&state.data_path, &data)
        .await
        .map_err(|err| MigrateError(err.message))?;

    Ok(Outcome::Migrated { months, goals })
}

/// Runs the migration over every legacy profile, strictly sequentially,
/// and returns one human-readable line per profile. Failures are logged
/// and do not stop the loop.
pub async fn run_migration(state: &AppState) -> Vec<String> {
    let ids: Vec<String> = {
        let data = state.data.lock().await;
        let mut ids: Vec<String> = data
            .legacy_users
            .keys()
            .chain(data.legacy_profiles.keys())
            .cloned()
            .collect();
        ids.sort();
        ids.dedup();
        ids
    };

    let mut lines = Vec::with_capacity(ids.len());
    for id in ids {
        match migrate_user(state, &id).await {
            Ok(Outcome::Migrated { months, goals }) => {
                info!("migrated {id}: {months} month(s), {goals} goal(s)");
                lines.push(format!("migrated {id}: {months} month(s), {goals} goal(s)"));
            }
            Ok(Outcome::Skipped) => {
                info!("skipped {id}: no profile document");
                lines.push(format!("skipped {id}: no profile document"));
            }
            Err(err) => {
                error!("migration failed for {id}: {err}");
                lines.push(format!("failed {id}: {err}"));
            }
        }
    }

    if lines.is_empty() {
        lines.push("no legacy profiles found".to_string());
    }
    lines
}
