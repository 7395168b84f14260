use crate::errors::AppError;
use crate::migrate::run_migration;
use crate::models::{
    BreakRequest, DailyRecord, DashboardStats, DayPatch, DayQuery, DayResponse, MigrateResponse,
    PermissionRequest, SessionResponse, goal_path, month_key, today_key,
};
use crate::notify::{NotificationsResponse, Permission, PermissionResponse};
use crate::state::AppState;
use crate::stats::build_stats_at;
use crate::storage::persist_data;
use crate::ui::render_dashboard;
use axum::{
    Json,
    extract::{Query, State},
    response::Html,
};
use chrono::{Local, NaiveDate};

pub async fn index(State(state): State<AppState>) -> Html<String> {
    let date = today_key();
    let data = state.data.lock().await;
    let record = data.days.get(&date).cloned().unwrap_or_default();
    Html(render_dashboard(&date, &state.session.name, &record))
}

pub async fn get_session(State(state): State<AppState>) -> Json<SessionResponse> {
    Json(SessionResponse {
        user_id: state.session.user_id.clone(),
        name: state.session.name.clone(),
    })
}

pub async fn get_day(
    State(state): State<AppState>,
    Query(query): Query<DayQuery>,
) -> Result<Json<DayResponse>, AppError> {
    let date = resolve_date(query.date.as_deref())?;
    let data = state.data.lock().await;
    let record = data.days.get(&date).cloned().unwrap_or_default();
    Ok(Json(DayResponse { date, record }))
}

pub async fn patch_day(
    State(state): State<AppState>,
    Json(patch): Json<DayPatch>,
) -> Result<Json<DayResponse>, AppError> {
    validate_patch(&patch)?;
    let date = resolve_date(patch.date.as_deref())?;

    let mut data = state.data.lock().await;
    let updated = {
        let record = data.days.entry(date.clone()).or_default();
        apply_patch(record, &patch);
        record.refresh_hours_worked();
        record.clone()
    };

    persist_data(&state.data_path, &data).await?;

    Ok(Json(DayResponse {
        date,
        record: updated,
    }))
}

pub async fn toggle_break(
    State(state): State<AppState>,
    Json(request): Json<BreakRequest>,
) -> Result<Json<DayResponse>, AppError> {
    let action = request.action.trim();
    if action != "start" && action != "stop" {
        return Err(AppError::bad_request("action must be 'start' or 'stop'"));
    }

    let date = today_key();
    let now = Local::now().timestamp();
    let mut data = state.data.lock().await;
    let updated = {
        let record = data.days.entry(date.clone()).or_default();
        if action == "start" {
            if record.work_break.is_active {
                return Err(AppError::conflict("a break is already running"));
            }
            record.work_break.is_active = true;
            record.work_break.start_time = Some(now);
        } else {
            let Some(started) = record.work_break.start_time else {
                return Err(AppError::conflict("no break is running"));
            };
            record.work_break.total += (now - started).max(0) as u64;
            record.work_break.is_active = false;
            record.work_break.start_time = None;
        }
        record.refresh_hours_worked();
        record.clone()
    };

    persist_data(&state.data_path, &data).await?;

    Ok(Json(DayResponse {
        date,
        record: updated,
    }))
}

pub async fn get_stats(State(state): State<AppState>) -> Result<Json<DashboardStats>, AppError> {
    let today = Local::now().date_naive();
    let data = state.data.lock().await;
    let goal = data
        .goals
        .get(&goal_path(&state.session.user_id, &month_key(today)))
        .map(|goal| goal.amount);
    Ok(Json(build_stats_at(today, &data.days, goal)))
}

pub async fn get_notifications(State(state): State<AppState>) -> Json<NotificationsResponse> {
    Json(NotificationsResponse {
        notifications: state.notifier.drain().await,
    })
}

pub async fn set_permission(
    State(state): State<AppState>,
    Json(request): Json<PermissionRequest>,
) -> Result<Json<PermissionResponse>, AppError> {
    let Some(permission) = Permission::parse(request.decision.trim()) else {
        return Err(AppError::bad_request(
            "decision must be 'granted', 'denied' or 'default'",
        ));
    };
    state.notifier.set_permission(permission).await;
    Ok(Json(PermissionResponse { permission }))
}

pub async fn migrate(State(state): State<AppState>) -> Result<Json<MigrateResponse>, AppError> {
    let lines = run_migration(&state).await;
    Ok(Json(MigrateResponse { lines }))
}

fn resolve_date(raw: Option<&str>) -> Result<String, AppError> {
    match raw {
        None => Ok(today_key()),
        Some(value) => {
            let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .map_err(|_| AppError::bad_request("date must be YYYY-MM-DD"))?;
            Ok(date.to_string())
        }
    }
}

fn apply_patch(record: &mut DailyRecord, patch: &DayPatch) {
    if let Some(value) = patch.sleep_start_time {
        record.sleep_start_time = Some(value);
    }
    if let Some(value) = patch.sleep_end_time {
        record.sleep_end_time = Some(value);
    }
    if let Some(value) = patch.work_start_time {
        record.work_start_time = Some(value);
    }
    if let Some(value) = patch.work_end_time {
        record.work_end_time = Some(value);
    }
    if let Some(value) = patch.motivation_level {
        record.motivation_level = Some(value);
    }
    if let Some(value) = patch.anxiety_level {
        record.anxiety_level = Some(value);
    }
    if let Some(value) = patch.did_workout {
        record.did_workout = Some(value);
    }
    if let Some(value) = patch.did_walk {
        record.did_walk = Some(value);
    }
    if let Some(value) = patch.earnings {
        record.earnings = Some(value);
    }
    if let Some(value) = patch.projects_count {
        record.projects_count = Some(value);
    }
}

fn validate_patch(patch: &DayPatch) -> Result<(), AppError> {
    for (name, value) in [
        ("sleep_start_time", patch.sleep_start_time),
        ("sleep_end_time", patch.sleep_end_time),
        ("work_start_time", patch.work_start_time),
        ("work_end_time", patch.work_end_time),
    ] {
        if let Some(hour) = value {
            if hour > 23 {
                return Err(AppError::bad_request(format!(
                    "{name} must be an hour between 0 and 23"
                )));
            }
        }
    }

    for (name, value) in [
        ("motivation_level", patch.motivation_level),
        ("anxiety_level", patch.anxiety_level),
        ("projects_count", patch.projects_count),
    ] {
        if let Some(level) = value {
            if level > 5 {
                return Err(AppError::bad_request(format!(
                    "{name} must be between 0 and 5"
                )));
            }
        }
    }

    if let Some(earnings) = patch.earnings {
        if !earnings.is_finite() || earnings < 0.0 {
            return Err(AppError::bad_request("earnings must be a non-negative number"));
        }
    }

    Ok(())
}
