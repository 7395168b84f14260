use crate::models::AppData;
use crate::notify::Notifier;
use std::{env, path::PathBuf, sync::Arc};
use tokio::sync::Mutex;

/// Identity of the signed-in user. Sign-in itself is delegated to an
/// external provider; the server only needs a stable id and a name.
#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub user_id: String,
    pub name: String,
}

impl SessionInfo {
    pub fn from_env() -> Self {
        Self {
            user_id: env::var("APP_USER_ID").unwrap_or_else(|_| "local-user".to_string()),
            name: env::var("APP_USER_NAME").unwrap_or_else(|_| "Freelancer".to_string()),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub data_path: PathBuf,
    pub counter_path: PathBuf,
    pub data: Arc<Mutex<AppData>>,
    pub notifier: Arc<Notifier>,
    pub session: SessionInfo,
}

impl AppState {
    pub fn new(
        data_path: PathBuf,
        counter_path: PathBuf,
        data: AppData,
        session: SessionInfo,
    ) -> Self {
        Self {
            data_path,
            counter_path,
            data: Arc::new(Mutex::new(data)),
            notifier: Arc::new(Notifier::new()),
            session,
        }
    }
}
