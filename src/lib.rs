pub mod app;
pub mod errors;
pub mod handlers;
pub mod migrate;
pub mod models;
pub mod notify;
pub mod scheduler;
pub mod state;
pub mod stats;
pub mod storage;
pub mod ui;

pub use app::router;
pub use state::{AppState, SessionInfo};
pub use storage::{load_data, resolve_counter_path, resolve_data_path};
