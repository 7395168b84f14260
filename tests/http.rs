use once_cell::sync::Lazy;
use reqwest::Client;
use serde::Deserialize;
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

#[derive(Debug, Deserialize)]
struct DailyRecord {
    work_start_time: Option<u32>,
    work_end_time: Option<u32>,
    motivation_level: Option<u8>,
    earnings: Option<f64>,
    hours_worked: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct DayResponse {
    date: String,
    record: DailyRecord,
}

#[derive(Debug, Deserialize)]
struct DashboardStats {
    last_7_days: Vec<serde_json::Value>,
    weekly_totals: Vec<serde_json::Value>,
    heatmap: Vec<serde_json::Value>,
    month_summary: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct MigrateResponse {
    lines: Vec<String>,
}

struct TestServer {
    base_url: String,
    child: Child,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

static TEST_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));
static SERVER: Lazy<Mutex<Option<Arc<TestServer>>>> = Lazy::new(|| Mutex::new(None));

#[cfg(unix)]
mod cleanup {
    use std::sync::Once;
    use std::sync::atomic::{AtomicI32, Ordering};

    static REGISTER: Once = Once::new();
    static PID: AtomicI32 = AtomicI32::new(0);

    pub fn register(pid: u32) {
        REGISTER.call_once(|| {
            PID.store(pid as i32, Ordering::SeqCst);
            unsafe {
                libc::atexit(on_exit);
            }
        });
    }

    extern "C" fn on_exit() {
        let pid = PID.load(Ordering::SeqCst);
        if pid > 0 {
            unsafe {
                libc::kill(pid, libc::SIGTERM);
            }
        }
    }
}

fn pick_free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

fn unique_data_path(tag: &str) -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!(
        "freelance_tracker_http_{tag}_{}_{nanos}.json",
        std::process::id()
    ));
    path.to_string_lossy().to_string()
}

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(3);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/api/day")).send().await {
            if resp.status().is_success() {
                return;
            }
        }
        if Instant::now() > deadline {
            panic!("server did not become ready");
        }
        sleep(Duration::from_millis(100)).await;
    }
}

async fn spawn_server() -> TestServer {
    let port = pick_free_port();
    let child = Command::new(env!("CARGO_BIN_EXE_freelance_tracker"))
        .env("PORT", port.to_string())
        .env("APP_DATA_PATH", unique_data_path("data"))
        .env("REMINDER_COUNTS_PATH", unique_data_path("counts"))
        .env("RUST_LOG", "info")
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .expect("failed to spawn server");

    #[cfg(unix)]
    cleanup::register(child.id());

    let base_url = format!("http://127.0.0.1:{port}");
    wait_until_ready(&base_url).await;

    TestServer { base_url, child }
}

async fn shared_server() -> Arc<TestServer> {
    let mut guard = SERVER.lock().await;
    if let Some(server) = guard.as_ref() {
        return Arc::clone(server);
    }
    let server = Arc::new(spawn_server().await);
    *guard = Some(Arc::clone(&server));
    server
}

#[tokio::test]
async fn http_patch_day_round_trip() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let response = client
        .post(format!("{}/api/day", server.base_url))
        .json(&serde_json::json!({
            "date": "2026-02-03",
            "work_start_time": 9,
            "work_end_time": 17,
            "earnings": 120.5
        }))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    let saved: DayResponse = response.json().await.unwrap();
    assert_eq!(saved.date, "2026-02-03");
    assert_eq!(saved.record.hours_worked, Some(8.0));

    let fetched: DayResponse = client
        .get(format!("{}/api/day?date=2026-02-03", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched.record.earnings, Some(120.5));
    assert_eq!(fetched.record.work_start_time, Some(9));
    assert_eq!(fetched.record.work_end_time, Some(17));
}

#[tokio::test]
async fn http_second_patch_keeps_earlier_fields() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let response = client
        .post(format!("{}/api/day", server.base_url))
        .json(&serde_json::json!({ "date": "2026-02-04", "earnings": 80.0 }))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let response = client
        .post(format!("{}/api/day", server.base_url))
        .json(&serde_json::json!({ "date": "2026-02-04", "motivation_level": 4 }))
        .send()
        .await
        .unwrap();
    let saved: DayResponse = response.json().await.unwrap();
    assert_eq!(saved.record.earnings, Some(80.0));
    assert_eq!(saved.record.motivation_level, Some(4));
}

#[tokio::test]
async fn http_invalid_patch_is_rejected() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let response = client
        .post(format!("{}/api/day", server.base_url))
        .json(&serde_json::json!({ "motivation_level": 9 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    let response = client
        .post(format!("{}/api/day", server.base_url))
        .json(&serde_json::json!({ "earnings": -5.0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn http_stats_shape() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let stats: DashboardStats = client
        .get(format!("{}/api/stats", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(stats.last_7_days.len(), 7);
    assert_eq!(stats.weekly_totals.len(), 8);
    assert!(!stats.heatmap.is_empty());
    assert!(stats.month_summary.get("month").is_some());
}

#[tokio::test]
async fn http_permission_and_notifications() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let response = client
        .post(format!("{}/api/notifications/permission", server.base_url))
        .json(&serde_json::json!({ "decision": "granted" }))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["permission"], "granted");

    let response = client
        .post(format!("{}/api/notifications/permission", server.base_url))
        .json(&serde_json::json!({ "decision": "sometimes" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    let body: serde_json::Value = client
        .get(format!("{}/api/notifications", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(body["notifications"].as_array().is_some());
}

#[tokio::test]
async fn http_migrate_reports_empty_store() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let response = client
        .post(format!("{}/api/migrate", server.base_url))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    let body: MigrateResponse = response.json().await.unwrap();
    assert_eq!(body.lines, vec!["no legacy profiles found".to_string()]);
}

#[tokio::test]
async fn http_break_start_and_stop() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let response = client
        .post(format!("{}/api/break", server.base_url))
        .json(&serde_json::json!({ "action": "start" }))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    // Starting twice is rejected.
    let response = client
        .post(format!("{}/api/break", server.base_url))
        .json(&serde_json::json!({ "action": "start" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 409);

    let response = client
        .post(format!("{}/api/break", server.base_url))
        .json(&serde_json::json!({ "action": "stop" }))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    let day: DayResponse = response.json().await.unwrap();
    assert!(!day.date.is_empty());
}
