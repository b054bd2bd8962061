//! HTTP endpoint behavior against an in-memory router

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tokio::time;
use tower::ServiceExt;

use homepanel::api::create_router;
use homepanel::config::{load_panel_config, PanelConfig};
use homepanel::services::{AlarmLoop, CommandBus, CuePlayer};
use homepanel::state::{AppState, TimerKey, TimerPhase};
use homepanel::widgets::PressEvent;

struct NoopCuePlayer;

impl CuePlayer for NoopCuePlayer {
    fn play(&self, _key: &TimerKey, _sound: &str) {}

    fn silence(&self, _key: &TimerKey) {}
}

#[derive(Default)]
struct RecordingBus {
    calls: Mutex<Vec<(String, String, String)>>,
}

impl RecordingBus {
    fn calls(&self) -> Vec<(String, String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

impl CommandBus for RecordingBus {
    fn call_service(&self, domain: &str, service: &str, entity_id: &str) {
        self.calls.lock().unwrap().push((
            domain.to_string(),
            service.to_string(),
            entity_id.to_string(),
        ));
    }
}

fn build_state(panel: &str, bus: Arc<dyn CommandBus>) -> Arc<AppState> {
    let alarm = Arc::new(AlarmLoop::new(Arc::new(NoopCuePlayer) as Arc<dyn CuePlayer>));
    let state = Arc::new(AppState::new(
        8090,
        "127.0.0.1".to_string(),
        PathBuf::from("panel.json"),
        bus,
        alarm,
    ));
    let panel: PanelConfig = serde_json::from_str(panel).unwrap();
    state.install_panel(&panel).unwrap();
    state
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn settle() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}

async fn advance_secs(seconds: u64) {
    for _ in 0..seconds {
        time::advance(Duration::from_secs(1)).await;
        settle().await;
    }
}

#[tokio::test]
async fn health_endpoint_reports_ok() {
    let state = build_state(r#"{"widgets": []}"#, Arc::new(RecordingBus::default()));
    let app = create_router(state);

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let health = body_json(response).await;
    assert_eq!(health["status"], "ok");
    assert_eq!(health["version"], "0.4.0");
}

#[tokio::test]
async fn widgets_lists_snapshots_in_panel_order() {
    let state = build_state(
        r#"{"widgets": [
            {"type": "timer", "title": "Tea", "duration": 180},
            {"type": "cover", "title": "Kitchen", "entity": "cover.kitchen"},
            {"type": "clock"}
        ]}"#,
        Arc::new(RecordingBus::default()),
    );
    let app = create_router(state);

    let response = app.oneshot(get("/widgets")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let widgets = body_json(response).await;
    let widgets = widgets.as_array().unwrap();
    assert_eq!(widgets.len(), 3);

    assert_eq!(widgets[0]["type"], "timer");
    assert_eq!(widgets[0]["phase"], "idle");
    assert_eq!(widgets[0]["seconds"], 180);
    assert_eq!(widgets[0]["label"], "03:00");
    assert_eq!(widgets[0]["duration_seconds"], 180);

    assert_eq!(widgets[1]["type"], "cover");
    assert_eq!(widgets[1]["entity"], "cover.kitchen");

    assert_eq!(widgets[2]["type"], "clock");
    let time = widgets[2]["time"].as_str().unwrap();
    assert_eq!(time.len(), 8, "clock time should be HH:MM:SS, got {}", time);
}

#[tokio::test]
async fn press_and_release_start_a_timer() {
    let state = build_state(
        r#"{"widgets": [{"type": "timer", "title": "Tea", "duration": 180}]}"#,
        Arc::new(RecordingBus::default()),
    );
    let app = create_router(state);

    let response = app
        .clone()
        .oneshot(post_json("/widgets/0/input", json!({"event": "press"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let accepted = body_json(response).await;
    assert_eq!(accepted["status"], "accepted");

    let response = app
        .clone()
        .oneshot(post_json("/widgets/0/input", json!({"event": "release"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let released = body_json(response).await;
    assert_eq!(released["status"], "accepted");
    assert_eq!(released["widget"]["phase"], "running");
    assert_eq!(released["widget"]["label"], "03:00");

    let response = app.oneshot(get("/widgets/0")).await.unwrap();
    let snapshot = body_json(response).await;
    assert_eq!(snapshot["phase"], "running");
}

#[tokio::test]
async fn unknown_widget_index_is_not_found() {
    let state = build_state(r#"{"widgets": [{"type": "clock"}]}"#, Arc::new(RecordingBus::default()));
    let app = create_router(state);

    let response = app.clone().oneshot(get("/widgets/9")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .oneshot(post_json("/widgets/9/input", json!({"event": "press"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn cover_input_without_a_control_is_bad_request() {
    let state = build_state(
        r#"{"widgets": [{"type": "cover", "entity": "cover.patio"}]}"#,
        Arc::new(RecordingBus::default()),
    );
    let app = create_router(state);

    let response = app
        .oneshot(post_json("/widgets/0/input", json!({"event": "press"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn clock_input_is_ignored() {
    let state = build_state(r#"{"widgets": [{"type": "clock"}]}"#, Arc::new(RecordingBus::default()));
    let app = create_router(state);

    let response = app
        .oneshot(post_json("/widgets/0/input", json!({"event": "press"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ignored");
}

#[tokio::test(start_paused = true)]
async fn cover_hold_travels_and_tap_stops() {
    let bus = Arc::new(RecordingBus::default());
    let state = build_state(
        r#"{"widgets": [{"type": "cover", "entity": "cover.patio"}]}"#,
        Arc::clone(&bus) as Arc<dyn CommandBus>,
    );
    let app = create_router(state);

    // Hold the up control past the threshold
    app.clone()
        .oneshot(post_json(
            "/widgets/0/input",
            json!({"event": "press", "control": "up"}),
        ))
        .await
        .unwrap();
    time::advance(Duration::from_millis(450)).await;
    app.clone()
        .oneshot(post_json(
            "/widgets/0/input",
            json!({"event": "release", "control": "up"}),
        ))
        .await
        .unwrap();

    assert_eq!(
        bus.calls(),
        vec![(
            "cover".to_string(),
            "open_cover".to_string(),
            "cover.patio".to_string()
        )]
    );

    // A quick tap on the same control stops travel
    app.clone()
        .oneshot(post_json(
            "/widgets/0/input",
            json!({"event": "press", "control": "up"}),
        ))
        .await
        .unwrap();
    time::advance(Duration::from_millis(80)).await;
    app.clone()
        .oneshot(post_json(
            "/widgets/0/input",
            json!({"event": "release", "control": "up"}),
        ))
        .await
        .unwrap();

    assert_eq!(bus.calls().last().unwrap().1, "stop_cover");

    // Holding the down control closes
    app.clone()
        .oneshot(post_json(
            "/widgets/0/input",
            json!({"event": "press", "control": "down"}),
        ))
        .await
        .unwrap();
    time::advance(Duration::from_millis(500)).await;
    app.clone()
        .oneshot(post_json(
            "/widgets/0/input",
            json!({"event": "release", "control": "down"}),
        ))
        .await
        .unwrap();

    assert_eq!(bus.calls().last().unwrap().1, "close_cover");
    assert_eq!(bus.calls().len(), 3);
}

#[tokio::test]
async fn reload_remounts_widgets_and_preserves_timer_state() {
    let dir = tempfile::tempdir().unwrap();
    let panel_path = dir.path().join("panel.json");
    std::fs::write(
        &panel_path,
        r#"{"widgets": [{"type": "timer", "title": "Tea", "duration": 300}]}"#,
    )
    .unwrap();

    let alarm = Arc::new(AlarmLoop::new(Arc::new(NoopCuePlayer) as Arc<dyn CuePlayer>));
    let state = Arc::new(AppState::new(
        8090,
        "127.0.0.1".to_string(),
        panel_path.clone(),
        Arc::new(RecordingBus::default()),
        alarm,
    ));
    let panel = load_panel_config(&panel_path).unwrap();
    state.install_panel(&panel).unwrap();
    let app = create_router(Arc::clone(&state));

    // Start the timer, then grow the panel and reload
    app.clone()
        .oneshot(post_json("/widgets/0/input", json!({"event": "press"})))
        .await
        .unwrap();
    app.clone()
        .oneshot(post_json("/widgets/0/input", json!({"event": "release"})))
        .await
        .unwrap();

    std::fs::write(
        &panel_path,
        r#"{"widgets": [
            {"type": "timer", "title": "Tea", "duration": 300},
            {"type": "clock"}
        ]}"#,
    )
    .unwrap();

    let response = app.clone().oneshot(post("/reload")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let reloaded = body_json(response).await;
    assert_eq!(reloaded["status"], "ok");

    let response = app.oneshot(get("/widgets")).await.unwrap();
    let widgets = body_json(response).await;
    let widgets = widgets.as_array().unwrap();
    assert_eq!(widgets.len(), 2);
    // The remounted timer found its old record still running
    assert_eq!(widgets[0]["phase"], "running");
}

#[tokio::test(start_paused = true)]
async fn reload_mid_run_keeps_the_countdown_committing() {
    let dir = tempfile::tempdir().unwrap();
    let panel_path = dir.path().join("panel.json");
    std::fs::write(
        &panel_path,
        r#"{"widgets": [{"type": "timer", "title": "Tea", "duration": 3}]}"#,
    )
    .unwrap();

    let alarm = Arc::new(AlarmLoop::new(Arc::new(NoopCuePlayer) as Arc<dyn CuePlayer>));
    let state = Arc::new(AppState::new(
        8090,
        "127.0.0.1".to_string(),
        panel_path.clone(),
        Arc::new(RecordingBus::default()),
        alarm,
    ));
    let panel = load_panel_config(&panel_path).unwrap();
    state.install_panel(&panel).unwrap();

    // Short press to start, then let one second of the run pass
    state.dispatch_input(0, PressEvent::Press, None).unwrap();
    settle().await;
    time::advance(Duration::from_millis(50)).await;
    settle().await;
    state.dispatch_input(0, PressEvent::Release, None).unwrap();
    settle().await;
    advance_secs(1).await;

    let record = state
        .registry
        .get_or_create(&TimerKey::derived(Some("Tea"), 3), 3)
        .unwrap();
    assert_eq!(record.lock().unwrap().phase, TimerPhase::Running);

    // Remount the same layout mid-run; the record survives and the
    // rebuilt widget picks the display loop back up
    state.reload().unwrap();
    settle().await;

    let mut rx = state.display_tx.subscribe();
    advance_secs(3).await;
    assert!(rx.try_recv().is_ok(), "no display events after the reload");
    assert_eq!(record.lock().unwrap().phase, TimerPhase::Overtime);

    // Short press reads the committed phase and resets the timer
    state.dispatch_input(0, PressEvent::Press, None).unwrap();
    settle().await;
    time::advance(Duration::from_millis(50)).await;
    settle().await;
    state.dispatch_input(0, PressEvent::Release, None).unwrap();
    settle().await;

    let snapshot = serde_json::to_value(state.snapshot_widget(0).unwrap().unwrap()).unwrap();
    assert_eq!(snapshot["phase"], "idle");
    assert_eq!(snapshot["seconds"], 3);
    assert_eq!(snapshot["label"], "00:03");
}

#[tokio::test]
async fn reload_with_an_invalid_layout_leaves_the_panel_alone() {
    let dir = tempfile::tempdir().unwrap();
    let panel_path = dir.path().join("panel.json");
    std::fs::write(&panel_path, r#"{"widgets": [{"type": "clock"}]}"#).unwrap();

    let alarm = Arc::new(AlarmLoop::new(Arc::new(NoopCuePlayer) as Arc<dyn CuePlayer>));
    let state = Arc::new(AppState::new(
        8090,
        "127.0.0.1".to_string(),
        panel_path.clone(),
        Arc::new(RecordingBus::default()),
        alarm,
    ));
    let panel = load_panel_config(&panel_path).unwrap();
    state.install_panel(&panel).unwrap();
    let app = create_router(Arc::clone(&state));

    std::fs::write(&panel_path, r#"{"widgets": [{"type": "timer", "duration": 0}]}"#).unwrap();

    let response = app.clone().oneshot(post("/reload")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = app.oneshot(get("/widgets")).await.unwrap();
    let widgets = body_json(response).await;
    assert_eq!(widgets.as_array().unwrap().len(), 1);
    assert_eq!(widgets[0]["type"], "clock");
}

#[tokio::test]
async fn status_reports_panel_counts_and_last_action() {
    let state = build_state(
        r#"{"widgets": [{"type": "timer", "title": "Tea", "duration": 60}, {"type": "clock"}]}"#,
        Arc::new(RecordingBus::default()),
    );
    let app = create_router(state);

    let response = app.clone().oneshot(get("/status")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let status = body_json(response).await;
    assert_eq!(status["widgets"], 2);
    assert_eq!(status["timers"], 1);
    assert_eq!(status["active_alarms"], 0);
    assert_eq!(status["port"], 8090);
    assert!(status["last_action"].is_null());

    app.clone()
        .oneshot(post_json("/widgets/0/input", json!({"event": "press"})))
        .await
        .unwrap();
    app.clone()
        .oneshot(post_json("/widgets/0/input", json!({"event": "cancel"})))
        .await
        .unwrap();

    let response = app.oneshot(get("/status")).await.unwrap();
    let status = body_json(response).await;
    assert_eq!(status["last_action"], "input widget 0");
    assert!(!status["uptime"].as_str().unwrap().is_empty());
}
