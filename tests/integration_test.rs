use anyhow::Result;
use rapid_clicker::config::{parse_duration, Config};
use rapid_clicker::hotkey::HotkeyEdgeState;
use rapid_clicker::{
    ClickConfig, DryRunBackend, HotkeyPoller, Key, PacingConfig, Point, SessionCommand,
    SessionController, StartOutcome, StopOutcome,
};
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};
use tempfile::NamedTempFile;

fn controller(backend: &Arc<DryRunBackend>, rate: u32) -> Arc<SessionController> {
    Arc::new(SessionController::new(
        backend.clone(),
        ClickConfig::new(rate).unwrap(),
        PacingConfig::default(),
        Duration::from_secs(1),
    ))
}

fn wait_for(mut condition: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(Instant::now() < deadline, "condition not met in time");
        thread::sleep(Duration::from_millis(1));
    }
}

// Config tests

#[test]
fn test_camel_case_rate_alias() {
    let json = r#"{ "clicksPerSecond": 25 }"#;

    let config: Config = serde_json::from_str(json).unwrap();

    assert_eq!(config.clicks_per_second, 25);
    assert_eq!(config.start_hotkey, "ctrl+f1"); // default
    assert_eq!(config.stop_hotkey, "ctrl+f2"); // default
    assert!(config.validate().is_ok());
}

#[test]
fn test_full_config() {
    let json = r#"
    {
        "clicks_per_second": 40,
        "start_hotkey": "ctrl+alt+s",
        "stop_hotkey": "ctrl+alt+x",
        "hotkeys_enabled": true,
        "poll_interval": "20ms",
        "poll_backoff": "200ms",
        "stop_timeout": "2s",
        "spin_batch": 4,
        "press_release_spins": 100,
        "sleep_margin": null,
        "sleep_slice": "1ms",
        "max_consecutive_failures": 0,
        "verbose": true
    }
    "#;

    let config: Config = serde_json::from_str(json).unwrap();

    assert_eq!(config.clicks_per_second, 40);
    assert_eq!(config.poll_interval, Duration::from_millis(20));
    assert_eq!(config.poll_backoff, Duration::from_millis(200));
    assert_eq!(config.stop_timeout, Duration::from_secs(2));
    assert_eq!(config.sleep_margin, None);
    assert!(config.verbose);

    let pacing = config.pacing();
    assert_eq!(pacing.spin_batch, 4);
    assert_eq!(pacing.press_release_spins, 100);
    assert_eq!(pacing.max_consecutive_failures, 0);

    let bindings = config.hotkey_bindings().unwrap();
    assert_eq!(bindings.start.to_string(), "ctrl+alt+s");
    assert_eq!(bindings.stop.trigger(), Key::Letter('X'));

    assert!(config.validate().is_ok());
}

#[test]
fn test_config_validation_errors() {
    let mut config = Config {
        clicks_per_second: 0,
        ..Config::default()
    };
    assert!(config.validate().is_err());

    config.clicks_per_second = 5000;
    assert!(config.validate().is_err());

    config.clicks_per_second = 10;
    config.start_hotkey = "ctrl+".to_string();
    assert!(config.validate().is_err());

    config.start_hotkey = "ctrl+f1".to_string();
    config.poll_interval = Duration::ZERO;
    assert!(config.validate().is_err());

    config.poll_interval = Duration::from_millis(50);
    config.spin_batch = 0;
    assert!(config.validate().is_err());

    config.spin_batch = 1;
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_file_operations() -> Result<()> {
    let mut temp_file = NamedTempFile::new()?;
    temp_file.write_all(br#"{ "clicks_per_second": 33, "stop_timeout": "500ms" }"#)?;

    let config = Config::from_file(temp_file.path())?;

    assert_eq!(config.clicks_per_second, 33);
    assert_eq!(config.stop_timeout, Duration::from_millis(500));
    assert!(config.validate().is_ok());

    Ok(())
}

#[test]
fn test_config_load_failure_is_reported() -> Result<()> {
    let mut temp_file = NamedTempFile::new()?;
    temp_file.write_all(b"{ not json")?;

    let err = Config::from_file(temp_file.path()).unwrap_err();
    assert!(err.to_string().contains("failed to load config"));

    Ok(())
}

#[test]
fn test_load_or_create_writes_defaults() -> Result<()> {
    let temp_dir = tempfile::tempdir()?;
    let path = temp_dir.path().join("config.json");

    let created = Config::load_or_create(&path)?;
    assert!(path.exists());
    assert_eq!(created.clicks_per_second, 10);

    let loaded = Config::load_or_create(&path)?;
    assert_eq!(loaded.poll_interval, created.poll_interval);
    assert_eq!(loaded.sleep_margin, created.sleep_margin);

    Ok(())
}

#[test]
fn test_config_save_load_roundtrip() -> Result<()> {
    let temp_dir = tempfile::tempdir()?;
    let config_path = temp_dir.path().join("test_config.json");

    let original = Config {
        clicks_per_second: 64,
        start_hotkey: "shift+f5".to_string(),
        stop_hotkey: "shift+f6".to_string(),
        hotkeys_enabled: false,
        poll_interval: Duration::from_millis(30),
        sleep_margin: Some(Duration::from_micros(1500)),
        max_consecutive_failures: 7,
        ..Config::default()
    };

    original.save_to_file(&config_path)?;
    let loaded = Config::from_file(&config_path)?;

    assert_eq!(loaded.clicks_per_second, original.clicks_per_second);
    assert_eq!(loaded.start_hotkey, original.start_hotkey);
    assert_eq!(loaded.stop_hotkey, original.stop_hotkey);
    assert_eq!(loaded.hotkeys_enabled, original.hotkeys_enabled);
    assert_eq!(loaded.poll_interval, original.poll_interval);
    assert_eq!(loaded.sleep_margin, original.sleep_margin);
    assert_eq!(
        loaded.max_consecutive_failures,
        original.max_consecutive_failures
    );

    Ok(())
}

#[test]
fn test_duration_parsing_edge_cases() {
    assert_eq!(parse_duration("0ms").unwrap(), Duration::from_millis(0));
    assert_eq!(parse_duration("1000").unwrap(), Duration::from_millis(1000));
    assert_eq!(parse_duration("5S").unwrap(), Duration::from_secs(5));
    assert_eq!(parse_duration(" 2m ").unwrap(), Duration::from_secs(120));

    assert!(parse_duration("").is_err());
    assert!(parse_duration("abc").is_err());
    assert!(parse_duration("1000x").is_err());
    assert!(parse_duration("-1000ms").is_err());
}

// Session tests

#[test]
fn test_stop_without_session_is_noop() {
    let backend = Arc::new(DryRunBackend::new());
    let controller = controller(&backend, 10);

    assert_eq!(controller.stop(), StopOutcome::NotActive);
    assert_eq!(controller.stop(), StopOutcome::NotActive);
    assert_eq!(backend.cursor_moves(), 0);
    assert_eq!(backend.presses(), 0);
}

#[test]
fn test_no_clicks_after_stop() {
    let backend = Arc::new(DryRunBackend::new());
    backend.set_cursor(Point::new(12, 34));
    let controller = controller(&backend, 100);

    controller.start().unwrap();
    wait_for(|| backend.releases() >= 5);

    assert!(matches!(controller.stop(), StopOutcome::Stopped(_)));
    let presses = backend.presses();
    let releases = backend.releases();
    assert_eq!(presses, releases);

    thread::sleep(Duration::from_millis(100));
    assert_eq!(backend.presses(), presses);
    assert_eq!(backend.releases(), releases);
}

#[test]
fn test_concurrent_starts_create_one_session() {
    let backend = Arc::new(DryRunBackend::new());
    let controller = controller(&backend, 50);
    let barrier = Arc::new(Barrier::new(2));

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let controller = Arc::clone(&controller);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                controller.start().unwrap()
            })
        })
        .collect();
    let outcomes: Vec<StartOutcome> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let started = outcomes
        .iter()
        .filter(|o| matches!(o, StartOutcome::Started { .. }))
        .count();
    assert_eq!(started, 1);
    assert!(controller.is_active());

    assert!(matches!(controller.stop(), StopOutcome::Stopped(_)));
    // One worker thread means exactly one snap to the anchor.
    assert_eq!(backend.cursor_moves(), 1);
}

#[test]
fn test_racing_stops_from_console_and_hotkey() {
    for _ in 0..20 {
        let backend = Arc::new(DryRunBackend::new());
        let controller = controller(&backend, 200);
        controller.start().unwrap();
        wait_for(|| backend.releases() >= 1);

        let barrier = Arc::new(Barrier::new(2));
        let handles: Vec<_> = (0..2)
            .map(|_| {
                let controller = Arc::clone(&controller);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    controller.execute(SessionCommand::Stop).unwrap()
                })
            })
            .collect();
        let outcomes: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        let stopped = outcomes
            .iter()
            .filter(|o| {
                matches!(
                    o,
                    rapid_clicker::session::CommandOutcome::Stop(StopOutcome::Stopped(_))
                )
            })
            .count();
        assert_eq!(stopped, 1);

        let releases = backend.releases();
        thread::sleep(Duration::from_millis(20));
        assert_eq!(backend.releases(), releases);
    }
}

#[test]
fn test_shutdown_stops_active_session() {
    let backend = Arc::new(DryRunBackend::new());
    let controller = controller(&backend, 100);

    controller.start().unwrap();
    wait_for(|| backend.releases() >= 1);
    controller.shutdown();

    assert!(!controller.is_active());
    let releases = backend.releases();
    thread::sleep(Duration::from_millis(50));
    assert_eq!(backend.releases(), releases);
}

#[test]
fn test_start_fails_cleanly_without_anchor() {
    struct NoCursor(DryRunBackend);

    impl rapid_clicker::InputBackend for NoCursor {
        fn key_down(&self, key: Key) -> rapid_clicker::Result<bool> {
            self.0.key_down(key)
        }
        fn cursor_position(&self) -> rapid_clicker::Result<Point> {
            Err(rapid_clicker::ClickerError::cursor("no display"))
        }
        fn set_cursor_position(&self, point: Point) -> rapid_clicker::Result<()> {
            self.0.set_cursor_position(point)
        }
        fn inject(&self, event: rapid_clicker::platform::ButtonEvent) -> rapid_clicker::Result<()> {
            self.0.inject(event)
        }
        fn name(&self) -> &'static str {
            "no-cursor"
        }
    }

    let controller = SessionController::new(
        Arc::new(NoCursor(DryRunBackend::new())),
        ClickConfig::new(10).unwrap(),
        PacingConfig::default(),
        Duration::from_secs(1),
    );

    assert!(controller.start().is_err());
    assert!(!controller.is_active());
    assert_eq!(controller.stop(), StopOutcome::NotActive);
}

#[test]
fn test_stuck_worker_is_detached_and_never_revived() {
    struct SlowInject(Arc<DryRunBackend>);

    impl rapid_clicker::InputBackend for SlowInject {
        fn key_down(&self, key: Key) -> rapid_clicker::Result<bool> {
            self.0.key_down(key)
        }
        fn cursor_position(&self) -> rapid_clicker::Result<Point> {
            self.0.cursor_position()
        }
        fn set_cursor_position(&self, point: Point) -> rapid_clicker::Result<()> {
            self.0.set_cursor_position(point)
        }
        fn inject(&self, event: rapid_clicker::platform::ButtonEvent) -> rapid_clicker::Result<()> {
            thread::sleep(Duration::from_millis(200));
            self.0.inject(event)
        }
        fn name(&self) -> &'static str {
            "slow-inject"
        }
    }

    let backend = Arc::new(DryRunBackend::new());
    let controller = SessionController::new(
        Arc::new(SlowInject(backend.clone())),
        ClickConfig::new(1000).unwrap(),
        PacingConfig::default(),
        Duration::from_millis(50),
    );

    controller.start().unwrap();
    thread::sleep(Duration::from_millis(20));
    let started = Instant::now();
    assert_eq!(controller.stop(), StopOutcome::Detached);
    assert!(started.elapsed() < Duration::from_millis(180));
    assert!(!controller.is_active());

    assert!(matches!(
        controller.start().unwrap(),
        StartOutcome::Started { .. }
    ));
    thread::sleep(Duration::from_millis(20));
    assert_eq!(controller.stop(), StopOutcome::Detached);

    // Each detached worker finishes at most its current click, then exits.
    thread::sleep(Duration::from_millis(600));
    let (presses, releases) = (backend.presses(), backend.releases());
    assert_eq!(presses, releases);
    thread::sleep(Duration::from_millis(400));
    assert_eq!(backend.presses(), presses);
    assert_eq!(backend.releases(), releases);
}

// Hotkey poller tests

fn default_poller(backend: &Arc<DryRunBackend>) -> HotkeyPoller {
    HotkeyPoller::from_config(backend.clone(), &Config::default()).unwrap()
}

#[test]
fn test_two_separate_holds_fire_twice() {
    let backend = Arc::new(DryRunBackend::new());
    let poller = default_poller(&backend);
    let mut state = HotkeyEdgeState::default();
    let mut fired = Vec::new();

    backend.press_key(Key::Control);
    for _ in 0..2 {
        backend.press_key(Key::Function(1));
        for _ in 0..5 {
            fired.extend(poller.poll_once(&mut state).unwrap());
        }
        backend.release_key(Key::Function(1));
        for _ in 0..5 {
            fired.extend(poller.poll_once(&mut state).unwrap());
        }
    }

    assert_eq!(fired, vec![SessionCommand::Start, SessionCommand::Start]);
}

#[test]
fn test_poller_thread_survives_query_failures() {
    let backend = Arc::new(DryRunBackend::new());
    let config = Config {
        poll_interval: Duration::from_millis(1),
        poll_backoff: Duration::from_millis(1),
        ..Config::default()
    };
    let poller = HotkeyPoller::from_config(backend.clone(), &config).unwrap();
    let shutdown = Arc::new(AtomicBool::new(false));
    let (tx, rx) = mpsc::channel();

    let handle = poller
        .spawn(Arc::clone(&shutdown), move |command| {
            let _ = tx.send(command);
        })
        .unwrap();

    backend.set_fail_key_queries(true);
    thread::sleep(Duration::from_millis(20));
    assert!(!handle.is_finished());

    backend.set_fail_key_queries(false);
    backend.press_key(Key::Control);
    backend.press_key(Key::Function(2));
    assert_eq!(
        rx.recv_timeout(Duration::from_secs(5)).unwrap(),
        SessionCommand::Stop
    );

    shutdown.store(true, Ordering::Release);
    handle.join().unwrap();
    assert!(rx.try_recv().is_err());
}

#[test]
fn test_hotkeys_drive_a_session() {
    let backend = Arc::new(DryRunBackend::new());
    let controller = controller(&backend, 100);
    let config = Config {
        poll_interval: Duration::from_millis(1),
        ..Config::default()
    };
    let poller = HotkeyPoller::from_config(backend.clone(), &config).unwrap();
    let shutdown = Arc::new(AtomicBool::new(false));

    let session = Arc::clone(&controller);
    let handle = poller
        .spawn(Arc::clone(&shutdown), move |command| {
            session.execute(command).unwrap();
        })
        .unwrap();

    backend.press_key(Key::Control);
    backend.press_key(Key::Function(1));
    wait_for(|| controller.is_active());
    backend.release_key(Key::Function(1));
    wait_for(|| backend.releases() >= 2);

    backend.press_key(Key::Function(2));
    wait_for(|| !controller.is_active());

    shutdown.store(true, Ordering::Release);
    handle.join().unwrap();
    assert_eq!(backend.cursor_moves(), 1);
}
