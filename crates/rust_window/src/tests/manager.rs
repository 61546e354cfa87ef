use super::{warnings, Harness};
use crate::backend::HeadlessPlatform;
use crate::config::{InstanceConfig, WindowHint};
use crate::event::Event;
use crate::input::{KeyCode, KeyState};
use crate::instance::{Instance, InstanceError};
use crate::manager::{ManagerError, WindowId};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

#[test]
fn test_access_from_other_thread_is_rejected() {
    let mut harness = Harness::new();
    let manager = &mut harness.manager;

    let result = thread::scope(|s| s.spawn(|| manager.poll_events(None)).join().unwrap());
    assert!(matches!(result, Err(ManagerError::WrongThread { .. })));

    let result = thread::scope(|s| {
        // Manager is Send but not Sync; hand the thread a unique borrow
        let manager = &mut *manager;
        s.spawn(move || manager.validate_access(false)).join().unwrap()
    });
    assert!(result.is_ok());

    assert!(manager.validate_access(true).is_ok());
    assert_eq!(manager.attached_thread_id(), thread::current().id());
}

#[test]
fn test_second_instance_rejected_while_manager_alive() {
    let harness = Harness::new();

    let second = Instance::with_platform(HeadlessPlatform::new(), InstanceConfig::no_api());
    assert!(matches!(second, Err(InstanceError::AlreadyInitialized)));

    let Harness { manager, _serial, .. } = harness;
    drop(manager);
    let third = Instance::with_platform(HeadlessPlatform::new(), InstanceConfig::no_api());
    assert!(third.is_ok());
}

#[test]
fn test_create_window_reports_backend_failure() {
    let mut harness = Harness::new();
    harness.controller.fail_next_window();

    let result = harness.manager.create_window(&WindowHint::default(), "broken", 320, 240, true);
    assert!(matches!(result, Err(ManagerError::WindowCreation(_))));
    assert_eq!(harness.manager.window_count().unwrap(), 0);

    let _window = harness.window(true);
    assert_eq!(harness.manager.window_count().unwrap(), 1);
}

#[test]
fn test_initial_properties_follow_native_window() {
    let mut harness = Harness::new();
    let window = harness.window(true);
    let properties = window.properties();

    assert_eq!(properties.title, "test");
    assert_eq!((properties.dimensions.width, properties.dimensions.height), (640, 480));
    assert!(properties.attributes.contains(crate::window::WindowAttributes::VISIBLE));
    assert!((window.aspect_ratio() - 640.0 / 480.0).abs() < f32::EPSILON);
}

#[test]
fn test_dropped_window_is_destroyed_on_next_poll() {
    let mut harness = Harness::new();
    let window = harness.window(true);
    let handle = harness.controller.window(0).unwrap();

    drop(window);
    assert!(!handle.is_destroyed());

    harness.manager.poll_events(None).unwrap();
    assert!(handle.is_destroyed());
    assert_eq!(harness.manager.window_count().unwrap(), 0);
    assert!(!harness.manager.has_window_opened().unwrap());
}

#[test]
fn test_task_for_deleted_window_never_runs() {
    let mut harness = Harness::new();
    let window = harness.window(true);
    let id = window.id();
    let runs = Arc::new(AtomicUsize::new(0));

    drop(window);
    let counter = Arc::clone(&runs);
    harness.manager.enqueue_window_task(id, move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    harness.manager.poll_events(None).unwrap();
    assert_eq!(runs.load(Ordering::SeqCst), 0);
    let dropped = format!("Task for window {:?} dropped", id);
    assert_eq!(warnings().iter().filter(|message| message.contains(&dropped)).count(), 1);

    // a second deletion of the same id is ignored
    harness.manager.request_delete_window(id);
    harness.manager.poll_events(None).unwrap();
    assert_eq!(harness.manager.window_count().unwrap(), 0);
}

#[test]
fn test_window_tasks_run_on_manager_thread() {
    let mut harness = Harness::new();
    let window = harness.window(true);
    let manager_thread = thread::current().id();
    let seen = Arc::new(std::sync::Mutex::new(None));

    let handle = harness.manager.handle();
    let id = window.id();
    let slot = Arc::clone(&seen);
    thread::spawn(move || {
        handle.enqueue_window_task(id, move |native| {
            native.set_title("renamed");
            *slot.lock().unwrap() = Some(thread::current().id());
        });
    })
    .join()
    .unwrap();

    harness.manager.poll_events(None).unwrap();
    assert_eq!(*seen.lock().unwrap(), Some(manager_thread));
    assert_eq!(harness.controller.window(0).unwrap().title(), "renamed");
}

#[test]
fn test_panicking_task_does_not_stop_later_tasks() {
    let mut harness = Harness::new();
    let runs = Arc::new(AtomicUsize::new(0));

    harness.manager.enqueue_task(|| panic!("task failure"));
    let counter = Arc::clone(&runs);
    harness.manager.enqueue_task(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    harness.manager.poll_events(None).unwrap();
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

#[test]
fn test_interceptor_can_veto_and_rewrite() {
    let mut harness = Harness::new();
    let mut window = harness.window(true);
    let handle = harness.controller.window(0).unwrap();

    harness
        .manager
        .set_event_interceptor(|_id: WindowId, event: &mut Event| match event {
            Event::KeyPressed { key: KeyCode::Escape, .. } => false,
            Event::KeyPressed { key, .. } => {
                if *key == KeyCode::Q {
                    *key = KeyCode::W;
                }
                true
            }
            _ => true,
        })
        .unwrap();

    handle.inject(Event::key(KeyCode::Escape, KeyState::Press));
    handle.inject(Event::key(KeyCode::Q, KeyState::Press));
    harness.manager.poll_events(None).unwrap();

    let events: Vec<Event> = window.poll().iter().cloned().collect();
    assert_eq!(events, vec![Event::key(KeyCode::W, KeyState::Press)]);

    let keys = window.properties().key_state;
    assert!(!keys.is_pressed(KeyCode::Escape));
    assert!(!keys.is_pressed(KeyCode::Q));
    assert!(keys.is_pressed(KeyCode::W));

    harness.manager.clear_event_interceptor().unwrap();
    handle.inject(Event::key(KeyCode::Escape, KeyState::Press));
    harness.manager.poll_events(None).unwrap();
    assert_eq!(window.poll().len(), 1);
}

#[test]
fn test_monitor_changes_are_broadcast() {
    let mut harness = Harness::new();
    let mut first = harness.window(true);
    let mut second = harness.window(true);

    harness.controller.connect_monitor("HDMI-1");
    harness.manager.poll_events(None).unwrap();

    let connected = Event::MonitorConnected { name: "HDMI-1".to_string(), connected: true };
    assert_eq!(first.poll().iter().cloned().collect::<Vec<_>>(), vec![connected.clone()]);
    assert_eq!(second.poll().iter().cloned().collect::<Vec<_>>(), vec![connected]);

    harness.controller.disconnect_monitor("Headless-0");
    harness.manager.poll_events(None).unwrap();
    assert!(matches!(
        first.poll().iter().next(),
        Some(Event::MonitorConnected { name, connected: false }) if name == "Headless-0"
    ));

    // unchanged monitors are not reported again
    harness.manager.poll_events(None).unwrap();
    assert!(first.poll().is_empty());
}

#[test]
fn test_identical_monitor_names_are_reported() {
    let mut harness = Harness::new();
    let mut window = harness.window(true);
    let panel = |connected| Event::MonitorConnected { name: "Headless-0".to_string(), connected };

    harness.controller.connect_monitor("Headless-0");
    harness.manager.poll_events(None).unwrap();
    assert_eq!(window.poll().iter().cloned().collect::<Vec<_>>(), vec![panel(true)]);

    harness.controller.disconnect_monitor("Headless-0");
    harness.manager.poll_events(None).unwrap();
    assert_eq!(window.poll().iter().cloned().collect::<Vec<_>>(), vec![panel(false)]);
}

#[test]
fn test_close_button_closes_window() {
    let mut harness = Harness::new();
    let mut window = harness.window(true);
    assert!(harness.manager.has_window_opened().unwrap());

    harness.controller.window(0).unwrap().click_close();
    harness.manager.poll_events(None).unwrap();

    assert!(window.should_close());
    assert!(!harness.manager.has_window_opened().unwrap());
    assert!(window.poll().iter().any(|event| *event == Event::WindowClosed));
}

#[test]
fn test_poll_rate_limits_loop() {
    let mut harness = Harness::new();

    let start = Instant::now();
    harness.manager.poll_events(Some(Duration::from_millis(20))).unwrap();
    assert!(start.elapsed() >= Duration::from_millis(20));
    assert_eq!(harness.controller.poll_count(), 1);
}

#[test]
fn test_wait_events_drains_pending_requests() {
    let mut harness = Harness::new();
    let runs = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&runs);
    harness.manager.handle().enqueue_task(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    harness.manager.wait_events(Some(Duration::from_secs(5))).unwrap();

    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

#[test]
fn test_gl_loader_runs_once_per_window() {
    let loads = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&loads);
    let config = InstanceConfig::default().with_gl_loader(move |resolve| {
        let _ = resolve("glClear");
        counter.fetch_add(1, Ordering::SeqCst);
    });
    let mut harness = Harness::with_config(config);

    let _first = harness.window(true);
    let _second = harness.window(false);
    assert_eq!(loads.load(Ordering::SeqCst), 2);

    // unbound windows leave no context current
    assert_eq!(harness.controller.window(1).unwrap().current_thread(), None);
    assert_eq!(harness.controller.window(0).unwrap().current_thread(), Some(thread::current().id()));
}

#[test]
fn test_dropping_manager_closes_windows() {
    let mut harness = Harness::new();
    let window = harness.window(true);
    let handle = harness.controller.window(0).unwrap();

    let Harness { manager, _serial, .. } = harness;
    drop(manager);

    assert!(handle.is_destroyed());
    assert!(window.should_close());

    // late requests are discarded
    window.set_window_size(10, 10);
    drop(window);
}
