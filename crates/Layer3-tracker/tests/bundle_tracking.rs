//! Bundle tracker integration tests

use lifecycle_tracker::{
    Bundle, BundleCallback, BundleTrackerManager, Callback, CancellationToken, Error, Filter,
    InMemoryFramework, TrackerConfig,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

type Log = Arc<Mutex<Vec<String>>>;

fn record(log: &Log, tag: &'static str) -> Callback<Bundle> {
    let log = Arc::clone(log);
    BundleCallback::sync(move |b: &Bundle| {
        log.lock().push(format!("{}:{}", tag, b.symbolic_name));
        Ok(())
    })
}

fn take(log: &Log) -> Vec<String> {
    std::mem::take(&mut *log.lock())
}

#[test]
fn seeded_bundle_then_new_bundle_then_unregister() {
    let framework = InMemoryFramework::new();
    let a = framework.install("app.a", "1.0.0");
    framework.start(a).unwrap();

    let manager = BundleTrackerManager::new(TrackerConfig::new(), framework.clone()).unwrap();
    let log: Log = Arc::default();
    manager
        .register_all_bundles_callback("k1", record(&log, "start"), record(&log, "stop"))
        .unwrap();
    assert_eq!(take(&log), vec!["start:app.a"]);

    let b = framework.install("app.b", "1.0.0");
    framework.start(b).unwrap();
    assert_eq!(take(&log), vec!["start:app.b"]);

    manager.unregister_bundle_callback("k1").unwrap();
    let mut stops = take(&log);
    stops.sort();
    assert_eq!(stops, vec!["stop:app.a", "stop:app.b"]);

    framework.stop(a).unwrap();
    assert!(take(&log).is_empty());
}

#[test]
fn repeated_start_notifies_once() {
    let framework = InMemoryFramework::new();
    let manager = BundleTrackerManager::new(TrackerConfig::new(), framework.clone()).unwrap();
    let log: Log = Arc::default();
    manager
        .register_all_bundles_callback("k1", record(&log, "start"), record(&log, "stop"))
        .unwrap();

    let a = framework.install("app.a", "1.0.0");
    framework.start(a).unwrap();
    framework.start(a).unwrap();
    assert_eq!(take(&log), vec!["start:app.a"]);
}

#[test]
fn update_of_active_bundle_stops_and_restarts() {
    let framework = InMemoryFramework::new();
    let a = framework.install("app.a", "1.0.0");
    framework.start(a).unwrap();

    let manager = BundleTrackerManager::new(TrackerConfig::new(), framework.clone()).unwrap();
    let log: Log = Arc::default();
    manager
        .register_all_bundles_callback("k1", record(&log, "start"), record(&log, "stop"))
        .unwrap();
    take(&log);

    framework.update(a, "2.0.0").unwrap();
    assert_eq!(take(&log), vec!["stop:app.a", "start:app.a"]);
    assert_eq!(manager.active_bundles()[0].version, "2.0.0");
}

#[test]
fn duplicate_key_is_rejected() {
    let framework = InMemoryFramework::new();
    let manager = BundleTrackerManager::new(TrackerConfig::new(), framework).unwrap();
    let log: Log = Arc::default();

    manager
        .register_bundle_callback("k", record(&log, "start"), Callback::noop(), Filter::all())
        .unwrap();
    let err = manager
        .register_bundle_callback("k", record(&log, "start"), Callback::noop(), Filter::all())
        .unwrap_err();
    assert!(matches!(err, Error::DuplicateRegistration { .. }));
}

#[test]
fn unavailable_framework_starts_empty() {
    let framework = InMemoryFramework::new();
    let a = framework.install("app.a", "1.0.0");
    framework.start(a).unwrap();
    framework.set_available(false);

    let manager = BundleTrackerManager::new(TrackerConfig::new(), framework.clone()).unwrap();
    assert!(manager.active_bundles().is_empty());

    framework.set_available(true);
    manager.tracker().resync();
    assert_eq!(manager.active_bundles().len(), 1);
}

#[tokio::test]
async fn stop_cancels_slow_start_task() {
    let framework = InMemoryFramework::new();
    let manager = BundleTrackerManager::new(TrackerConfig::new(), framework.clone()).unwrap();
    let log: Log = Arc::default();

    let cancelled = Arc::new(AtomicUsize::new(0));
    let c = cancelled.clone();
    manager
        .register_all_bundles_callback(
            "slow",
            BundleCallback::spawn(move |_bundle: Bundle, token: CancellationToken| {
                let c = c.clone();
                async move {
                    tokio::select! {
                        _ = token.cancelled() => {
                            c.fetch_add(1, Ordering::SeqCst);
                        }
                        _ = tokio::time::sleep(Duration::from_secs(30)) => {}
                    }
                    Ok(())
                }
            }),
            Callback::noop(),
        )
        .unwrap();
    manager
        .register_all_bundles_callback("fast", record(&log, "start"), record(&log, "stop"))
        .unwrap();

    let a = framework.install("app.a", "1.0.0");
    framework.start(a).unwrap();
    framework.stop(a).unwrap();
    assert_eq!(take(&log), vec!["start:app.a", "stop:app.a"]);

    manager.tracker().drain().await;
    assert_eq!(cancelled.load(Ordering::SeqCst), 1);
    assert_eq!(manager.tracker().pending_tasks(), 0);

    manager.shutdown().await;
    assert_eq!(framework.listener_count(), 0);
}
