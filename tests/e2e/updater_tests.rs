//! Background runner: notifications, events and overlap protection.

use super::harness::{asset_url, FakeFeed, Harness, SabotageStaging};
use native_updater::{BufferedNotifier, CheckStatus, Outcome, UpdateEvent, Updater};
use std::sync::Arc;

const HOST: &str = "TestHost";

fn updater(h: &Harness, notifier: &Arc<BufferedNotifier>) -> Updater<FakeFeed, Arc<BufferedNotifier>> {
    Updater::new(h.reconciler("2.0"), Arc::clone(notifier), HOST)
}

#[tokio::test]
async fn test_install_notifies_and_emits_event() {
    let h = Harness::new();
    let name = Harness::artifact("2.0");
    h.feed.publish("v2.0", &[(name.as_str(), b"bin" as &[u8])]);
    let notifier = Arc::new(BufferedNotifier::new());
    let updater = updater(&h, &notifier);
    let mut events = updater.subscribe_events();

    let status = updater.spawn_check().await.unwrap();

    assert!(matches!(status, CheckStatus::Completed(Outcome::Installed { .. })));
    assert_eq!(
        notifier.drain(),
        vec!["Plugin downloaded successfully, please restart TestHost to load it"]
    );
    assert_eq!(events.recv().await.unwrap(), UpdateEvent::CheckStarted);
    assert_eq!(
        events.recv().await.unwrap(),
        UpdateEvent::Installed {
            version: "v2.0".to_string(),
            filename: name,
        }
    );
}

#[tokio::test]
async fn test_up_to_date_is_silent() {
    let h = Harness::new();
    let name = Harness::artifact("2.0");
    h.feed.publish("v2.0", &[(name.as_str(), b"bin" as &[u8])]);
    let notifier = Arc::new(BufferedNotifier::new());
    let updater = updater(&h, &notifier);

    updater.check_now().await;
    notifier.drain();
    let status = updater.check_now().await;

    assert!(matches!(status, CheckStatus::Completed(Outcome::UpToDate { .. })));
    assert!(notifier.is_empty());
}

#[tokio::test]
async fn test_feed_failure_is_reported_not_raised() {
    let h = Harness::new();
    h.feed.take_offline();
    let notifier = Arc::new(BufferedNotifier::new());
    let updater = updater(&h, &notifier);
    let mut events = updater.subscribe_events();

    let status = updater.check_now().await;

    let CheckStatus::Failed {
        message,
        manual_intervention,
    } = status
    else {
        unreachable!("expected failure, got {status:?}");
    };
    assert!(!manual_intervention);
    assert_eq!(message, "Failed to fetch release information (feed offline)");
    assert_eq!(notifier.drain(), vec![message.clone()]);
    assert_eq!(events.recv().await.unwrap(), UpdateEvent::CheckStarted);
    assert_eq!(events.recv().await.unwrap(), UpdateEvent::Failed { message });
}

#[tokio::test]
async fn test_download_failure_has_its_own_message() {
    let h = Harness::new();
    let name = Harness::artifact("2.0");
    h.feed.publish("v2.0", &[(name.as_str(), b"bin" as &[u8])]);
    h.feed.fail_downloads(true);
    let notifier = Arc::new(BufferedNotifier::new());

    let status = updater(&h, &notifier).check_now().await;

    let expected = format!("Failed to download plugin from {}", asset_url("v2.0", &name));
    assert_eq!(
        status,
        CheckStatus::Failed {
            message: expected.clone(),
            manual_intervention: false,
        }
    );
    assert_eq!(notifier.drain(), vec![expected]);
}

#[tokio::test]
async fn test_no_compatible_asset_message() {
    let h = Harness::new();
    h.feed
        .publish("v2.0", &[(Harness::artifact("1.0").as_str(), b"bin" as &[u8])]);
    let notifier = Arc::new(BufferedNotifier::new());

    updater(&h, &notifier).check_now().await;

    assert_eq!(
        notifier.drain(),
        vec!["No compatible binary found for TestHost version 2.0"]
    );
}

#[tokio::test]
async fn test_cleanup_failure_requests_manual_intervention() {
    let h = Harness::new();
    let name = Harness::artifact("2.0");
    h.feed.publish("v2.0", &[(name.as_str(), b"bin" as &[u8])]);
    h.install_file(&name, b"bin");
    let notifier = Arc::new(BufferedNotifier::new());
    let reconciler =
        h.reconciler_with_hasher("2.0", SabotageStaging::new(h.store.layout().staging_dir()));
    let updater = Updater::new(reconciler, Arc::clone(&notifier), HOST);

    let status = updater.check_now().await;

    let staged = h.store.staged_path(&name);
    let CheckStatus::Failed {
        message,
        manual_intervention,
    } = status
    else {
        unreachable!("expected failure, got {status:?}");
    };
    assert!(manual_intervention);
    assert!(message.contains(&staged.display().to_string()));
    assert!(message.contains("please close TestHost"));
}

#[tokio::test]
async fn test_overlapping_checks_are_refused() {
    let h = Harness::new();
    let name = Harness::artifact("2.0");
    h.feed.publish("v2.0", &[(name.as_str(), b"bin" as &[u8])]);
    let notifier = Arc::new(BufferedNotifier::new());
    let updater = updater(&h, &notifier);

    // The current-thread test runtime does not poll the first task until we
    // await, so the second request always sees the first one in flight.
    let first = updater.spawn_check();
    let second = updater.spawn_check();

    assert_eq!(second.await.unwrap(), CheckStatus::AlreadyRunning);
    assert!(matches!(
        first.await.unwrap(),
        CheckStatus::Completed(Outcome::Installed { .. })
    ));

    // The guard is released once the first check finishes.
    assert!(matches!(
        updater.spawn_check().await.unwrap(),
        CheckStatus::Completed(Outcome::UpToDate { .. })
    ));
}
