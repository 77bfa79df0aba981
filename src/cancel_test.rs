use super::*;
use std::time::Instant;

#[test]
fn new_flag_is_not_cancelled() {
    assert!(!CancellationFlag::new().is_cancelled());
}

#[test]
fn cancel_is_visible_through_clones() {
    let flag = CancellationFlag::new();
    let observer = flag.clone();
    assert!(flag.cancel());
    assert!(observer.is_cancelled());
}

#[test]
fn cancel_twice_reports_only_first_request() {
    let flag = CancellationFlag::new();
    assert!(flag.cancel());
    assert!(!flag.cancel());
    assert!(flag.is_cancelled());
}

#[tokio::test]
async fn sleep_runs_full_duration_without_cancel() {
    let flag = CancellationFlag::new();
    let started = Instant::now();
    assert!(!flag.sleep(Duration::from_millis(30)).await);
    assert!(started.elapsed() >= Duration::from_millis(30));
}

#[tokio::test]
async fn sleep_returns_immediately_when_already_cancelled() {
    let flag = CancellationFlag::new();
    flag.cancel();
    let started = Instant::now();
    assert!(flag.sleep(Duration::from_secs(30)).await);
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn sleep_wakes_early_on_cancel() {
    let flag = CancellationFlag::new();
    let canceller = flag.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        canceller.cancel();
    });

    let started = Instant::now();
    assert!(flag.sleep(Duration::from_secs(30)).await);
    assert!(started.elapsed() < Duration::from_secs(5));
}
