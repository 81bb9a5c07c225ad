// tests/native_watch.rs

//! End-to-end behaviour on the platform's real change notifications.
//!
//! Timings are generous: native backends deliver asynchronously, so every
//! positive check waits for a notification and every negative check looks
//! at a fixed window.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::TempDir;

use treewatch::engine::WatcherOptions;
use treewatch::service::FileWatchService;
use treewatch::types::WatchStrategy;
use treewatch::watch::{TreeTarget, WatchInputs};
use treewatch_test_utils::init_tracing;
use treewatch_test_utils::listener::ListenerRecorder;

const WAIT: Duration = Duration::from_secs(10);
const QUIET_WINDOW: Duration = Duration::from_millis(800);
/// Time for the worker to register its watches after `start`.
const ARM: Duration = Duration::from_millis(300);

fn patterns(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn options(strategy: WatchStrategy) -> WatcherOptions {
    WatcherOptions::default()
        .with_quiet_period(Duration::from_millis(100))
        .with_poll_timeout(Duration::from_millis(50))
        .with_strategy(strategy)
}

fn canonical_tempdir() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let root = dir.path().canonicalize().unwrap();
    (dir, root)
}

async fn watch(inputs: WatchInputs, strategy: WatchStrategy) -> (FileWatchService, ListenerRecorder) {
    init_tracing();
    let service = FileWatchService::new(options(strategy));
    service.set_watch_inputs(inputs).await;
    let recorder = ListenerRecorder::new();
    service.set_listener(recorder.listener()).await;
    service.start().await.unwrap();
    tokio::time::sleep(ARM).await;
    (service, recorder)
}

fn tree(root: &Path, include: &[&str], exclude: &[&str]) -> WatchInputs {
    WatchInputs::new().with_tree(
        TreeTarget::from_patterns(root, &patterns(include), &patterns(exclude)).unwrap(),
    )
}

#[tokio::test]
async fn writing_an_included_file_notifies() {
    let (_dir, root) = canonical_tempdir();
    let (service, recorder) = watch(tree(&root, &["**/*.txt"], &[]), WatchStrategy::Auto).await;

    fs::write(root.join("notes.txt"), "hello").unwrap();
    assert!(recorder.wait_for(1, WAIT).await, "no notification for notes.txt");

    service.stop().await.unwrap();
}

#[tokio::test]
async fn changes_below_an_excluded_directory_do_not_notify() {
    let (_dir, root) = canonical_tempdir();
    fs::create_dir_all(root.join("target/debug")).unwrap();
    let (service, recorder) = watch(
        tree(&root, &["**/*.txt"], &["target"]),
        WatchStrategy::PerDirectory,
    )
    .await;

    fs::write(root.join("target/debug/out.txt"), "x").unwrap();
    fs::write(root.join("target/skipped.txt"), "x").unwrap();
    assert_eq!(recorder.count_during(QUIET_WINDOW).await, 0);

    fs::write(root.join("kept.txt"), "x").unwrap();
    assert!(recorder.wait_for(1, WAIT).await);

    service.stop().await.unwrap();
}

#[tokio::test]
async fn file_targets_ignore_their_siblings() {
    let (_dir, root) = canonical_tempdir();
    fs::write(root.join("watched.toml"), "a = 1").unwrap();
    fs::write(root.join("sibling.toml"), "a = 1").unwrap();
    let (service, recorder) = watch(
        WatchInputs::new().with_file(root.join("watched.toml")),
        WatchStrategy::Auto,
    )
    .await;

    fs::write(root.join("sibling.toml"), "a = 2").unwrap();
    fs::write(root.join("new-sibling.toml"), "a = 2").unwrap();
    assert_eq!(recorder.count_during(QUIET_WINDOW).await, 0);

    fs::write(root.join("watched.toml"), "a = 2").unwrap();
    assert!(recorder.wait_for(1, WAIT).await);

    service.stop().await.unwrap();
}

#[tokio::test]
async fn a_burst_of_writes_yields_one_notification() {
    let (_dir, root) = canonical_tempdir();
    let inputs = tree(&root, &[], &[]);
    init_tracing();
    let service = FileWatchService::new(
        options(WatchStrategy::Auto).with_quiet_period(Duration::from_millis(500)),
    );
    service.set_watch_inputs(inputs).await;
    let recorder = ListenerRecorder::new();
    service.set_listener(recorder.listener()).await;
    service.start().await.unwrap();
    tokio::time::sleep(ARM).await;

    for i in 0..5 {
        fs::write(root.join(format!("burst-{i}.txt")), "x").unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;
    }

    assert!(recorder.wait_for(1, WAIT).await);
    assert_eq!(recorder.count_during(Duration::from_millis(1200)).await, 0);
    assert_eq!(recorder.count(), 1);

    service.stop().await.unwrap();
}

async fn new_directories_are_covered(strategy: WatchStrategy) {
    let (_dir, root) = canonical_tempdir();
    let (service, recorder) = watch(tree(&root, &["**/*.txt"], &[]), strategy).await;

    // Directory names do not match the include list: only the file notifies.
    fs::create_dir_all(root.join("a/b/c")).unwrap();
    assert_eq!(recorder.count_during(QUIET_WINDOW).await, 0);

    fs::write(root.join("a/b/c/deep.txt"), "x").unwrap();
    assert!(
        recorder.wait_for(1, WAIT).await,
        "file in a new directory was not seen with {strategy:?}"
    );

    service.stop().await.unwrap();
}

#[tokio::test]
async fn new_directories_are_covered_per_directory() {
    new_directories_are_covered(WatchStrategy::PerDirectory).await;
}

#[tokio::test]
async fn new_directories_are_covered_recursively() {
    new_directories_are_covered(WatchStrategy::Recursive).await;
}

#[tokio::test]
async fn deleting_a_watched_directory_keeps_the_session_alive() {
    let (_dir, root) = canonical_tempdir();
    fs::create_dir_all(root.join("doomed/inner")).unwrap();
    let (service, recorder) =
        watch(tree(&root, &["**/*.txt"], &[]), WatchStrategy::PerDirectory).await;

    fs::remove_dir_all(root.join("doomed")).unwrap();
    tokio::time::sleep(QUIET_WINDOW).await;

    fs::write(root.join("after.txt"), "x").unwrap();
    assert!(recorder.wait_for(1, WAIT).await);
    assert!(service.is_running());

    service.stop().await.unwrap();
}

#[tokio::test]
async fn stop_then_start_watches_again() {
    let (_dir, root) = canonical_tempdir();
    let (service, recorder) = watch(tree(&root, &[], &[]), WatchStrategy::Auto).await;
    service.stop().await.unwrap();

    fs::write(root.join("while-stopped.txt"), "x").unwrap();
    assert_eq!(recorder.count_during(QUIET_WINDOW).await, 0);

    service.start().await.unwrap();
    tokio::time::sleep(ARM).await;
    fs::write(root.join("after-restart.txt"), "x").unwrap();
    assert!(recorder.wait_for(1, WAIT).await);

    service.stop().await.unwrap();
}

#[tokio::test]
async fn text_files_notify_unless_under_tmp() {
    let (_dir, root) = canonical_tempdir();
    fs::create_dir_all(root.join("tmp")).unwrap();
    let (service, recorder) = watch(
        tree(&root, &["**/*.txt"], &["**/tmp/**"]),
        WatchStrategy::Auto,
    )
    .await;

    fs::write(root.join("tmp/b.txt"), "x").unwrap();
    assert_eq!(recorder.count_during(QUIET_WINDOW).await, 0);

    fs::write(root.join("a.txt"), "x").unwrap();
    assert!(recorder.wait_for(1, WAIT).await);
    assert_eq!(recorder.count_during(QUIET_WINDOW).await, 0);

    service.stop().await.unwrap();
}

#[tokio::test]
async fn recursive_tree_still_sees_a_directory_holding_a_file_target() {
    let (_dir, root) = canonical_tempdir();
    fs::create_dir_all(root.join("sub")).unwrap();
    fs::write(root.join("sub/config.yml"), "a: 1").unwrap();

    let inputs = tree(&root, &["**/*.txt"], &[]).with_file(root.join("sub/config.yml"));
    let (service, recorder) = watch(inputs, WatchStrategy::Recursive).await;

    fs::write(root.join("sub/a.txt"), "x").unwrap();
    assert!(
        recorder.wait_for(1, WAIT).await,
        "tree missed sub/a.txt next to a watched file"
    );

    service.stop().await.unwrap();
}

#[tokio::test]
async fn outer_recursive_tree_still_sees_a_nested_tree() {
    let (_dir, root) = canonical_tempdir();
    fs::create_dir_all(root.join("sub")).unwrap();

    let inputs = tree(&root, &["**/*.txt"], &[]).with_tree(
        TreeTarget::from_patterns(root.join("sub"), &patterns(&["**/*.rs"]), &[]).unwrap(),
    );
    let (service, recorder) = watch(inputs, WatchStrategy::Recursive).await;

    fs::write(root.join("sub/outer.txt"), "x").unwrap();
    assert!(
        recorder.wait_for(1, WAIT).await,
        "outer tree missed sub/outer.txt below a nested tree"
    );

    service.stop().await.unwrap();
}

#[tokio::test]
async fn excluded_directory_contents_never_notify_recursively() {
    let (_dir, root) = canonical_tempdir();
    fs::create_dir_all(root.join("tmp")).unwrap();
    let (service, recorder) = watch(
        tree(&root, &["**/*.txt"], &["**/tmp/**"]),
        WatchStrategy::Recursive,
    )
    .await;

    fs::create_dir_all(root.join("sub/tmp")).unwrap();
    fs::write(root.join("sub/tmp/b.txt"), "x").unwrap();
    fs::write(root.join("tmp/c.txt"), "x").unwrap();
    assert_eq!(recorder.count_during(QUIET_WINDOW).await, 0);

    service.stop().await.unwrap();
}
