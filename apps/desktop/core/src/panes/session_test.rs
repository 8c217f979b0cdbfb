//! Tests for DirectorySession, driven through the in-memory provider.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::test_support::{Harness, QueuedExecutor, names};
use super::{DirectorySession, PaneId, SessionStatus};
use crate::file_system::{FileSystemProvider, FsError, InMemoryFileSystem, SortDirection, SortKey};
use crate::runtime::{PaneEvent, WorkerMessage};

fn scenario_fs() -> InMemoryFileSystem {
    let fs = InMemoryFileSystem::new();
    fs.add_file("/tmp/x/b.txt", 20, 2)
        .add_file("/tmp/x/a.txt", 10, 1)
        .add_file("/tmp/x/.hidden", 30, 3);
    fs
}

fn tree_fs() -> InMemoryFileSystem {
    let fs = InMemoryFileSystem::new();
    fs.add_file("/r/a/b/c/leaf.txt", 1, 1)
        .add_file("/r/a/one.txt", 1, 1)
        .add_directory("/r/other");
    fs
}

/// Loads `path` and delivers the result.
fn open(harness: &mut Harness, session: &mut DirectorySession, path: &str) {
    session.load_directory(Path::new(path));
    harness.pump(session);
}

/// Enters the displayed entry called `name` and delivers the result.
fn enter(harness: &mut Harness, session: &mut DirectorySession, name: &str) {
    let entry = session
        .displayed_entries()
        .iter()
        .find(|e| e.name == name)
        .cloned()
        .unwrap();
    session.navigate_into(&entry);
    harness.pump(session);
}

fn current(session: &DirectorySession) -> &Path {
    session.current_directory().unwrap()
}

// ============================================================================
// Loading
// ============================================================================

#[test]
fn test_load_goes_through_loading_to_ready() {
    let mut harness = Harness::inline(scenario_fs());
    let mut session = harness.session(1);
    assert_eq!(session.status(), SessionStatus::Idle);

    session.load_directory(Path::new("/tmp/x"));
    assert!(session.is_loading());
    assert_eq!(session.status(), SessionStatus::Loading);

    harness.pump(&mut session);
    assert!(!session.is_loading());
    assert_eq!(session.status(), SessionStatus::Ready);
    assert_eq!(names(session.displayed_entries()), vec!["a.txt", "b.txt", ".hidden"]);
}

#[test]
fn test_scenario_hidden_toggle_without_refetch() {
    let mut harness = Harness::inline(scenario_fs());
    let mut session = DirectorySession::new(PaneId::new(1), harness.services.clone(), Default::default(), true);
    open(&mut harness, &mut session, "/tmp/x");
    assert_eq!(names(session.displayed_entries()), vec!["a.txt", "b.txt"]);

    let calls = harness.fs.list_calls();
    session.set_hide_hidden(false);
    assert_eq!(names(session.displayed_entries()), vec!["a.txt", "b.txt", ".hidden"]);
    assert_eq!(harness.fs.list_calls(), calls);
    assert_eq!(harness.pump(&mut session), 0);
}

#[test]
fn test_set_sort_recomputes_synchronously() {
    let mut harness = Harness::inline(scenario_fs());
    let mut session = harness.session(1);
    open(&mut harness, &mut session, "/tmp/x");
    let calls = harness.fs.list_calls();

    session.set_sort(SortKey::Modified, SortDirection::Descending);
    assert_eq!(names(session.displayed_entries()), vec![".hidden", "b.txt", "a.txt"]);
    assert_eq!(harness.fs.list_calls(), calls);
}

#[test]
fn test_toggle_sort_flips_direction_on_same_key() {
    let harness = Harness::inline(scenario_fs());
    let mut session = harness.session(1);
    session.toggle_sort(SortKey::Name);
    assert_eq!(session.sort().direction, SortDirection::Descending);
    session.toggle_sort(SortKey::Size);
    assert_eq!(session.sort().key, SortKey::Size);
    assert_eq!(session.sort().direction, SortDirection::Ascending);
}

#[test]
fn test_sort_applies_to_listing_that_lands_later() {
    let fs = scenario_fs();
    let queue = Arc::new(QueuedExecutor::default());
    let mut harness = Harness::with_executor(fs, queue.clone());
    let mut session = harness.session(1);

    session.load_directory(Path::new("/tmp/x"));
    session.set_sort(SortKey::Size, SortDirection::Descending);
    queue.run_oldest();
    harness.pump(&mut session);
    assert_eq!(names(session.displayed_entries()), vec![".hidden", "b.txt", "a.txt"]);
}

#[test]
fn test_listing_failure_keeps_previous_entries() {
    let fs = scenario_fs();
    fs.add_directory("/locked");
    fs.fail_listing("/locked", FsError::PermissionDenied("/locked".to_string()));
    let mut harness = Harness::inline(fs);
    let mut session = harness.session(1);
    open(&mut harness, &mut session, "/tmp/x");

    open(&mut harness, &mut session, "/locked");
    assert_eq!(session.status(), SessionStatus::Error);
    assert!(session.last_error().unwrap().contains("permission denied"));
    assert!(!session.is_loading());
    assert_eq!(names(session.displayed_entries()), vec!["a.txt", "b.txt", ".hidden"]);
    assert_eq!(current(&session), Path::new("/tmp/x"));
    assert_eq!(session.path_text(), "/tmp/x");
    assert_eq!(session.history().depth(), 1);
    assert!(!session.can_go_back());
    assert_eq!(session.watched_directory(), Some(Path::new("/tmp/x")));
}

#[test]
fn test_failed_navigation_keeps_operations_in_displayed_directory() {
    let fs = tree_fs();
    fs.fail_listing("/r/other", FsError::PermissionDenied("/r/other".to_string()));
    let mut harness = Harness::inline(fs);
    let mut session = harness.session(1);
    open(&mut harness, &mut session, "/r");
    enter(&mut harness, &mut session, "other");
    assert_eq!(current(&session), Path::new("/r"));
    assert_eq!(names(session.displayed_entries()), vec!["a", "other"]);

    session.compress_entries(vec![PathBuf::from("/r/a/one.txt")]);
    harness.pump(&mut session);
    assert!(harness.fs.exists(Path::new("/r/one.zip")));
    assert!(!harness.fs.exists(Path::new("/r/other/one.zip")));

    // Going up starts from the displayed directory, not the one that failed
    session.go_up();
    assert_eq!(current(&session), Path::new("/"));
}

#[test]
fn test_failed_back_step_restores_history() {
    let fs = tree_fs();
    let mut harness = Harness::inline(fs);
    let mut session = harness.session(1);
    open(&mut harness, &mut session, "/r");
    enter(&mut harness, &mut session, "a");
    harness.fs.fail_listing("/r", FsError::Io("gone".to_string()));

    session.go_back();
    harness.pump(&mut session);
    assert_eq!(session.status(), SessionStatus::Error);
    assert_eq!(current(&session), Path::new("/r/a"));
    assert!(session.can_go_back());
    assert!(!session.can_go_forward());

    harness.fs.clear_listing_failure("/r");
    session.go_back();
    harness.pump(&mut session);
    assert_eq!(current(&session), Path::new("/r"));
    assert!(session.can_go_forward());
}

#[test]
fn test_refresh_after_failure_clears_error() {
    let fs = scenario_fs();
    fs.fail_listing("/tmp/x", FsError::Io("disk hiccup".to_string()));
    let mut harness = Harness::inline(fs);
    let mut session = harness.session(1);
    open(&mut harness, &mut session, "/tmp/x");
    assert!(session.last_error().is_some());

    harness.fs.clear_listing_failure("/tmp/x");
    session.refresh();
    harness.pump(&mut session);
    assert_eq!(session.status(), SessionStatus::Ready);
    assert_eq!(session.last_error(), None);
    assert_eq!(session.history().depth(), 1);
}

// ============================================================================
// Stale results
// ============================================================================

#[test]
fn test_stale_listing_arriving_last_is_discarded() {
    let fs = InMemoryFileSystem::new();
    fs.add_file("/a/from_a.txt", 1, 1).add_file("/b/from_b.txt", 1, 1);
    let queue = Arc::new(QueuedExecutor::default());
    let mut harness = Harness::with_executor(fs, queue.clone());
    let mut session = harness.session(1);

    session.load_directory(Path::new("/a"));
    session.load_directory(Path::new("/b"));
    assert_eq!(queue.pending(), 2);

    // B resolves first, then A
    queue.run_newest();
    harness.pump(&mut session);
    queue.run_oldest();
    harness.pump(&mut session);

    assert_eq!(current(&session), Path::new("/b"));
    assert_eq!(names(session.displayed_entries()), vec!["from_b.txt"]);
    assert_eq!(session.status(), SessionStatus::Ready);
}

#[test]
fn test_stale_listing_arriving_first_is_discarded() {
    let fs = InMemoryFileSystem::new();
    fs.add_file("/a/from_a.txt", 1, 1).add_file("/b/from_b.txt", 1, 1);
    let queue = Arc::new(QueuedExecutor::default());
    let mut harness = Harness::with_executor(fs, queue.clone());
    let mut session = harness.session(1);

    session.load_directory(Path::new("/a"));
    session.load_directory(Path::new("/b"));
    queue.run_oldest();
    harness.pump(&mut session);
    assert!(session.is_loading());
    assert!(session.displayed_entries().is_empty());

    queue.run_oldest();
    harness.pump(&mut session);
    assert_eq!(names(session.displayed_entries()), vec!["from_b.txt"]);
}

// ============================================================================
// History
// ============================================================================

#[test]
fn test_back_k_steps_then_forward_k_steps() {
    let mut harness = Harness::inline(tree_fs());
    let mut session = harness.session(1);
    open(&mut harness, &mut session, "/r");
    enter(&mut harness, &mut session, "a");
    enter(&mut harness, &mut session, "b");
    enter(&mut harness, &mut session, "c");
    let visited = ["/r", "/r/a", "/r/a/b", "/r/a/b/c"];

    for k in 1..=3 {
        session.go_back();
        harness.pump(&mut session);
        assert_eq!(current(&session), Path::new(visited[3 - k]));
    }
    assert!(!session.can_go_back());

    for k in 1..=3 {
        session.go_forward();
        harness.pump(&mut session);
        assert_eq!(current(&session), Path::new(visited[k]));
    }
    assert!(!session.can_go_forward());
    assert_eq!(session.history().depth(), 4);
}

#[test]
fn test_back_on_empty_history_is_noop() {
    let mut harness = Harness::inline(tree_fs());
    let mut session = harness.session(1);
    open(&mut harness, &mut session, "/r");
    let calls = harness.fs.list_calls();
    session.go_back();
    session.go_forward();
    assert_eq!(harness.fs.list_calls(), calls);
    assert_eq!(current(&session), Path::new("/r"));
}

#[test]
fn test_fresh_navigation_clears_forward() {
    let mut harness = Harness::inline(tree_fs());
    let mut session = harness.session(1);
    open(&mut harness, &mut session, "/r");
    enter(&mut harness, &mut session, "a");
    session.go_back();
    harness.pump(&mut session);
    enter(&mut harness, &mut session, "other");

    session.go_forward();
    harness.pump(&mut session);
    assert_eq!(current(&session), Path::new("/r/other"));
    assert!(!session.can_go_forward());
}

#[test]
fn test_go_up_is_fresh_navigation() {
    let mut harness = Harness::inline(tree_fs());
    let mut session = harness.session(1);
    open(&mut harness, &mut session, "/r/a/b");
    session.go_up();
    harness.pump(&mut session);
    assert_eq!(current(&session), Path::new("/r/a"));
    assert!(session.can_go_back());
}

#[test]
fn test_navigate_into_file_opens_it() {
    let mut harness = Harness::inline(tree_fs());
    let mut session = harness.session(1);
    open(&mut harness, &mut session, "/r/a");
    let calls = harness.fs.list_calls();

    enter(&mut harness, &mut session, "one.txt");
    assert_eq!(harness.fs.opened(), vec![PathBuf::from("/r/a/one.txt")]);
    assert_eq!(harness.fs.list_calls(), calls);
    assert_eq!(current(&session), Path::new("/r/a"));
}

#[test]
fn test_navigate_into_bundle_opens_it() {
    let fs = InMemoryFileSystem::new();
    fs.add_directory("/Applications/Tool.app");
    let mut harness = Harness::inline(fs);
    let mut session = harness.session(1);
    open(&mut harness, &mut session, "/Applications");

    enter(&mut harness, &mut session, "Tool.app");
    assert_eq!(harness.fs.opened(), vec![PathBuf::from("/Applications/Tool.app")]);
    assert_eq!(current(&session), Path::new("/Applications"));
}

// ============================================================================
// Typed paths
// ============================================================================

#[test]
fn test_navigate_to_invalid_path_reverts_text() {
    let mut harness = Harness::inline(tree_fs());
    let mut session = harness.session(1);
    open(&mut harness, &mut session, "/r");
    let calls = harness.fs.list_calls();

    session.set_path_text("relative/path");
    assert!(session.submit_path_text().is_err());
    assert_eq!(session.path_text(), "/r");
    assert_eq!(current(&session), Path::new("/r"));
    assert!(session.last_error().is_some());
    assert_eq!(harness.fs.list_calls(), calls);
}

#[test]
fn test_navigate_to_valid_path_resets_history() {
    let temp = tempfile::tempdir().unwrap();
    let fs = tree_fs();
    fs.add_file(temp.path().join("here.txt"), 1, 1);
    let mut harness = Harness::inline(fs);
    let mut session = harness.session(1);
    open(&mut harness, &mut session, "/r");
    enter(&mut harness, &mut session, "a");

    session.navigate_to_path(&format!(" {} ", temp.path().display())).unwrap();
    harness.pump(&mut session);
    assert_eq!(current(&session), temp.path());
    assert_eq!(session.history().depth(), 1);
    assert!(!session.can_go_back());
    assert_eq!(names(session.displayed_entries()), vec!["here.txt"]);
}

// ============================================================================
// File operations
// ============================================================================

fn collision_fs() -> InMemoryFileSystem {
    let fs = InMemoryFileSystem::new();
    fs.add_file("/src/c.txt", 3, 1)
        .add_file("/src/d.txt", 4, 1)
        .add_file("/dst/c.txt", 30, 1)
        .add_file("/dst/d.txt", 40, 1);
    fs
}

#[test]
fn test_scenario_collision_cancel_leaves_destination_unchanged() {
    let mut harness = Harness::inline(collision_fs());
    let mut session = harness.session(1);
    open(&mut harness, &mut session, "/dst");
    let before = session.displayed_entries().to_vec();

    session.move_entries(vec![PathBuf::from("/src/c.txt")], Path::new("/dst"));
    harness.pump(&mut session);
    assert_eq!(harness.sink.confirmations(), 1);
    assert!(session.pending_confirmation().is_some());

    assert!(session.confirm_pending(false));
    assert_eq!(session.last_message(), Some("Operation cancelled."));
    assert_eq!(session.last_error(), None);

    session.refresh();
    harness.pump(&mut session);
    assert_eq!(session.displayed_entries(), before.as_slice());
    assert!(harness.fs.exists(Path::new("/src/c.txt")));
}

#[test]
fn test_multiple_collisions_ask_once() {
    let mut harness = Harness::inline(collision_fs());
    let mut session = harness.session(1);
    open(&mut harness, &mut session, "/src");

    session.move_entries(
        vec![PathBuf::from("/src/c.txt"), PathBuf::from("/src/d.txt")],
        Path::new("/dst"),
    );
    harness.pump(&mut session);
    assert_eq!(harness.sink.confirmations(), 1);
    let request = session.pending_confirmation().unwrap();
    assert_eq!(request.conflicting_names, vec!["c.txt", "d.txt"]);
    assert!(request.message.starts_with("2 items already exist"));
}

#[test]
fn test_confirmed_move_overwrites_and_refreshes() {
    let mut harness = Harness::inline(collision_fs());
    let mut session = harness.session(1);
    open(&mut harness, &mut session, "/src");

    session.move_entries(vec![PathBuf::from("/src/c.txt")], Path::new("/dst"));
    harness.pump(&mut session);
    assert!(session.confirm_pending(true));
    harness.pump(&mut session);

    assert_eq!(session.last_message(), Some("Moved 1 item."));
    assert_eq!(names(session.displayed_entries()), vec!["d.txt"]);
    let dst = harness.fs.list_directory(Path::new("/dst")).unwrap();
    let c = dst.iter().find(|e| e.name == "c.txt").unwrap();
    assert_eq!(c.size, Some(3));
    assert_eq!(session.operations_in_flight(), 0);
}

#[test]
fn test_collision_scan_runs_in_background() {
    let queue = Arc::new(QueuedExecutor::default());
    let mut harness = Harness::with_executor(collision_fs(), queue.clone());
    let mut session = harness.session(1);
    session.load_directory(Path::new("/src"));
    queue.run_oldest();
    harness.pump(&mut session);

    session.move_entries(vec![PathBuf::from("/src/c.txt")], Path::new("/dst"));
    assert_eq!(queue.pending(), 1);
    assert_eq!(session.operations_in_flight(), 1);
    assert!(session.pending_confirmation().is_none());

    queue.run_oldest();
    harness.pump(&mut session);
    assert!(session.pending_confirmation().is_some());
    assert_eq!(session.operations_in_flight(), 0);
    assert_eq!(queue.pending(), 0);
    assert!(harness.fs.exists(Path::new("/src/c.txt")));
}

#[test]
fn test_second_collision_while_confirming_is_refused() {
    let queue = Arc::new(QueuedExecutor::default());
    let mut harness = Harness::with_executor(collision_fs(), queue.clone());
    let mut session = harness.session(1);
    session.load_directory(Path::new("/src"));
    queue.run_oldest();
    harness.pump(&mut session);

    session.move_entries(vec![PathBuf::from("/src/c.txt")], Path::new("/dst"));
    session.copy_entries(vec![PathBuf::from("/src/d.txt")], Path::new("/dst"));
    assert_eq!(queue.pending(), 2);
    while queue.run_oldest() {}
    harness.pump(&mut session);

    let pending = session.pending_confirmation().unwrap();
    assert_eq!(pending.conflicting_names, vec!["c.txt"]);
    assert_eq!(harness.sink.confirmations(), 1);
    assert_eq!(session.last_error(), Some("Confirm or cancel the pending operation first."));
    assert_eq!(session.operations_in_flight(), 0);
}

#[test]
fn test_confirm_without_pending_is_noop() {
    let harness = Harness::inline(collision_fs());
    let mut session = harness.session(1);
    assert!(!session.confirm_pending(true));
}

#[test]
fn test_partial_move_reports_failed_names() {
    let fs = InMemoryFileSystem::new();
    fs.add_file("/src/a.txt", 1, 1)
        .add_file("/src/b.txt", 1, 1)
        .add_directory("/dst");
    fs.fail_item("/src/b.txt");
    let mut harness = Harness::inline(fs);
    let mut session = harness.session(1);
    open(&mut harness, &mut session, "/src");

    session.move_entries(
        vec![PathBuf::from("/src/a.txt"), PathBuf::from("/src/b.txt")],
        Path::new("/dst"),
    );
    harness.pump(&mut session);

    assert_eq!(session.last_error(), Some("Moved 1 of 2 items. Failed: b.txt"));
    assert_eq!(names(session.displayed_entries()), vec!["b.txt"]);
    let completed = harness
        .sink
        .events()
        .into_iter()
        .filter(|e| matches!(e, PaneEvent::OperationCompleted { .. }))
        .count();
    assert_eq!(completed, 1);
}

#[test]
fn test_success_after_partial_failure_replaces_summary() {
    let fs = InMemoryFileSystem::new();
    fs.add_file("/src/a.txt", 1, 1)
        .add_file("/src/b.txt", 1, 1)
        .add_file("/src/e.txt", 1, 1)
        .add_directory("/dst");
    fs.fail_item("/src/b.txt");
    let mut harness = Harness::inline(fs);
    let mut session = harness.session(1);
    open(&mut harness, &mut session, "/src");

    session.move_entries(
        vec![PathBuf::from("/src/a.txt"), PathBuf::from("/src/b.txt")],
        Path::new("/dst"),
    );
    harness.pump(&mut session);
    assert!(session.last_error().is_some());

    session.move_entries(vec![PathBuf::from("/src/e.txt")], Path::new("/dst"));
    harness.pump(&mut session);
    assert_eq!(session.last_message(), Some("Moved 1 item."));
    assert_eq!(session.last_error(), None);

    session.move_entries(vec![PathBuf::from("/src/b.txt")], Path::new("/dst"));
    harness.pump(&mut session);
    assert_eq!(session.last_message(), None);
    assert!(session.last_error().unwrap().starts_with("Couldn't move \"b.txt\""));
}

#[test]
fn test_delete_alias_and_compress_in_current_directory() {
    let fs = InMemoryFileSystem::new();
    fs.add_file("/w/a.txt", 5, 1).add_file("/w/b.txt", 6, 1);
    let mut harness = Harness::inline(fs);
    let mut session = harness.session(1);
    open(&mut harness, &mut session, "/w");

    session.alias_entries(vec![PathBuf::from("/w/a.txt")]);
    harness.pump(&mut session);
    assert_eq!(session.last_message(), Some("Created aliases for 1 item."));

    session.compress_entries(vec![PathBuf::from("/w/a.txt"), PathBuf::from("/w/b.txt")]);
    harness.pump(&mut session);
    assert_eq!(session.last_message(), Some("Compressed 2 items."));

    session.delete_entries(vec![PathBuf::from("/w/b.txt")]);
    harness.pump(&mut session);
    assert_eq!(session.last_message(), Some("Deleted 1 item."));
    assert_eq!(
        names(session.displayed_entries()),
        vec!["a.txt", "a.txt alias", "Archive.zip"]
    );

    session.dismiss_message();
    assert_eq!(session.last_message(), None);
}

#[test]
fn test_operation_without_directory_is_refused() {
    let harness = Harness::inline(InMemoryFileSystem::new());
    let mut session = harness.session(1);
    session.compress_entries(vec![PathBuf::from("/w/a.txt")]);
    assert_eq!(session.last_error(), Some("Open a folder first."));
    assert_eq!(session.operations_in_flight(), 0);
}

// ============================================================================
// Watching
// ============================================================================

#[test]
fn test_watch_follows_current_directory() {
    let mut harness = Harness::inline(tree_fs());
    let mut session = harness.session(1);
    open(&mut harness, &mut session, "/r");
    assert_eq!(session.watched_directory(), Some(Path::new("/r")));
    assert_eq!(harness.fs.active_watches(), 1);

    enter(&mut harness, &mut session, "a");
    assert_eq!(session.watched_directory(), Some(Path::new("/r/a")));
    assert_eq!(harness.fs.active_watches(), 1);
}

#[test]
fn test_watch_is_torn_down_when_load_starts() {
    let queue = Arc::new(QueuedExecutor::default());
    let mut harness = Harness::with_executor(tree_fs(), queue.clone());
    let mut session = harness.session(1);
    session.load_directory(Path::new("/r"));
    queue.run_oldest();
    harness.pump(&mut session);
    assert_eq!(harness.fs.active_watches(), 1);

    session.load_directory(Path::new("/r/a"));
    assert_eq!(harness.fs.active_watches(), 0);
    assert_eq!(session.watched_directory(), None);
}

#[test]
fn test_external_change_refreshes_listing() {
    let mut harness = Harness::inline(tree_fs());
    let mut session = harness.session(1);
    open(&mut harness, &mut session, "/r/a");

    harness.fs.add_file("/r/a/two.txt", 2, 2);
    harness.fs.notify_change("/r/a");
    harness.pump(&mut session);
    assert_eq!(names(session.displayed_entries()), vec!["b", "one.txt", "two.txt"]);
    assert_eq!(session.history().depth(), 1);
}

#[test]
fn test_change_without_difference_emits_nothing() {
    let mut harness = Harness::inline(tree_fs());
    let mut session = harness.session(1);
    open(&mut harness, &mut session, "/r/a");
    harness.sink.clear();

    harness.fs.notify_change("/r/a");
    assert!(harness.pump(&mut session) > 0);
    assert!(harness.sink.events().is_empty());
}

#[test]
fn test_change_from_old_watch_is_ignored() {
    let mut harness = Harness::inline(tree_fs());
    let mut session = harness.session(1);
    open(&mut harness, &mut session, "/r");
    enter(&mut harness, &mut session, "a");
    let calls = harness.fs.list_calls();

    session.handle_message(WorkerMessage::DirectoryChanged {
        pane_id: session.id(),
        watch_generation: 1,
    });
    assert_eq!(harness.fs.list_calls(), calls);
}

#[test]
fn test_watch_failure_is_not_fatal() {
    let fs = scenario_fs();
    fs.set_watches_unavailable(true);
    let mut harness = Harness::inline(fs);
    let mut session = harness.session(1);
    open(&mut harness, &mut session, "/tmp/x");
    assert_eq!(session.status(), SessionStatus::Ready);
    assert_eq!(session.last_error(), None);
    assert_eq!(session.watched_directory(), None);
    assert_eq!(names(session.displayed_entries()), vec!["a.txt", "b.txt", ".hidden"]);

    harness.fs.set_watches_unavailable(false);
    session.refresh();
    harness.pump(&mut session);
    assert_eq!(session.watched_directory(), Some(Path::new("/tmp/x")));
}

#[test]
fn test_deleted_directory_reports_error() {
    let mut harness = Harness::inline(tree_fs());
    let mut session = harness.session(1);
    open(&mut harness, &mut session, "/r/a/b");

    harness.fs.remove("/r/a/b");
    harness.fs.notify_change("/r/a/b");
    harness.pump(&mut session);
    assert_eq!(session.status(), SessionStatus::Error);
    assert_eq!(names(session.displayed_entries()), vec!["c"]);
}

#[test]
fn test_every_mutation_emits_changed_snapshot() {
    let mut harness = Harness::inline(scenario_fs());
    let mut session = harness.session(7);
    open(&mut harness, &mut session, "/tmp/x");
    harness.sink.clear();

    session.set_sort(SortKey::Size, SortDirection::Ascending);
    let events = harness.sink.events();
    assert_eq!(events.len(), 1);
    match &events[0] {
        PaneEvent::Changed { pane_id, snapshot } => {
            assert_eq!(*pane_id, PaneId::new(7));
            assert_eq!(snapshot.sort.key, SortKey::Size);
            assert_eq!(snapshot.current_directory.as_deref(), Some("/tmp/x"));
        }
        other => panic!("unexpected event {:?}", other),
    }
}
