//! Rotation engine behaviour on virtual time
#![forbid(unsafe_code)]

mod common;

use async_trait::async_trait;
use boardctrl_client::{ClientResult, CredentialStore, SlideSource};
use boardctrl_core::{BoardId, Slide, SlideId};
use boardctrl_rotation::mock::{RecordingSink, StaticSlideSource};
use boardctrl_rotation::{
    NotificationKind, PlaybackFailurePolicy, PresentOutcome, RotationError, RotationHandle,
    SessionEnd,
};
use common::{BOARD, Harness, slide, units};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::{Instant, sleep};

fn started(outcome: PresentOutcome) -> RotationHandle {
    match outcome {
        PresentOutcome::Started(handle) => handle,
        other => panic!("expected a running session, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_rotation_skips_inactive_and_wraps() {
    let source = Arc::new(StaticSlideSource::new(vec![
        slide(1, "https://a.test", 1, true),
        slide(2, "https://b.test", 2, false),
        slide(3, "https://c.test", 3, true),
    ]));
    let harness = Harness::new(source, RecordingSink::new());
    let start = Instant::now();

    let handle = started(harness.presenter.present(BOARD).await.unwrap());
    assert_eq!(harness.sink.shown_urls(), vec!["https://a.test"]);
    assert_eq!(harness.sink.opens()[0].at, start);

    sleep(units(4) + Duration::from_millis(500)).await;

    let navigations = harness.sink.navigations();
    let shown: Vec<_> = navigations.iter().map(|n| n.url.as_str()).collect();
    assert_eq!(shown, vec!["https://c.test", "https://a.test"]);
    assert_eq!(navigations[0].at - start, units(1));
    assert_eq!(navigations[1].at - start, units(4));

    let summary = handle.stop().await.unwrap();
    assert_eq!(summary.board_id, BOARD);
    assert_eq!(summary.navigations, 2);
    assert_eq!(summary.end, SessionEnd::Stopped);
}

#[tokio::test(start_paused = true)]
async fn test_wait_matches_previous_slide_duration() {
    let source = Arc::new(StaticSlideSource::new(vec![
        slide(1, "https://one.test", 2, true),
        slide(2, "https://two.test", 5, true),
        slide(3, "https://three.test", 1, true),
    ]));
    let harness = Harness::new(source, RecordingSink::new());
    let start = Instant::now();

    let handle = started(harness.presenter.present(BOARD).await.unwrap());
    sleep(units(16) + Duration::from_millis(1)).await;
    handle.stop().await.unwrap();

    let offsets: Vec<_> = harness
        .sink
        .navigations()
        .iter()
        .map(|n| n.at - start)
        .collect();
    // 2, +5, +1, then the cycle again: 10, 15, 16
    assert_eq!(
        offsets,
        vec![units(2), units(7), units(8), units(10), units(15), units(16)]
    );
}

#[tokio::test(start_paused = true)]
async fn test_single_surface_for_long_sessions() {
    let source = Arc::new(StaticSlideSource::new(vec![
        slide(1, "https://a.test", 1, true),
        slide(2, "https://b.test", 1, true),
    ]));
    let harness = Harness::new(source.clone(), RecordingSink::new());

    let handle = started(harness.presenter.present(BOARD).await.unwrap());
    sleep(units(50) + Duration::from_millis(1)).await;
    let summary = handle.stop().await.unwrap();

    assert_eq!(harness.sink.opens().len(), 1);
    assert_eq!(summary.navigations, 50);
    assert_eq!(source.calls(), 1);

    let shown = harness.sink.shown_urls();
    for (i, url) in shown.iter().enumerate() {
        let expected = if i % 2 == 0 { "https://a.test" } else { "https://b.test" };
        assert_eq!(url, expected);
    }
}

#[tokio::test(start_paused = true)]
async fn test_no_active_slides() {
    let source = Arc::new(StaticSlideSource::new(vec![
        slide(1, "https://a.test", 1, false),
        slide(2, "https://b.test", 1, false),
    ]));
    let harness = Harness::new(source, RecordingSink::new());

    let outcome = harness.presenter.present(BOARD).await.unwrap();
    assert!(matches!(outcome, PresentOutcome::NoActiveSlides));
    assert!(harness.sink.opens().is_empty());
    assert_eq!(
        harness.messages(),
        vec!["No active slides available for this board"]
    );
}

#[tokio::test(start_paused = true)]
async fn test_every_active_slide_is_presented() {
    let source = Arc::new(StaticSlideSource::new(vec![
        slide(1, "example.com/menu", 1, true),
        slide(2, "https://long.test", 20_000, true),
        slide(3, "https://zero.test", 0, true),
    ]));
    let harness = Harness::new(source, RecordingSink::new());

    let handle = started(harness.presenter.present(BOARD).await.unwrap());
    assert_eq!(harness.sink.opens()[0].url, "https://example.com/menu");
    assert!(harness.messages().is_empty());

    sleep(units(1) + Duration::from_millis(500)).await;
    assert_eq!(
        harness.sink.shown_urls(),
        vec!["https://example.com/menu", "https://long.test"]
    );
    handle.stop().await.unwrap();

    let source = Arc::new(StaticSlideSource::new(vec![
        slide(1, "https://zero.test", 0, true),
        slide(2, "https://b.test", 1, true),
    ]));
    let harness = Harness::new(source, RecordingSink::new());
    let handle = started(harness.presenter.present(BOARD).await.unwrap());
    let opened = Instant::now();

    // A zero duration is shown for one unit
    sleep(units(1) + Duration::from_millis(500)).await;
    let navigations = harness.sink.navigations();
    assert_eq!(navigations.len(), 1);
    assert_eq!(navigations[0].url, "https://b.test");
    assert_eq!(navigations[0].at - opened, units(1));
    handle.stop().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_empty_board() {
    let harness = Harness::new(
        Arc::new(StaticSlideSource::new(Vec::new())),
        RecordingSink::new(),
    );

    let outcome = harness.presenter.present(BOARD).await.unwrap();
    assert!(matches!(outcome, PresentOutcome::NoSlides));
    assert!(harness.sink.opens().is_empty());
    assert_eq!(harness.messages(), vec!["No slides available for this board"]);

    let notification = &harness.notifications.active()[0];
    assert_eq!(notification.kind, NotificationKind::Error);
}

#[tokio::test(start_paused = true)]
async fn test_unauthorized_clears_credential_and_redirects_later() {
    let harness = Harness::new(
        Arc::new(StaticSlideSource::unauthorized()),
        RecordingSink::new(),
    );
    let start = Instant::now();

    let result = harness.presenter.present(BOARD).await;
    assert!(matches!(result, Err(RotationError::AuthExpired)));
    assert!(harness.credentials.load().await.unwrap().is_none());
    assert!(harness.messages()[0].starts_with("Session expired"));
    assert!(harness.redirect.fired().is_empty());

    sleep(Duration::from_millis(4_900)).await;
    assert!(harness.redirect.fired().is_empty());

    assert!(harness.presenter.await_redirect().await);
    assert_eq!(harness.redirect.fired(), vec![start + Duration::from_secs(5)]);
    assert!(harness.sink.opens().is_empty());
    assert!(!harness.presenter.await_redirect().await);
}

#[tokio::test(start_paused = true)]
async fn test_missing_credential_is_treated_as_expired() {
    let harness = Harness::new(
        Arc::new(StaticSlideSource::not_authenticated()),
        RecordingSink::new(),
    );

    let result = harness.presenter.present(BOARD).await;
    assert!(matches!(result, Err(RotationError::AuthExpired)));
    assert!(harness.presenter.await_redirect().await);
    assert_eq!(harness.redirect.fired().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_listing_failure_reports_slides_not_found() {
    let harness = Harness::new(
        Arc::new(StaticSlideSource::unavailable()),
        RecordingSink::new(),
    );

    let result = harness.presenter.present(BOARD).await;
    assert!(matches!(
        result,
        Err(RotationError::SlidesUnavailable { board_id: BOARD, .. })
    ));
    assert_eq!(harness.messages(), vec!["Slides not found"]);
    assert!(harness.credentials.load().await.unwrap().is_some());
    assert!(!harness.presenter.await_redirect().await);
}

#[tokio::test(start_paused = true)]
async fn test_blocked_surface_is_fatal_for_the_request() {
    let source = Arc::new(StaticSlideSource::new(vec![slide(1, "https://a.test", 1, true)]));
    let harness = Harness::new(source, RecordingSink::new().refusing_open("popup blocked"));

    let result = harness.presenter.present(BOARD).await;
    assert!(matches!(result, Err(RotationError::SurfaceUnavailable { .. })));
    assert!(harness.sink.opens().is_empty());
    assert!(harness.messages()[0].contains("popup blocked"));
}

#[tokio::test(start_paused = true)]
async fn test_stop_prevents_further_navigation() {
    let source = Arc::new(StaticSlideSource::new(vec![
        slide(1, "https://a.test", 1, true),
        slide(2, "https://b.test", 1, true),
    ]));
    let harness = Harness::new(source, RecordingSink::new());

    let handle = started(harness.presenter.present(BOARD).await.unwrap());
    sleep(units(1) + Duration::from_millis(500)).await;
    assert!(!handle.is_finished());

    let summary = handle.stop().await.unwrap();
    assert_eq!(summary.navigations, 1);
    assert_eq!(summary.end, SessionEnd::Stopped);

    sleep(units(100)).await;
    assert_eq!(harness.sink.navigations().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_stop_at_transition_deadline_is_final() {
    let source = Arc::new(StaticSlideSource::new(vec![
        slide(1, "https://a.test", 1, true),
        slide(2, "https://b.test", 1, true),
    ]));
    let harness = Harness::new(source, RecordingSink::new());

    let handle = started(harness.presenter.present(BOARD).await.unwrap());
    // Let the session register its first wait, then jump exactly to the deadline
    tokio::task::yield_now().await;
    tokio::time::advance(units(1)).await;

    let summary = handle.stop().await.unwrap();
    assert_eq!(summary.end, SessionEnd::Stopped);

    // Whatever was counted at stop time is all the surface ever saw
    sleep(units(10)).await;
    assert_eq!(
        harness.sink.navigations().len(),
        usize::try_from(summary.navigations).unwrap()
    );
}

#[tokio::test(start_paused = true)]
async fn test_dropping_handle_cancels_session() {
    let source = Arc::new(StaticSlideSource::new(vec![
        slide(1, "https://a.test", 1, true),
        slide(2, "https://b.test", 1, true),
    ]));
    let harness = Harness::new(source, RecordingSink::new());

    let handle = started(harness.presenter.present(BOARD).await.unwrap());
    sleep(units(2) + Duration::from_millis(500)).await;
    drop(handle);

    sleep(units(20)).await;
    assert_eq!(harness.sink.navigations().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_state_follows_transitions() {
    let source = Arc::new(StaticSlideSource::new(vec![
        slide(1, "https://a.test", 1, true),
        slide(2, "https://b.test", 1, true),
    ]));
    let harness = Harness::new(source, RecordingSink::new());

    let handle = started(harness.presenter.present(BOARD).await.unwrap());
    assert_eq!(handle.board_id(), BOARD);
    assert_eq!(handle.state().index, 0);
    assert_eq!(handle.state().target, "https://a.test");

    let mut state = handle.subscribe();
    state.changed().await.unwrap();
    let current = state.borrow_and_update().clone();
    assert_eq!(current.index, 1);
    assert_eq!(current.target, "https://b.test");
    assert_eq!(current.navigations, 1);

    state.changed().await.unwrap();
    assert_eq!(state.borrow().index, 0);

    handle.stop().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_playback_failure_continues_by_default() {
    let source = Arc::new(StaticSlideSource::new(vec![
        slide(1, "https://a.test", 1, true),
        slide(2, "https://broken.test", 2, true),
        slide(3, "https://c.test", 1, true),
    ]));
    let harness = Harness::new(source, RecordingSink::new().failing_on("https://broken.test"));
    let start = Instant::now();

    let handle = started(harness.presenter.present(BOARD).await.unwrap());
    sleep(units(1) + Duration::from_millis(500)).await;

    // The cursor moved on, the surface still shows the first slide
    let state = handle.state();
    assert_eq!(state.index, 1);
    assert_eq!(state.slide_id, SlideId(1));
    assert_eq!(state.target, "https://a.test");
    assert_eq!(state.failures, 1);
    assert_eq!(state.navigations, 0);
    assert_eq!(harness.sink.shown_urls(), vec!["https://a.test"]);

    sleep(units(3)).await;

    let failed = harness.sink.failed();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].at - start, units(1));

    // The failed slide keeps its place and its duration
    let navigations = harness.sink.navigations();
    let shown: Vec<_> = navigations.iter().map(|n| n.url.as_str()).collect();
    assert_eq!(shown, vec!["https://c.test", "https://a.test"]);
    assert_eq!(navigations[0].at - start, units(3));
    assert_eq!(handle.state().failures, 1);
    assert_eq!(handle.state().target, "https://a.test");
    assert!(
        harness
            .messages()
            .iter()
            .any(|m| m.contains("could not be displayed"))
    );

    let summary = handle.stop().await.unwrap();
    assert_eq!(summary.failures, 1);
    assert_eq!(summary.navigations, 2);
}

#[tokio::test(start_paused = true)]
async fn test_playback_failure_aborts_under_abort_policy() {
    let source = Arc::new(StaticSlideSource::new(vec![
        slide(1, "https://a.test", 1, true),
        slide(2, "https://broken.test", 1, true),
    ]));
    let harness = Harness::with_policy(
        source,
        RecordingSink::new().failing_on("https://broken.test"),
        PlaybackFailurePolicy::Abort,
    );

    let handle = started(harness.presenter.present(BOARD).await.unwrap());
    let summary = handle.wait().await.unwrap();

    assert!(matches!(summary.end, SessionEnd::Aborted { .. }));
    assert_eq!(summary.failures, 1);
    assert_eq!(summary.navigations, 0);

    sleep(units(10)).await;
    assert_eq!(harness.sink.failed().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_closed_surface_ends_session() {
    let source = Arc::new(StaticSlideSource::new(vec![
        slide(1, "https://a.test", 1, true),
        slide(2, "https://b.test", 1, true),
    ]));
    let harness = Harness::new(source, RecordingSink::new().closing_after(2));

    let handle = started(harness.presenter.present(BOARD).await.unwrap());
    let summary = handle.wait().await.unwrap();

    assert_eq!(summary.end, SessionEnd::SurfaceClosed);
    assert_eq!(summary.navigations, 2);
    assert_eq!(summary.failures, 0);
}

/// Serves one list on the first request and another one afterwards
struct EditedSource {
    before: Vec<Slide>,
    after: Vec<Slide>,
    calls: AtomicUsize,
}

#[async_trait]
impl SlideSource for EditedSource {
    async fn list_slides(&self, _board: BoardId) -> ClientResult<Vec<Slide>> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            Ok(self.before.clone())
        } else {
            Ok(self.after.clone())
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_session_uses_snapshot() {
    let source = Arc::new(EditedSource {
        before: vec![
            slide(1, "https://a.test", 1, true),
            slide(2, "https://b.test", 1, false),
            slide(3, "https://c.test", 1, true),
        ],
        // Toggled in the console once the board is on screen
        after: vec![
            slide(1, "https://a.test", 1, false),
            slide(2, "https://b.test", 1, true),
            slide(3, "https://c.test", 1, true),
        ],
        calls: AtomicUsize::new(0),
    });
    let harness = Harness::new(source.clone(), RecordingSink::new());

    let handle = started(harness.presenter.present(BOARD).await.unwrap());
    assert_eq!(
        source.list_slides(BOARD).await.unwrap()[1].target,
        "https://b.test"
    );

    sleep(units(4) + Duration::from_millis(500)).await;
    handle.stop().await.unwrap();

    assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    assert_eq!(
        harness.sink.shown_urls(),
        vec![
            "https://a.test",
            "https://c.test",
            "https://a.test",
            "https://c.test",
            "https://a.test",
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_preview_normalizes_url() {
    let harness = Harness::new(
        Arc::new(StaticSlideSource::new(Vec::new())),
        RecordingSink::new(),
    );

    let surface = harness.presenter.preview("example.com/menu").await.unwrap();
    assert_eq!(surface.current(), "https://example.com/menu");
    assert_eq!(harness.sink.opens().len(), 1);

    let result = harness.presenter.preview("   ").await;
    assert!(matches!(result, Err(RotationError::Core(_))));
    assert_eq!(harness.sink.opens().len(), 1);
}
