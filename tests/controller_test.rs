mod common;

use std::time::Duration;

use common::{FakeSource, advance, controller, page};
use consult_feed::controller::{FeedOptions, ResponseFeedController};
use consult_feed::error::FeedError;
use consult_feed::orchestrator::FetchStatus;
use consult_feed::view::ActiveTab;

#[tokio::test(start_paused = true)]
async fn test_rapid_filter_changes_coalesce_into_one_request() {
    let source = FakeSource::new();
    let feed = controller(&source);

    feed.set_search_value("b");
    advance(100).await;
    feed.set_search_value("bu");
    advance(100).await;
    feed.set_search_value("bus");
    advance(600).await;

    let queries = source.queries();
    assert_eq!(queries.len(), 1);
    assert!(queries[0].starts_with("searchValue=bus&searchMode=keyword&"));

    source.resolve(0, Ok(page(&["r1", "r2"], true)));
    let snapshot = feed.wait_until_settled().await;
    assert_eq!(snapshot.status, FetchStatus::Idle);
    assert_eq!(snapshot.responses.len(), 2);
    assert_eq!(snapshot.filters.page(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_superseded_response_is_never_applied() {
    let source = FakeSource::new();
    let feed = controller(&source);

    feed.set_search_value("trains");
    advance(600).await;
    feed.set_search_value("buses");
    advance(600).await;
    assert_eq!(source.call_count(), 2);

    // The first request answers late; its generation is gone.
    source.resolve(0, Ok(page(&["stale"], true)));
    advance(1).await;
    assert!(feed.snapshot().responses.is_empty());
    assert!(feed.snapshot().is_loading());

    source.resolve(1, Ok(page(&["fresh"], false)));
    let snapshot = feed.wait_until_settled().await;
    let ids: Vec<_> = snapshot
        .responses
        .iter()
        .map(|r| r.identifier.as_str().to_string())
        .collect();
    assert_eq!(ids, vec!["fresh"]);
    assert_eq!(snapshot.filters.search_value(), "buses");
}

#[tokio::test(start_paused = true)]
async fn test_filter_change_resets_list_and_page() {
    let source = FakeSource::new();
    let feed = controller(&source);

    feed.refresh();
    advance(1).await;
    source.resolve(0, Ok(page(&["r1", "r2"], true)));
    feed.wait_until_settled().await;

    assert!(feed.load_more());
    advance(1).await;
    assert!(source.queries()[1].ends_with("page=2&page_size=2"));
    source.resolve(1, Ok(page(&["r3", "r4"], true)));
    let snapshot = feed.wait_until_settled().await;
    assert_eq!(snapshot.responses.len(), 4);
    assert_eq!(snapshot.filters.page(), 3);

    assert!(feed.set_evidence_rich(true));
    let snapshot = feed.snapshot();
    assert!(snapshot.responses.is_empty());
    assert_eq!(snapshot.filters.page(), 1);
    assert_eq!(snapshot.status, FetchStatus::Loading);
    assert!(snapshot.has_more_pages);

    advance(600).await;
    let query = &source.queries()[2];
    assert!(query.contains("evidenceRich=true"));
    assert!(query.ends_with("page=1&page_size=2"));
}

#[tokio::test(start_paused = true)]
async fn test_load_more_is_noop_when_exhausted() {
    let source = FakeSource::new();
    let feed = controller(&source);

    source.reply(Ok(page(&["only"], false)));
    feed.refresh();
    let snapshot = feed.wait_until_settled().await;
    assert!(!snapshot.has_more_pages);
    assert!(!snapshot.load_more.visible);

    assert!(!feed.load_more());
    advance(600).await;
    assert_eq!(source.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_load_more_is_noop_while_loading() {
    let source = FakeSource::new();
    let feed = controller(&source);

    feed.refresh();
    advance(1).await;
    assert!(!feed.snapshot().load_more.enabled);
    assert!(!feed.load_more());
    assert_eq!(source.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_failed_page_keeps_accumulated_list() {
    let source = FakeSource::new();
    let feed = controller(&source);

    source.reply(Ok(page(&["r1", "r2"], true)));
    feed.refresh();
    feed.wait_until_settled().await;

    source.reply(Err(FeedError::Http {
        status: 500,
        message: "Internal Server Error".to_string(),
    }));
    assert!(feed.load_more());
    let snapshot = feed.wait_until_settled().await;
    assert_eq!(snapshot.status, FetchStatus::Error);
    assert_eq!(snapshot.responses.len(), 2);
    assert!(snapshot.last_error.as_deref().unwrap().contains("HTTP 500"));

    // Retrying asks for the same page again.
    source.reply(Ok(page(&["r3"], false)));
    assert!(feed.load_more());
    let snapshot = feed.wait_until_settled().await;
    assert!(source.queries()[2].ends_with("page=2&page_size=2"));
    assert_eq!(snapshot.responses.len(), 3);
    assert_eq!(snapshot.status, FetchStatus::Idle);
    assert!(snapshot.last_error.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_slow_backend_times_out() {
    let source = FakeSource::new();
    let feed = controller(&source);

    feed.refresh();
    // Nothing resolves the gate, so the clock runs to the request timeout.
    let snapshot = feed.wait_until_settled().await;
    assert_eq!(snapshot.status, FetchStatus::Error);
    assert_eq!(
        snapshot.last_error.as_deref(),
        Some("request timed out after 30s")
    );
}

#[tokio::test(start_paused = true)]
async fn test_focus_theme_switches_tab_and_filters() {
    let source = FakeSource::new();
    let feed = controller(&source);
    feed.add_theme_filter("3".to_string());

    feed.focus_theme("7".to_string());
    let snapshot = feed.snapshot();
    assert_eq!(snapshot.active_tab, ActiveTab::Responses);
    let themes: Vec<_> = snapshot.filters.theme_filters().iter().cloned().collect();
    assert_eq!(themes, vec!["7"]);

    advance(600).await;
    assert_eq!(source.call_count(), 1);
    assert!(source.queries()[0].starts_with("themeFilters=7&"));
}

#[tokio::test(start_paused = true)]
async fn test_cancel_discards_in_flight_request() {
    let source = FakeSource::new();
    let feed = controller(&source);

    feed.refresh();
    advance(1).await;
    feed.cancel();
    assert_eq!(feed.snapshot().status, FetchStatus::Idle);

    source.resolve(0, Ok(page(&["late"], true)));
    advance(1).await;
    assert!(feed.snapshot().responses.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_page_populates_derived_views() {
    let source = FakeSource::new();
    let feed = controller(&source);

    let mut first = page(&["r1"], true);
    first
        .demographic_aggregations
        .entry("country".to_string())
        .or_default()
        .insert("wales".to_string(), 4);
    first
        .demographic_options
        .insert("country".to_string(), vec!["wales".to_string()]);
    source.reply(Ok(first));

    feed.refresh();
    let snapshot = feed.wait_until_settled().await;
    assert_eq!(snapshot.themes.len(), 1);
    assert_eq!(snapshot.themes[0].title, "Cost");
    assert_eq!(snapshot.themes[0].description, "Ticket prices");
    assert_eq!(snapshot.demo_data["country"]["wales"], 4);
    assert_eq!(snapshot.demo_options["country"], vec!["wales"]);
    assert_eq!(snapshot.filtered_total, 6);
    assert_eq!(snapshot.respondents_total, 10);
}

#[tokio::test(start_paused = true)]
async fn test_subscribers_see_loading_then_idle() {
    let source = FakeSource::new();
    let feed = ResponseFeedController::new(
        source.clone(),
        "c",
        "q",
        FeedOptions {
            debounce: Duration::ZERO,
            ..common::options()
        },
    );
    let mut rx = feed.subscribe();

    feed.set_search_mode(consult_feed::filter::SearchMode::Semantic);
    rx.changed().await.unwrap();
    assert!(rx.borrow_and_update().is_loading());

    advance(1).await;
    source.resolve(0, Ok(page(&["r1"], false)));
    rx.changed().await.unwrap();
    assert_eq!(rx.borrow().status, FetchStatus::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_demographic_filter_sends_earliest_selection() {
    let source = FakeSource::new();
    let feed = controller(&source);

    feed.toggle_demo_filter("country", "wales");
    feed.toggle_demo_filter("country", "england");
    advance(600).await;

    assert_eq!(source.call_count(), 1);
    let query = &source.queries()[0];
    assert!(query.contains("demoFilters=country%3Awales&"));
    assert!(!query.contains("england"));
}
