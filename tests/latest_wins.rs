//! Ordering and cancellation: debounce, latest-wins, the cleared transient,
//! and error recovery.
//!
//! All tests run on a paused clock; responses are released by the test.
//!
//! Run with: `cargo test --test latest_wins`

mod common;

use common::{config, filters, ScriptedSource};
use connlist::{ConnectionEngine, ConnectionView, FetchArgs, Page, ScalarValue};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_test::assert_ok;

const DEBOUNCE: Duration = Duration::from_millis(200);

fn label(args: &FetchArgs) -> String {
    let state = match args.filter.get("state") {
        Some(ScalarValue::String(s)) => s.as_str(),
        _ => "ANY",
    };
    format!("{}|{}", args.query_text(), state)
}

// === Scenario: "x" response arrives after "xy" response ===
#[tokio::test(start_paused = true)]
async fn late_response_for_superseded_search_is_ignored() {
    let source = ScriptedSource::<String>::new();
    let engine = ConnectionEngine::new(source.as_source(), config(10)).unwrap();
    source.wait_for_calls(1).await;
    source.respond(0, Page::new(vec!["initial".to_string()]).with_known_total(1));
    engine.settled().await;

    engine.set_search_text("x");
    source.wait_for_calls(2).await;
    assert_eq!(source.args(1).query.as_deref(), Some("x"));

    engine.set_search_text("xy");
    source.wait_for_calls(3).await;
    assert_eq!(source.args(2).query.as_deref(), Some("xy"));

    source.respond(2, Page::new(vec!["xy-result".to_string()]).with_known_total(1));
    source.respond(1, Page::new(vec!["x-result".to_string()]).with_known_total(1));

    let state = engine.settled().await;
    assert_eq!(state.items, vec!["xy-result".to_string()]);
    assert_eq!(state.query.search_text, "xy");

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(engine.state().items, vec!["xy-result".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn typing_is_debounced_into_one_fetch() {
    let source = ScriptedSource::<String>::new();
    let engine = ConnectionEngine::new(source.as_source(), config(10)).unwrap();
    source.wait_for_calls(1).await;
    source.respond(0, Page::new(vec![]).with_known_total(0));
    engine.settled().await;

    for text in ["a", "ab", "abc"] {
        engine.set_search_text(text);
        let state = engine.state();
        assert_eq!(state.search_input, text, "display text updates immediately");
        assert!(state.search_pending);
        assert_eq!(state.query.search_text, "");
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    assert_eq!(source.call_count(), 1);

    source.wait_for_calls(2).await;
    assert_eq!(source.call_count(), 2);
    assert_eq!(source.args(1).query.as_deref(), Some("abc"));
    assert_eq!(source.args(1).after, None);
}

#[tokio::test(start_paused = true)]
async fn retyping_committed_text_does_not_fetch() {
    let source = ScriptedSource::<String>::new();
    let engine = ConnectionEngine::new(source.as_source(), config(10)).unwrap();
    source.wait_for_calls(1).await;
    source.respond(0, Page::new(vec![]).with_known_total(0));
    engine.settled().await;

    engine.set_search_text("q");
    source.wait_for_calls(2).await;
    source.respond(1, Page::new(vec![]).with_known_total(0));
    engine.settled().await;

    engine.set_search_text("qq");
    engine.set_search_text("q");
    let state = engine.settled().await;
    assert!(!state.search_pending);
    assert_eq!(source.call_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn filter_change_refreshes_with_filter_args() {
    let source = ScriptedSource::<String>::new();
    let cfg = config(10).with_filters(filters());
    let engine = ConnectionEngine::new(source.as_source(), cfg).unwrap();
    source.wait_for_calls(1).await;
    assert!(source.args(0).filter.is_empty(), "default filter has no args");
    source.respond(0, Page::new(vec!["any".to_string()]).with_known_total(1));
    engine.settled().await;

    engine.select_filter("all").unwrap();
    tokio::task::yield_now().await;
    assert_eq!(source.call_count(), 1, "reselecting the active filter is a no-op");

    assert_ok!(engine.select_filter("open"));
    source.wait_for_calls(2).await;
    assert_eq!(label(&source.args(1)), "|OPEN");

    assert_ok!(engine.select_filter("closed"));
    source.wait_for_calls(3).await;

    source.respond(1, Page::new(vec!["open".to_string()]).with_known_total(1));
    source.respond(2, Page::new(vec!["closed".to_string()]).with_known_total(1));
    let state = engine.settled().await;
    assert_eq!(state.items, vec!["closed".to_string()]);
    assert_eq!(state.query.active_filter_id.as_deref(), Some("closed"));
}

// === Property: only the most recent effective query is ever applied ===
#[tokio::test(start_paused = true)]
async fn random_interleavings_apply_only_latest_query() {
    for seed in 0..20u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let source = ScriptedSource::<String>::new();
        let cfg = config(10).with_filters(filters());
        let engine = ConnectionEngine::new(source.as_source(), cfg).unwrap();

        let mut expected_text = String::new();
        let mut expected_filter = "all";
        for _ in 0..8 {
            match rng.gen_range(0..3) {
                0 => {
                    let id = *["all", "open", "closed"].choose(&mut rng).unwrap();
                    engine.select_filter(id).unwrap();
                    expected_filter = id;
                }
                1 => {
                    expected_text = ["", "a", "ab", "b"].choose(&mut rng).unwrap().to_string();
                    engine.set_search_text(expected_text.clone());
                    tokio::time::sleep(DEBOUNCE + Duration::from_millis(1)).await;
                }
                _ => {
                    let mut pending = source.pending();
                    pending.shuffle(&mut rng);
                    for i in pending.into_iter().take(2) {
                        source.respond(i, Page::new(vec![label(&source.args(i))]).with_known_total(1));
                    }
                }
            }
            tokio::task::yield_now().await;
        }

        loop {
            let mut pending = source.pending();
            pending.shuffle(&mut rng);
            for i in pending {
                source.respond(i, Page::new(vec![label(&source.args(i))]).with_known_total(1));
            }
            tokio::task::yield_now().await;
            if engine.state().is_settled() && source.pending().is_empty() {
                break;
            }
        }

        let state = engine.settled().await;
        let state_label = match expected_filter {
            "open" => "OPEN",
            "closed" => "CLOSED",
            _ => "ANY",
        };
        assert_eq!(
            state.items,
            vec![format!("{}|{}", expected_text, state_label)],
            "seed {}",
            seed
        );
    }
}

// === Cleared transient: only for slow refreshes ===
#[tokio::test(start_paused = true)]
async fn slow_refresh_clears_after_delay() {
    let source = ScriptedSource::<char>::new();
    let engine = ConnectionEngine::new(source.as_source(), config(10)).unwrap();
    source.wait_for_calls(1).await;
    source.respond(0, Page::new(vec!['a']).with_known_total(1));
    engine.settled().await;

    engine.refresh();
    source.wait_for_calls(2).await;
    let state = engine.state();
    assert!(state.loading);
    assert!(!state.cleared);
    assert_eq!(state.visible_items(), Some(&['a'][..]));

    tokio::time::sleep(Duration::from_millis(249)).await;
    assert!(!engine.state().cleared);

    tokio::time::sleep(Duration::from_millis(2)).await;
    let state = engine.state();
    assert!(state.cleared);
    assert_eq!(state.visible_items(), None);

    source.respond(1, Page::new(vec!['b']).with_known_total(1));
    let state = engine.settled().await;
    assert!(!state.cleared);
    assert_eq!(state.visible_items(), Some(&['b'][..]));
}

#[tokio::test(start_paused = true)]
async fn fast_refresh_never_clears() {
    let source = ScriptedSource::<char>::new();
    let engine = ConnectionEngine::new(source.as_source(), config(10)).unwrap();
    source.wait_for_calls(1).await;
    source.respond(0, Page::new(vec!['a']).with_known_total(1));
    engine.settled().await;

    engine.refresh();
    source.wait_for_calls(2).await;
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(!engine.state().cleared);
    source.respond(1, Page::new(vec!['b']).with_known_total(1));
    engine.settled().await;

    // The clear timer died with the fetch.
    tokio::time::sleep(Duration::from_secs(1)).await;
    let state = engine.state();
    assert!(!state.cleared);
    assert_eq!(state.visible_items(), Some(&['b'][..]));
}

// === Errors ===
#[tokio::test(start_paused = true)]
async fn fetch_error_keeps_previous_items() {
    let source = ScriptedSource::<char>::new();
    let engine = ConnectionEngine::new(source.as_source(), config(10)).unwrap();
    source.wait_for_calls(1).await;
    source.respond(0, Page::new(vec!['a', 'b']).with_known_total(2));
    engine.settled().await;

    engine.refresh();
    source.wait_for_calls(2).await;
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(engine.state().cleared);

    source.fail(1, "connection reset");
    let state = engine.settled().await;
    assert_eq!(state.error.as_deref(), Some("request failed: connection reset"));
    assert!(!state.loading);
    assert_eq!(state.visible_items(), Some(&['a', 'b'][..]));

    // No automatic retry; the next action retries and clears the error.
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(source.call_count(), 2);

    engine.refresh();
    source.wait_for_calls(3).await;
    source.respond(2, Page::new(vec!['c']).with_known_total(1));
    let state = engine.settled().await;
    assert_eq!(state.error, None);
    assert_eq!(state.items, vec!['c']);
}

#[tokio::test(start_paused = true)]
async fn partial_page_error_surfaces_with_items() {
    let source = ScriptedSource::<char>::new();
    let engine = ConnectionEngine::new(source.as_source(), config(10)).unwrap();
    source.wait_for_calls(1).await;
    source.respond(
        0,
        Page::new(vec!['a'])
            .with_known_total(1)
            .with_error("some repositories timed out"),
    );

    let state = engine.settled().await;
    assert_eq!(state.items, vec!['a']);
    assert_eq!(state.error, None);
    assert_eq!(state.errors(), vec!["some repositories timed out"]);
}

#[tokio::test(start_paused = true)]
async fn failed_refresh_blocks_show_more_across_queries() {
    let source = ScriptedSource::<String>::new();
    let cfg = config(2).with_cursor_paging(true);
    let engine = ConnectionEngine::new(source.as_source(), cfg.clone()).unwrap();
    source.wait_for_calls(1).await;
    source.respond(
        0,
        Page::new(vec!["x1".to_string(), "x2".to_string()])
            .with_page_info(true, Some("x-cursor".into())),
    );
    engine.settled().await;

    engine.set_search_text("y");
    source.wait_for_calls(2).await;
    source.fail(1, "timeout");
    let state = engine.settled().await;

    // The old query's items stay up, but cannot be continued.
    assert_eq!(state.items, vec!["x1".to_string(), "x2".to_string()]);
    assert_eq!(state.query.search_text, "y");
    assert!(!state.has_next_page);
    assert!(!ConnectionView::new(&state, &cfg).show_more);
    assert!(!engine.request_more());
    tokio::task::yield_now().await;
    assert_eq!(source.call_count(), 2);

    // A successful refresh for "y" makes paging available again.
    engine.refresh();
    source.wait_for_calls(3).await;
    assert_eq!(source.args(2).after, None);
    source.respond(
        2,
        Page::new(vec!["y1".to_string(), "y2".to_string()])
            .with_page_info(true, Some("y-cursor".into())),
    );
    engine.settled().await;

    assert!(engine.request_more());
    source.wait_for_calls(4).await;
    let args = source.args(3);
    assert_eq!(args.query.as_deref(), Some("y"));
    assert_eq!(args.after.as_deref(), Some("y-cursor"));
    source.respond(3, Page::new(vec!["y3".to_string()]).with_page_info(false, None));
    assert_eq!(
        engine.settled().await.items,
        vec!["y1".to_string(), "y2".to_string(), "y3".to_string()]
    );
}

#[tokio::test(start_paused = true)]
async fn refresh_supersedes_in_flight_append() {
    let source = ScriptedSource::<char>::new();
    let engine =
        ConnectionEngine::new(source.as_source(), config(2).with_cursor_paging(true)).unwrap();
    source.wait_for_calls(1).await;
    source.respond(0, Page::new(vec!['a', 'b']).with_page_info(true, Some("2".into())));
    engine.settled().await;

    assert!(engine.request_more());
    source.wait_for_calls(2).await;
    assert_eq!(source.args(1).after.as_deref(), Some("2"));

    engine.refresh();
    source.wait_for_calls(3).await;
    assert_eq!(source.args(2).after, None);

    source.respond(2, Page::new(vec!['r', 's']).with_page_info(true, Some("2".into())));
    source.respond(1, Page::new(vec!['c', 'd']).with_page_info(false, Some("4".into())));
    let state = engine.settled().await;
    assert_eq!(state.items, vec!['r', 's']);
    assert!(state.has_next_page);

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(engine.state().items, vec!['r', 's']);
}

// === External refresh signals ===
#[tokio::test(start_paused = true)]
async fn updates_stream_forces_refresh() {
    let source = ScriptedSource::<char>::new();
    let cfg = config(2).with_cursor_paging(true);
    let engine = ConnectionEngine::new(source.as_source(), cfg).unwrap();
    let (tx, rx) = mpsc::channel(4);
    let forwarder = engine.attach_updates(rx);

    source.wait_for_calls(1).await;
    source.respond(0, Page::new(vec!['a', 'b']).with_page_info(true, Some("2".into())));
    engine.settled().await;
    assert!(engine.request_more());
    source.wait_for_calls(2).await;
    source.respond(1, Page::new(vec!['c', 'd']).with_page_info(true, Some("4".into())));
    assert_eq!(engine.settled().await.items.len(), 4);

    tx.send(()).await.unwrap();
    source.wait_for_calls(3).await;
    assert_eq!(source.args(2).after, None, "refresh starts over");
    source.respond(2, Page::new(vec!['z']).with_page_info(false, None));
    assert_eq!(engine.settled().await.items, vec!['z']);

    drop(tx);
    forwarder.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn update_key_refreshes_only_on_change() {
    let source = ScriptedSource::<char>::new();
    let engine = ConnectionEngine::new(source.as_source(), config(2)).unwrap();
    source.wait_for_calls(1).await;
    source.respond(0, Page::new(vec!['a']).with_known_total(1));
    engine.settled().await;

    engine.set_update_key(Some("v1".into()));
    source.wait_for_calls(2).await;
    source.respond(1, Page::new(vec!['b']).with_known_total(1));
    engine.settled().await;

    engine.set_update_key(Some("v1".into()));
    tokio::task::yield_now().await;
    assert_eq!(source.call_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn dropping_engine_cancels_in_flight_fetch() {
    let source = ScriptedSource::<char>::new();
    let engine = ConnectionEngine::new(source.as_source(), config(2)).unwrap();
    source.wait_for_calls(1).await;
    assert!(std::sync::Arc::strong_count(&source) > 1);

    drop(engine);
    tokio::time::sleep(Duration::from_secs(1)).await;
    // Neither the engine nor the aborted fetch holds the source any more.
    assert_eq!(std::sync::Arc::strong_count(&source), 1);
}
