//! Integration tests for presenting and closing overlays
//!
//! Covers the lifecycle against a host page that misbehaves: pages still
//! loading, scripts removing our nodes, and bodies being swapped out.

use std::time::Duration;

use super::common::fixtures::{close_counter, in_body, paragraphs, Probe};
use devtools_ext::overlay::{CONTENT_CLASS, HANDLE_ATTRIBUTE, MAX_Z_INDEX, OVERLAY_ID, THEME_CLASS};
use devtools_ext::{HostDocument, MemoryDocument, OverlayManager, Theme};
use tokio::task::LocalSet;
use tokio::time::sleep;

const TICK: Duration = Duration::from_millis(10);

fn manager(doc: &MemoryDocument) -> OverlayManager<MemoryDocument> {
    OverlayManager::new(doc.clone()).with_poll_interval(TICK)
}

#[test]
fn test_presented_overlay_structure() {
    let doc = MemoryDocument::new();
    let (probe, log) = Probe::recording();

    let handle = manager(&doc)
        .with_theme(Theme::Dark)
        .present(probe, "hello".to_string(), None)
        .unwrap();

    let container = *handle.container();
    assert!(in_body(&doc, container));
    assert_eq!(doc.attribute(container, "id").as_deref(), Some(OVERLAY_ID));
    assert_eq!(
        doc.attribute(container, HANDLE_ATTRIBUTE),
        Some(handle.id().to_string())
    );
    let style = doc.attribute(container, "style").unwrap();
    assert!(style.contains(&format!("z-index: {MAX_Z_INDEX}")));

    let mount = *handle.mount_point();
    assert_eq!(doc.children(container), vec![mount]);
    assert_eq!(doc.attribute(mount, "class").as_deref(), Some(CONTENT_CLASS));

    let themed = doc.elements_by_class(THEME_CLASS);
    assert_eq!(themed.len(), 1);
    assert_eq!(doc.attribute(themed[0], "data-theme").as_deref(), Some("dark"));

    assert_eq!(doc.tag_name(*handle.style_tag()), "style");
    assert_eq!(doc.parent_node(handle.style_tag()), doc.head());
    assert_eq!(paragraphs(&doc), vec!["hello".to_string()]);
    assert_eq!(log.renders.get(), 1);
}

#[test]
fn test_close_is_idempotent_from_every_path() {
    let doc = MemoryDocument::new();
    let (probe, log) = Probe::recording();
    let (closed, on_close) = close_counter();

    let handle = manager(&doc)
        .present(probe, "x".to_string(), Some(on_close))
        .unwrap();

    // Component-initiated, then owner-initiated, then the component again
    let from_component = log.close.borrow().clone().unwrap();
    from_component.call();
    handle.close();
    from_component.call();

    assert!(handle.is_closed());
    assert_eq!(closed.get(), 1);
    assert_eq!(log.unmounts.get(), 1);
    assert!(doc.elements_by_id(OVERLAY_ID).is_empty());
    assert!(doc.elements_by_tag("style").is_empty());
    assert!(paragraphs(&doc).is_empty());
}

#[test]
fn test_overlays_are_independent() {
    let doc = MemoryDocument::new();
    let manager = manager(&doc);
    let (first_probe, _) = Probe::recording();
    let (second_probe, _) = Probe::recording();

    let first = manager.present(first_probe, "one".to_string(), None).unwrap();
    let second = manager.present(second_probe, "two".to_string(), None).unwrap();

    assert_ne!(first.id(), second.id());
    assert_eq!(doc.elements_by_id(OVERLAY_ID).len(), 2);

    first.close();

    assert!(!second.is_closed());
    assert!(second.is_attached());
    assert_eq!(doc.elements_by_id(OVERLAY_ID), vec![*second.container()]);
    assert_eq!(paragraphs(&doc), vec!["two".to_string()]);
    assert_eq!(doc.elements_by_tag("style"), vec![*second.style_tag()]);
}

#[test]
fn test_close_tolerates_host_removing_nodes() {
    let doc = MemoryDocument::new();
    let (probe, log) = Probe::recording();
    let (closed, on_close) = close_counter();
    let handle = manager(&doc)
        .present(probe, "x".to_string(), Some(on_close))
        .unwrap();

    // A host script rips our nodes out first
    assert!(doc.detach(handle.container()));
    assert!(doc.detach(handle.style_tag()));

    handle.close();

    assert_eq!(closed.get(), 1);
    assert_eq!(log.unmounts.get(), 1);
    assert!(doc.elements_by_id(OVERLAY_ID).is_empty());
}

#[test]
fn test_close_after_host_replaces_body() {
    let doc = MemoryDocument::new();
    let (probe, _) = Probe::recording();
    let handle = manager(&doc).present(probe, "x".to_string(), None).unwrap();

    let fresh_body = doc.replace_body();
    assert!(!handle.is_attached());

    handle.close();

    assert!(handle.is_closed());
    assert!(doc.children(fresh_body).is_empty());
    assert!(doc.parent_node(handle.container()).is_none());
}

#[test]
fn test_render_failure_returns_closable_handle() {
    let doc = MemoryDocument::new();
    let (probe, log) = Probe::failing();
    let (closed, on_close) = close_counter();

    let err = manager(&doc)
        .present(probe, "broken".to_string(), Some(on_close))
        .unwrap_err();
    assert!(err.to_string().contains("probe asked to fail"));

    let (handle, source) = err.into_parts();
    assert!(source.to_string().contains("probe"));
    assert!(!handle.is_closed());

    handle.close();
    handle.close();

    assert_eq!(closed.get(), 1);
    assert_eq!(log.unmounts.get(), 1);
    assert!(doc.elements_by_id(OVERLAY_ID).is_empty());
}

#[tokio::test]
async fn test_deferred_attachment_while_page_loads() {
    LocalSet::new()
        .run_until(async {
            let doc = MemoryDocument::loading();
            let (probe, log) = Probe::recording();

            let handle = manager(&doc)
                .present(probe, "early".to_string(), None)
                .unwrap();

            // Rendered into the detached mount point right away
            assert_eq!(log.renders.get(), 1);
            assert!(handle.is_pending());
            assert!(!handle.is_attached());
            assert!(doc.elements_by_id(OVERLAY_ID).is_empty());

            sleep(TICK * 3).await;
            assert!(handle.is_pending());

            doc.ensure_body();
            sleep(TICK * 5).await;

            assert!(!handle.is_pending());
            assert!(handle.is_attached());
            assert_eq!(paragraphs(&doc), vec!["early".to_string()]);
            assert_eq!(doc.parent_node(handle.style_tag()), doc.head());

            handle.close();
            assert!(doc.elements_by_id(OVERLAY_ID).is_empty());
        })
        .await;
}

#[tokio::test]
async fn test_close_before_body_cancels_attachment() {
    LocalSet::new()
        .run_until(async {
            let doc = MemoryDocument::loading();
            let (probe, log) = Probe::recording();
            let (closed, on_close) = close_counter();

            let handle = manager(&doc)
                .present(probe, "never".to_string(), Some(on_close))
                .unwrap();
            handle.close();
            assert!(!handle.is_pending());

            doc.ensure_body();
            sleep(TICK * 5).await;

            assert!(!handle.is_attached());
            assert!(doc.elements_by_id(OVERLAY_ID).is_empty());
            assert!(doc.elements_by_tag("style").is_empty());
            assert_eq!(closed.get(), 1);
            assert_eq!(log.unmounts.get(), 1);
        })
        .await;
}

#[tokio::test]
async fn test_overlay_appears_after_caller_moves_on() {
    LocalSet::new()
        .run_until(async {
            let doc = MemoryDocument::loading();
            let (probe, log) = Probe::recording();
            let (closed, on_close) = close_counter();

            let _ = manager(&doc)
                .present(probe, "late".to_string(), Some(on_close))
                .unwrap();

            doc.ensure_body();
            sleep(TICK * 5).await;

            assert_eq!(doc.elements_by_id(OVERLAY_ID).len(), 1);
            assert_eq!(paragraphs(&doc), vec!["late".to_string()]);

            // The panel can still dismiss itself
            let from_component = log.close.borrow().clone().unwrap();
            from_component.call();

            assert_eq!(closed.get(), 1);
            assert_eq!(log.unmounts.get(), 1);
            assert!(doc.elements_by_id(OVERLAY_ID).is_empty());
            assert!(doc.elements_by_tag("style").is_empty());
        })
        .await;
}

#[test]
fn test_ui_close_works_after_handle_dropped() {
    let doc = MemoryDocument::new();
    let (probe, log) = Probe::recording();
    let (closed, on_close) = close_counter();

    let handle = manager(&doc)
        .present(probe, "x".to_string(), Some(on_close))
        .unwrap();
    drop(handle);

    assert_eq!(doc.elements_by_id(OVERLAY_ID).len(), 1);
    assert_eq!(log.unmounts.get(), 0);

    let from_component = log.close.borrow().clone().unwrap();
    from_component.call();
    from_component.call();

    assert_eq!(closed.get(), 1);
    assert_eq!(log.unmounts.get(), 1);
    assert!(doc.elements_by_id(OVERLAY_ID).is_empty());
    assert!(paragraphs(&doc).is_empty());
}
