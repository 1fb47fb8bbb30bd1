//! End-to-end behaviour of an editor session

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rescanvas_core::{EngineError, FormPatch, NotificationLevel};
use rescanvas_graph::{Position, Viewport};
use rescanvas_interchange::{split_documents, GraphSnapshot, ParseRejection};
use rescanvas_model::NodeId;
use rescanvas_test_utils::{
    field, name_of, path, session_with_debounce, setup_test_session, store, MIXED_BATCH,
};
use serde_json::json;
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn deployment_feeds_service_selector() {
    let session = session_with_debounce(Duration::from_millis(300));
    let dep = session.add_node("Deployment", None).unwrap();
    let svc = session.add_node("Service", None).unwrap();
    assert_eq!(dep, NodeId::new("1"));
    assert_eq!(svc, NodeId::new("2"));

    session
        .connect("source:1:metadata.name", "target:2:spec.selector.app")
        .unwrap();
    session
        .apply_form_patch(FormPatch::set(dep.clone(), path("metadata.name"), json!("web")))
        .unwrap();

    tokio::time::advance(Duration::from_millis(100)).await;
    session.tick();
    assert_ne!(field(&session, &svc, "spec.selector.app"), Some(json!("web")));

    session.settle().await;
    assert_eq!(field(&session, &svc, "spec.selector.app"), Some(json!("web")));

    let text = session.preview_text().unwrap();
    let documents = split_documents(&text);
    assert_eq!(documents.len(), 2);
    assert!(documents[0].contains("kind: Deployment"));
    assert!(documents[1].contains("kind: Service"));
}

#[tokio::test(start_paused = true)]
async fn chain_converges_without_retrigger() {
    let session = session_with_debounce(Duration::from_millis(300));
    let a = session.add_node("ConfigMap", None).unwrap();
    let b = session.add_node("ConfigMap", None).unwrap();
    let c = session.add_node("ConfigMap", None).unwrap();
    session
        .connect(&format!("source:{a}:data.value"), &format!("target:{b}:data.value"))
        .unwrap();
    session
        .connect(&format!("source:{b}:data.value"), &format!("target:{c}:data.value"))
        .unwrap();

    session
        .apply_form_patch(FormPatch::set(a.clone(), path("data.value"), json!("v1")))
        .unwrap();
    let report = session.settle().await;

    assert_eq!(field(&session, &b, "data.value"), Some(json!("v1")));
    assert_eq!(field(&session, &c, "data.value"), Some(json!("v1")));
    assert_eq!(report.writes, 2);
    assert_eq!(session.pending_propagations(), 0);
}

#[tokio::test(start_paused = true)]
async fn unchanged_source_writes_nothing() {
    let session = session_with_debounce(Duration::from_millis(50));
    let a = session.add_node("ConfigMap", None).unwrap();
    let b = session.add_node("ConfigMap", None).unwrap();
    session
        .apply_form_patch(FormPatch::set(a.clone(), path("data.value"), json!("same")))
        .unwrap();
    session
        .connect(&format!("source:{a}:data.value"), &format!("target:{b}:data.value"))
        .unwrap();
    assert_eq!(session.settle().await.writes, 1);

    let changed = session
        .apply_form_patch(FormPatch::set(a.clone(), path("data.value"), json!("same")))
        .unwrap();
    assert!(!changed);
    let report = session.settle().await;
    assert_eq!(report.writes, 0);
    assert_eq!(session.pending_propagations(), 0);
}

#[test]
fn partial_batch_creates_three_rejects_two() {
    let session = setup_test_session();
    let outcome = session.import_text(MIXED_BATCH, "paste").unwrap();

    assert_eq!(outcome.created.len(), 3);
    assert_eq!(outcome.rejected.len(), 2);
    assert_eq!(
        outcome.rejected,
        vec![
            ParseRejection::UnknownKind {
                index: 2,
                kind: "Pod".into()
            },
            ParseRejection::UnknownKind {
                index: 4,
                kind: "CronTab".into()
            },
        ]
    );
    let names: Vec<_> = outcome
        .created
        .iter()
        .map(|id| name_of(&session, id))
        .collect();
    assert_eq!(
        names,
        vec![Some(json!("settings")), Some(json!("migrate")), Some(json!("token"))]
    );

    let notes = session.drain_notifications();
    assert_eq!(notes.last().unwrap().level, NotificationLevel::Warning);
    assert_eq!(notes.last().unwrap().message, "Imported 3 resources, 2 rejected");
}

#[test]
fn cascade_delete_keeps_unrelated_edges() {
    let session = setup_test_session();
    let ids: Vec<_> = (0..4)
        .map(|_| session.add_node("ConfigMap", None).unwrap())
        .collect();
    let connect = |s: &NodeId, t: &NodeId| {
        session
            .connect(&format!("source:{s}:metadata.name"), &format!("target:{t}:data.copy"))
            .unwrap()
    };
    let doomed_out = connect(&ids[0], &ids[1]);
    let doomed_in = connect(&ids[2], &ids[0]);
    let survivor = connect(&ids[2], &ids[3]);

    let removed = session.remove_nodes(&[ids[0].clone()]);
    assert_eq!(removed, vec![ids[0].clone()]);

    let remaining: Vec<_> = session.edges().into_iter().map(|e| e.id).collect();
    assert_eq!(remaining, vec![survivor]);
    assert!(!remaining.contains(&doomed_out));
    assert!(!remaining.contains(&doomed_in));
}

#[test]
fn snapshot_restore_is_deep_equal_and_advances_ids() {
    let session = setup_test_session();
    let dep = session.add_node("Deployment", Some(Position::new(10.0, 20.0))).unwrap();
    let svc = session.add_node("Service", None).unwrap();
    session
        .connect(
            &format!("source:{dep}:metadata.name"),
            &format!("target:{svc}:spec.selector.app"),
        )
        .unwrap();
    session.set_viewport(Viewport {
        x: 1.0,
        y: 2.0,
        zoom: 1.5,
    });
    let text = session.export_snapshot().unwrap();
    let before = GraphSnapshot::from_json(&text).unwrap();

    let fresh = setup_test_session();
    let report = fresh.import_snapshot(&text).unwrap();
    assert_eq!(report.dropped_edges, 0);
    assert_eq!(fresh.nodes(), before.nodes);
    assert_eq!(fresh.edges(), before.edges);
    assert_eq!(fresh.viewport(), before.viewport);

    let next = fresh.add_node("Job", None).unwrap();
    assert_eq!(next, NodeId::new("3"));
}

#[test]
fn restore_keeps_targets_that_diverge_from_their_source() {
    let session = setup_test_session();
    let a = session.add_node("ConfigMap", None).unwrap();
    let b = session.add_node("ConfigMap", None).unwrap();
    session
        .apply_form_patch(FormPatch::set(a.clone(), path("data.x"), json!("src")))
        .unwrap();
    session
        .connect(&format!("source:{a}:data.x"), &format!("target:{b}:data.y"))
        .unwrap();
    session
        .apply_form_patch(FormPatch::set(b.clone(), path("data.y"), json!("manual")))
        .unwrap();
    assert_eq!(field(&session, &b, "data.y"), Some(json!("manual")));

    let text = session.export_snapshot().unwrap();
    let before = GraphSnapshot::from_json(&text).unwrap();

    let fresh = setup_test_session();
    fresh.import_snapshot(&text).unwrap();
    assert_eq!(fresh.nodes(), before.nodes);
    assert_eq!(fresh.edges(), before.edges);
    assert_eq!(field(&fresh, &b, "data.y"), Some(json!("manual")));
    assert_eq!(fresh.pending_propagations(), 0);
}

#[test]
fn invalid_snapshot_is_refused_wholesale() {
    let session = setup_test_session();
    session.add_node("Secret", None).unwrap();
    let before = session.nodes();

    let err = session
        .import_snapshot(r#"{"edges": [], "viewport": {"x": 0, "y": 0, "zoom": 1}}"#)
        .unwrap_err();
    assert!(matches!(err, EngineError::Snapshot(_)));
    assert!(err.is_refusal());
    assert_eq!(session.nodes(), before);
}

#[test]
fn snapshot_with_unallocatable_id_is_refused() {
    let session = setup_test_session();
    session.add_node("Job", None).unwrap();
    let text = format!(
        r#"{{"nodes": [{{"id": "{}", "kind": "Job", "position": {{"x": 0, "y": 0}}, "record": {{}}}}],
            "edges": [], "viewport": {{"x": 0, "y": 0, "zoom": 1}}}}"#,
        u64::MAX
    );

    let err = session.import_snapshot(&text).unwrap_err();
    assert!(matches!(err, EngineError::Snapshot(_)));
    assert_eq!(session.nodes().len(), 1);
    assert_eq!(session.add_node("Job", None).unwrap(), NodeId::new("2"));
}

#[test]
fn malformed_handles_never_create_edges() {
    let session = setup_test_session();
    session.add_node("Deployment", None).unwrap();
    session.add_node("Service", None).unwrap();

    for (source, target) in [
        ("source:1", "target:2:spec.selector.app"),
        ("target:1:metadata.name", "target:2:spec.selector.app"),
        ("source:9:metadata.name", "target:2:spec.selector.app"),
        ("sideways:1:metadata.name", "target:2:spec.selector.app"),
    ] {
        let err = session.connect(source, target).unwrap_err();
        assert!(matches!(err, EngineError::Connect(_)), "{source} -> {target}");
    }
    assert!(session.edges().is_empty());
}

proptest! {
    #[test]
    fn new_ids_exceed_every_existing_id(
        steps in proptest::collection::vec(prop_oneof![Just(None), (1u64..500).prop_map(Some)], 1..20),
    ) {
        let mut store = store();
        for step in steps {
            let max_before = store.nodes().filter_map(|n| n.id.numeric()).max().unwrap_or(0);
            match step {
                None => {
                    let id = store.add_node("Job", None).unwrap().id.clone();
                    prop_assert!(id.numeric().unwrap() > max_before);
                }
                Some(restored_id) => {
                    let mut nodes: Vec<_> = store.nodes().cloned().collect();
                    if nodes.iter().all(|n| n.id.numeric() != Some(restored_id)) {
                        let mut node = nodes.first().cloned().unwrap_or_else(|| {
                            let mut scratch = rescanvas_test_utils::store();
                            scratch.add_node("Job", None).unwrap().clone()
                        });
                        node.id = NodeId::from_number(restored_id);
                        nodes.push(node);
                    }
                    store.replace_all(nodes, Vec::new()).unwrap();
                    let max_now = store.nodes().filter_map(|n| n.id.numeric()).max().unwrap_or(0);
                    let id = store.add_node("Job", None).unwrap().id.clone();
                    prop_assert!(id.numeric().unwrap() > max_now);
                }
            }
        }
    }
}
