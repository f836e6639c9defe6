//! Atomic sessions: commit, rollback, abort, dry-run.

use crate::mock_dp::MockDataPlane;
use ofp_datastore::objects::{Attr, Kind};
use ofp_datastore::{Datastore, ResultCode};

fn run(ds: &mut Datastore, dp: &mut MockDataPlane, line: &str) -> ofp_datastore::cmd::CmdResult {
    ds.handle_line(dp, line).expect("non-blank line")
}

fn run_ok(ds: &mut Datastore, dp: &mut MockDataPlane, line: &str) {
    let r = run(ds, dp, line);
    assert!(r.is_ok(), "{line}: {:?}", r);
}

fn policer_actions(ds: &Datastore, name: &str, view_current: bool) -> Vec<String> {
    let conf = ds.find(Kind::Policer, name).unwrap();
    let attr = if view_current {
        conf.current_attr.as_ref()
    } else {
        conf.modified_attr.as_ref()
    };
    match attr.expect("view populated") {
        Attr::Policer(p) => p.action_names().iter().map(ToString::to_string).collect(),
        other => panic!("unexpected attr {other:?}"),
    }
}

// ── atomic commit of a coordinated edit ───────────────────────

#[test]
fn atomic_commit_applies_buffered_edit() {
    let mut ds = Datastore::new();
    let mut dp = MockDataPlane::new();

    ds.begin_atomic().unwrap();
    run_ok(&mut ds, &mut dp, "policer-action pa create -type discard");
    run_ok(&mut ds, &mut dp, "policer-action pa2 create -type discard");
    run_ok(&mut ds, &mut dp, "policer p create -action pa -bandwidth-limit 1501");
    run_ok(
        &mut ds,
        &mut dp,
        "policer p config -action ~pa -action pa2 -bandwidth-limit 1601",
    );

    // nothing reached the data plane yet
    assert!(dp.calls.is_empty(), "atomic buffers, dp saw {:?}", dp.calls);

    // current view does not exist before commit; modified shows the edit
    let r = run(&mut ds, &mut dp, "policer p current");
    assert_eq!(r.code, ResultCode::NotOperational);

    let r = run(&mut ds, &mut dp, "policer p modified");
    let item = &r.data.unwrap()[0];
    assert_eq!(item["bandwidth-limit"], 1601);
    assert_eq!(item["actions"].as_array().unwrap().len(), 1);
    assert_eq!(item["actions"][0], ":pa2");

    ds.commit(&mut dp).unwrap();

    let r = run(&mut ds, &mut dp, "policer p current");
    let item = &r.data.unwrap()[0];
    assert_eq!(item["bandwidth-limit"], 1601);
    assert_eq!(item["actions"][0], ":pa2");

    let r = run(&mut ds, &mut dp, "policer p modified");
    assert_eq!(r.code, ResultCode::NotOperational);

    // the native objects exist exactly once
    assert_eq!(dp.count_creates("policer"), 1);
    assert!(ds.find(Kind::PolicerAction, ":pa2").unwrap().is_used);
}

// ── atomic rollback restores the previous configuration ───────

#[test]
fn atomic_rollback_restores_previous_state() {
    let mut ds = Datastore::new();
    let mut dp = MockDataPlane::new();

    // committed baseline
    run_ok(&mut ds, &mut dp, "policer-action pa create -type discard");
    run_ok(&mut ds, &mut dp, "policer-action pa2 create -type discard");
    run_ok(&mut ds, &mut dp, "policer p create -action pa -bandwidth-limit 1501");

    ds.begin_atomic().unwrap();
    run_ok(
        &mut ds,
        &mut dp,
        "policer p config -action ~pa -action pa2 -bandwidth-limit 1601",
    );
    ds.rollback(&mut dp).unwrap();

    let r = run(&mut ds, &mut dp, "policer p current");
    let item = &r.data.unwrap()[0];
    assert_eq!(item["bandwidth-limit"], 1501);
    assert_eq!(item["actions"].as_array().unwrap().len(), 1);
    assert_eq!(item["actions"][0], ":pa");

    let conf = ds.find(Kind::Policer, ":p").unwrap();
    assert!(conf.modified_attr.is_none());
    assert!(ds.find(Kind::PolicerAction, ":pa").unwrap().is_used);
    assert!(!ds.find(Kind::PolicerAction, ":pa2").unwrap().is_used);
}

#[test]
fn atomic_rollback_of_fresh_create_deletes_it() {
    let mut ds = Datastore::new();
    let mut dp = MockDataPlane::new();

    ds.begin_atomic().unwrap();
    run_ok(&mut ds, &mut dp, "policer-action pa create -type discard");
    run_ok(&mut ds, &mut dp, "policer p create -action pa");
    ds.rollback(&mut dp).unwrap();

    assert!(ds.find(Kind::Policer, ":p").is_none());
    assert!(ds.find(Kind::PolicerAction, ":pa").is_none());
    assert!(dp.calls.is_empty(), "rollback of a buffered create is dp-silent");
}

// ── abort restores every flag to its pre-session value ────────

#[test]
fn abort_restores_flags_and_references() {
    let mut ds = Datastore::new();
    let mut dp = MockDataPlane::new();

    run_ok(&mut ds, &mut dp, "policer-action pa create -type discard");
    run_ok(&mut ds, &mut dp, "policer-action pa2 create -type discard");
    run_ok(&mut ds, &mut dp, "policer p create -action pa");
    run_ok(&mut ds, &mut dp, "port P create -policer p");
    run_ok(&mut ds, &mut dp, "policer p enable");

    let snapshot = |ds: &Datastore| {
        [":pa", ":pa2", ":p"]
            .iter()
            .map(|n| {
                let kind = if n.contains("pa") {
                    Kind::PolicerAction
                } else {
                    Kind::Policer
                };
                let c = ds.find(kind, n).unwrap();
                (c.is_used, c.is_enabled, c.is_destroying)
            })
            .collect::<Vec<_>>()
    };
    let before = snapshot(&ds);
    let serialized_before = ds.serialize_all();

    ds.begin_atomic().unwrap();
    run_ok(&mut ds, &mut dp, "policer p config -action ~pa -action pa2");
    run_ok(&mut ds, &mut dp, "policer p disable");
    // pa was released by the pending edit, so its destruction is accepted
    run_ok(&mut ds, &mut dp, "policer-action pa destroy");
    ds.abort(&mut dp).unwrap();

    assert_eq!(snapshot(&ds), before);
    assert_eq!(ds.serialize_all(), serialized_before);
    let p = ds.find(Kind::Policer, ":p").unwrap();
    assert!(p.modified_attr.is_none());
    assert!(!p.is_disabling);
    assert!(!ds.find(Kind::PolicerAction, ":pa").unwrap().is_destroying);
}

#[test]
fn abort_drops_a_buffered_create() {
    let mut ds = Datastore::new();
    let mut dp = MockDataPlane::new();

    ds.begin_atomic().unwrap();
    run_ok(&mut ds, &mut dp, "queue q1 create -id 1");
    ds.abort(&mut dp).unwrap();

    assert!(ds.find(Kind::Queue, ":q1").is_none());
    assert!(dp.calls.is_empty());
}

// ── atomic destroy and enable intents ─────────────────────────

#[test]
fn atomic_destroy_is_deferred_to_commit() {
    let mut ds = Datastore::new();
    let mut dp = MockDataPlane::new();

    run_ok(&mut ds, &mut dp, "queue q1 create -id 1");
    assert_eq!(dp.count_destroys("queue"), 0);

    ds.begin_atomic().unwrap();
    run_ok(&mut ds, &mut dp, "queue q1 destroy");
    // still visible in the store, flagged destroying
    assert!(ds.find(Kind::Queue, ":q1").unwrap().is_destroying);
    assert_eq!(dp.count_destroys("queue"), 0);

    ds.commit(&mut dp).unwrap();
    assert!(ds.find(Kind::Queue, ":q1").is_none());
    assert_eq!(dp.count_destroys("queue"), 1);
}

#[test]
fn atomic_enable_collapses_at_commit() {
    let mut ds = Datastore::new();
    let mut dp = MockDataPlane::new();

    run_ok(&mut ds, &mut dp, "policer-action pa create -type discard");
    run_ok(&mut ds, &mut dp, "policer p create -action pa");
    run_ok(&mut ds, &mut dp, "port P create -policer p");

    ds.begin_atomic().unwrap();
    run_ok(&mut ds, &mut dp, "policer p enable");
    let p = ds.find(Kind::Policer, ":p").unwrap();
    assert!(p.is_enabling);
    assert!(!p.is_enabled);
    assert!(!dp.started("policer", ":p"));

    ds.commit(&mut dp).unwrap();
    let p = ds.find(Kind::Policer, ":p").unwrap();
    assert!(p.is_enabled);
    assert!(!p.is_enabling);
    assert!(dp.started("policer", ":p"));
}

// ── commit failure rolls the whole session back ───────────────

#[test]
fn failing_commit_switches_to_rollback() {
    let mut ds = Datastore::new();
    let mut dp = MockDataPlane::new();

    ds.begin_atomic().unwrap();
    run_ok(&mut ds, &mut dp, "queue q1 create -id 1");
    run_ok(&mut ds, &mut dp, "queue q2 create -id 2");

    dp.fail_create_of = Some(":q2".to_string());
    let err = ds.commit(&mut dp).unwrap_err();
    assert!(!err.message.is_empty());

    // both buffered creates are gone from the store
    assert!(ds.find(Kind::Queue, ":q1").is_none());
    assert!(ds.find(Kind::Queue, ":q2").is_none());
    assert_eq!(ds.state(), ofp_datastore::interp::InterpState::AutoCommit);
}

// ── dry-run ───────────────────────────────────────────────────

#[test]
fn dryrun_moves_attributes_without_touching_the_data_plane() {
    let mut ds = Datastore::new();
    let mut dp = MockDataPlane::new();

    ds.begin_dryrun().unwrap();
    run_ok(&mut ds, &mut dp, "policer-action pa create -type discard");
    run_ok(&mut ds, &mut dp, "policer p create -action pa");

    let r = run(&mut ds, &mut dp, "policer p current");
    assert_eq!(r.data.unwrap()[0]["actions"][0], ":pa");

    run_ok(&mut ds, &mut dp, "policer p destroy");
    run_ok(&mut ds, &mut dp, "policer-action pa destroy");
    ds.end_dryrun().unwrap();

    assert!(ds.is_empty());
    assert!(dp.calls.is_empty(), "dry run must never call the dp: {:?}", dp.calls);
}

#[test]
fn dryrun_create_skips_namespace_check() {
    let mut ds = Datastore::new();
    let mut dp = MockDataPlane::new();

    ds.begin_dryrun().unwrap();
    run_ok(&mut ds, &mut dp, "queue ns9:q1 create -id 1");
    assert!(ds.find(Kind::Queue, "ns9:q1").is_some());
}

// ── session bookkeeping ───────────────────────────────────────

#[test]
fn session_nesting_is_refused() {
    let mut ds = Datastore::new();
    let mut dp = MockDataPlane::new();

    ds.begin_atomic().unwrap();
    assert_eq!(
        ds.begin_atomic().unwrap_err().code,
        ResultCode::NotOperational
    );
    assert_eq!(
        ds.begin_dryrun().unwrap_err().code,
        ResultCode::NotOperational
    );
    ds.abort(&mut dp).unwrap();
    assert_eq!(ds.commit(&mut dp).unwrap_err().code, ResultCode::NotOperational);
}

#[test]
fn modified_view_inside_atomic_tracks_each_edit() {
    let mut ds = Datastore::new();
    let mut dp = MockDataPlane::new();

    run_ok(&mut ds, &mut dp, "policer-action pa create -type discard");
    run_ok(&mut ds, &mut dp, "policer p create -action pa -bandwidth-limit 1501");

    ds.begin_atomic().unwrap();
    run_ok(&mut ds, &mut dp, "policer p config -bandwidth-limit 1601");
    assert_eq!(policer_actions(&ds, ":p", true), vec![":pa"]);
    assert_eq!(policer_actions(&ds, ":p", false), vec![":pa"]);

    run_ok(&mut ds, &mut dp, "policer p config -bandwidth-limit 1701");
    let r = run(&mut ds, &mut dp, "policer p modified");
    assert_eq!(r.data.unwrap()[0]["bandwidth-limit"], 1701);

    // current view still shows the committed value
    let r = run(&mut ds, &mut dp, "policer p current");
    assert_eq!(r.data.unwrap()[0]["bandwidth-limit"], 1501);

    ds.commit(&mut dp).unwrap();
    let r = run(&mut ds, &mut dp, "policer p current");
    assert_eq!(r.data.unwrap()[0]["bandwidth-limit"], 1701);
}
