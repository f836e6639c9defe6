//! Auto-commit lifecycle: create, reference, enable, disable, destroy.

use crate::mock_dp::{DpCall, MockDataPlane};
use ofp_datastore::objects::Kind;
use ofp_datastore::{Datastore, ResultCode};

fn run(ds: &mut Datastore, dp: &mut MockDataPlane, line: &str) -> ofp_datastore::cmd::CmdResult {
    ds.handle_line(dp, line)
        .unwrap_or_else(|| panic!("blank line dispatched: {line}"))
}

fn run_ok(ds: &mut Datastore, dp: &mut MockDataPlane, line: &str) {
    let r = run(ds, dp, line);
    assert!(r.is_ok(), "{line}: {:?}", r);
}

// ── create / enable / disable / destroy chain ─────────────────

#[test]
fn create_enable_destroy_chain() {
    let mut ds = Datastore::new();
    let mut dp = MockDataPlane::new();

    run_ok(&mut ds, &mut dp, "policer-action pa create -type discard");
    run_ok(
        &mut ds,
        &mut dp,
        "policer p create -action pa -bandwidth-limit 1501 \
         -burst-size-limit 1502 -bandwidth-percent 1",
    );
    run_ok(&mut ds, &mut dp, "port P create -policer p");
    run_ok(&mut ds, &mut dp, "policer p enable");

    let shown = run(&mut ds, &mut dp, "policer p");
    assert!(shown.is_ok());
    let data = shown.data.expect("show payload");
    let item = &data[0];
    assert_eq!(item["name"], ":p");
    assert_eq!(item["is-used"], true);
    assert_eq!(item["is-enabled"], true);
    assert_eq!(item["bandwidth-limit"], 1501);
    assert_eq!(item["actions"][0], ":pa");

    assert!(dp.started("policer", ":p"));
    assert!(dp.started("policer-action", ":pa"));

    run_ok(&mut ds, &mut dp, "port P destroy");
    run_ok(&mut ds, &mut dp, "policer p destroy");
    run_ok(&mut ds, &mut dp, "policer-action pa destroy");

    assert!(ds.is_empty(), "store must end empty");
    assert_eq!(dp.count_destroys("port"), 1);
    assert_eq!(dp.count_destroys("policer"), 1);
    assert_eq!(dp.count_destroys("policer-action"), 1);
}

// ── enable without a referencing parent ───────────────────────

#[test]
fn enable_without_parent_is_not_operational() {
    let mut ds = Datastore::new();
    let mut dp = MockDataPlane::new();

    run_ok(&mut ds, &mut dp, "policer-action pa create -type discard");
    run_ok(&mut ds, &mut dp, "policer p create -action pa");

    let r = run(&mut ds, &mut dp, "policer p enable");
    assert_eq!(r.code, ResultCode::NotOperational);
    assert!(
        r.message.as_deref().unwrap_or("").contains(":p"),
        "message must name the policer: {:?}",
        r.message
    );

    let conf = ds.find(Kind::Policer, ":p").unwrap();
    assert!(!conf.is_enabled);
    assert!(!dp.started("policer", ":p"));
}

// ── destroy while referenced ──────────────────────────────────

#[test]
fn destroy_while_used_is_refused() {
    let mut ds = Datastore::new();
    let mut dp = MockDataPlane::new();

    run_ok(&mut ds, &mut dp, "policer-action pa create -type discard");
    run_ok(&mut ds, &mut dp, "policer p create -action pa");
    run_ok(&mut ds, &mut dp, "port P create -policer p");

    let r = run(&mut ds, &mut dp, "policer p destroy");
    assert_eq!(r.code, ResultCode::NotOperational);
    assert!(ds.find(Kind::Policer, ":p").is_some());

    run_ok(&mut ds, &mut dp, "port P destroy");
    run_ok(&mut ds, &mut dp, "policer p destroy");
    assert!(ds.find(Kind::Policer, ":p").is_none());
}

// ── structural vs reference-only modification ─────────────────

#[test]
fn reference_only_edit_avoids_native_recreate() {
    let mut ds = Datastore::new();
    let mut dp = MockDataPlane::new();

    run_ok(&mut ds, &mut dp, "policer-action pa create -type discard");
    run_ok(&mut ds, &mut dp, "policer-action pa2 create -type discard");
    run_ok(&mut ds, &mut dp, "policer p create -action pa");

    let creates_before = dp.count_creates("policer");
    let adds_before = dp.count_child_adds("policer-action");

    run_ok(&mut ds, &mut dp, "policer p config -action ~pa -action pa2");

    assert_eq!(dp.count_destroys("policer"), 0, "no native re-create");
    assert_eq!(dp.count_creates("policer"), creates_before);
    assert!(dp.count_child_adds("policer-action") > adds_before);
    assert_eq!(dp.count_child_deletes("policer-action"), 1);

    let pa = ds.find(Kind::PolicerAction, ":pa").unwrap();
    let pa2 = ds.find(Kind::PolicerAction, ":pa2").unwrap();
    assert!(!pa.is_used);
    assert!(pa2.is_used);
}

#[test]
fn structural_edit_recreates_native_object() {
    let mut ds = Datastore::new();
    let mut dp = MockDataPlane::new();

    run_ok(&mut ds, &mut dp, "policer-action pa create -type discard");
    run_ok(&mut ds, &mut dp, "policer p create -action pa");

    run_ok(&mut ds, &mut dp, "policer p config -bandwidth-limit 2000");

    assert_eq!(dp.count_destroys("policer"), 1);
    assert_eq!(dp.count_creates("policer"), 2);
}

// ── policer reference set then unset on a port ────────────────

#[test]
fn port_policer_unset_releases_policer() {
    let mut ds = Datastore::new();
    let mut dp = MockDataPlane::new();

    run_ok(&mut ds, &mut dp, "policer-action pa create -type discard");
    run_ok(&mut ds, &mut dp, "policer p create -action pa");
    run_ok(&mut ds, &mut dp, "port P create -policer p");
    assert!(ds.find(Kind::Policer, ":p").unwrap().is_used);

    run_ok(&mut ds, &mut dp, "port P config -policer ~p");
    assert!(!ds.find(Kind::Policer, ":p").unwrap().is_used);
    assert!(dp.calls.contains(&DpCall::ChildDelete {
        relation: "port-policer",
        parent: ":P".to_string(),
        child: ":p".to_string(),
    }));

    run_ok(&mut ds, &mut dp, "policer p destroy");
}

// ── name-list rules ───────────────────────────────────────────

#[test]
fn name_list_add_and_delete_rules() {
    let mut ds = Datastore::new();
    let mut dp = MockDataPlane::new();

    run_ok(&mut ds, &mut dp, "policer-action pa create -type discard");
    run_ok(&mut ds, &mut dp, "policer p create -action pa");

    // adding a member twice
    let r = run(&mut ds, &mut dp, "policer p config -action pa");
    assert_eq!(r.code, ResultCode::AlreadyExists);

    // adding a missing object
    let r = run(&mut ds, &mut dp, "policer p config -action ghost");
    assert_eq!(r.code, ResultCode::NotFound);

    // adding an object already used by another parent
    run_ok(&mut ds, &mut dp, "policer p2 create");
    let r = run(&mut ds, &mut dp, "policer p2 config -action pa");
    assert_eq!(r.code, ResultCode::NotOperational);

    // deleting a non-member
    let r = run(&mut ds, &mut dp, "policer p config -action ~ghost");
    assert_eq!(r.code, ResultCode::NotFound);
}

// ── create / config edge cases ────────────────────────────────

#[test]
fn create_existing_fails_and_config_missing_creates() {
    let mut ds = Datastore::new();
    let mut dp = MockDataPlane::new();

    run_ok(&mut ds, &mut dp, "queue q1 create -id 1");
    let r = run(&mut ds, &mut dp, "queue q1 create");
    assert_eq!(r.code, ResultCode::AlreadyExists);

    // config on a missing name falls through to create
    run_ok(&mut ds, &mut dp, "queue q2 config -id 2");
    assert!(ds.find(Kind::Queue, ":q2").is_some());
    assert_eq!(dp.count_creates("queue"), 2);
}

#[test]
fn create_under_unknown_namespace_fails() {
    let mut ds = Datastore::new();
    let mut dp = MockDataPlane::new();

    let r = run(&mut ds, &mut dp, "queue ns9:q1 create");
    assert_eq!(r.code, ResultCode::NotFound);

    run_ok(&mut ds, &mut dp, "namespace create ns9");
    run_ok(&mut ds, &mut dp, "queue ns9:q1 create");
    assert!(ds.find(Kind::Queue, "ns9:q1").is_some());
}

#[test]
fn enable_disable_on_missing_is_invalid_object() {
    let mut ds = Datastore::new();
    let mut dp = MockDataPlane::new();

    let r = run(&mut ds, &mut dp, "policer ghost enable");
    assert_eq!(r.code, ResultCode::InvalidObject);
    let r = run(&mut ds, &mut dp, "policer ghost disable");
    assert_eq!(r.code, ResultCode::InvalidObject);
}

// ── option failures leave the edit buffer untouched ───────────

#[test]
fn option_failure_discards_the_pending_edit() {
    let mut ds = Datastore::new();
    let mut dp = MockDataPlane::new();

    run_ok(&mut ds, &mut dp, "policer p create -bandwidth-limit 1600");

    // out-of-range value: command fails, nothing mutates
    let r = run(&mut ds, &mut dp, "policer p config -bandwidth-limit 100");
    assert_eq!(r.code, ResultCode::TooShort);
    let conf = ds.find(Kind::Policer, ":p").unwrap();
    assert!(conf.modified_attr.is_none(), "edit buffer must be discarded");

    let shown = run(&mut ds, &mut dp, "policer p");
    assert_eq!(shown.data.unwrap()[0]["bandwidth-limit"], 1600);
}

#[test]
fn unknown_option_and_sub_command_are_rejected() {
    let mut ds = Datastore::new();
    let mut dp = MockDataPlane::new();

    let r = run(&mut ds, &mut dp, "policer p create -no-such-opt 1");
    assert_eq!(r.code, ResultCode::InvalidArgs);
    assert!(ds.find(Kind::Policer, ":p").is_none());

    run_ok(&mut ds, &mut dp, "policer p create");
    let r = run(&mut ds, &mut dp, "policer p frobnicate");
    assert_eq!(r.code, ResultCode::InvalidArgs);
}

// ── config read-back ──────────────────────────────────────────

#[test]
fn config_without_value_reads_one_field_back() {
    let mut ds = Datastore::new();
    let mut dp = MockDataPlane::new();

    run_ok(&mut ds, &mut dp, "policer p create -bandwidth-limit 1700");

    let r = run(&mut ds, &mut dp, "policer p config -bandwidth-limit");
    assert!(r.is_ok());
    let item = &r.data.unwrap()[0];
    assert_eq!(item["bandwidth-limit"], 1700);
    assert!(item.get("burst-size-limit").is_none(), "only the requested field");
}

// ── port composition ──────────────────────────────────────────

#[test]
fn port_binds_interface_policer_and_queues() {
    let mut ds = Datastore::new();
    let mut dp = MockDataPlane::new();

    run_ok(
        &mut ds,
        &mut dp,
        "interface if0 create -type ethernet-rawsock -device eth0",
    );
    run_ok(&mut ds, &mut dp, "policer-action pa create -type discard");
    run_ok(&mut ds, &mut dp, "policer p create -action pa");
    run_ok(&mut ds, &mut dp, "queue q1 create -id 1");
    run_ok(&mut ds, &mut dp, "queue q2 create -id 2");
    run_ok(
        &mut ds,
        &mut dp,
        "port P create -interface if0 -policer p -queue q1 -queue q2 -port-number 1",
    );

    for (kind, name) in [
        (Kind::Interface, ":if0"),
        (Kind::Policer, ":p"),
        (Kind::Queue, ":q1"),
        (Kind::Queue, ":q2"),
    ] {
        assert!(ds.find(kind, name).unwrap().is_used, "{name} must be used");
    }

    assert_eq!(dp.count_child_adds("port-interface"), 1);
    assert_eq!(dp.count_child_adds("port-policer"), 1);
    assert_eq!(dp.count_child_adds("port-queue"), 2);
}

#[test]
fn port_rejects_duplicate_queue_id() {
    let mut ds = Datastore::new();
    let mut dp = MockDataPlane::new();

    run_ok(&mut ds, &mut dp, "queue q1 create -id 7");
    run_ok(&mut ds, &mut dp, "queue q2 create -id 7");
    run_ok(&mut ds, &mut dp, "port P create -queue q1");

    let r = run(&mut ds, &mut dp, "port P config -queue q2");
    assert_eq!(r.code, ResultCode::AlreadyExists);
    assert!(
        r.message.as_deref().unwrap_or("").contains("queue id = 7"),
        "{:?}",
        r.message
    );
}

// ── bridge composition ────────────────────────────────────────

#[test]
fn bridge_binds_controller_and_port() {
    let mut ds = Datastore::new();
    let mut dp = MockDataPlane::new();

    run_ok(&mut ds, &mut dp, "channel ch create -dst-addr 10.0.0.1");
    run_ok(&mut ds, &mut dp, "controller c create -channel ch -role master");
    run_ok(&mut ds, &mut dp, "port P create -port-number 1");
    run_ok(
        &mut ds,
        &mut dp,
        "bridge br0 create -controller c -port P -dpid 11",
    );

    // a bridge is a root: nothing references it, so it cannot be enabled
    let r = run(&mut ds, &mut dp, "bridge br0 enable");
    assert_eq!(r.code, ResultCode::NotOperational);

    // children referenced by the bridge can, and start their own children
    run_ok(&mut ds, &mut dp, "controller c enable");
    assert!(dp.started("controller", ":c"));
    assert!(dp.started("channel", ":ch"));

    let shown = run(&mut ds, &mut dp, "bridge br0");
    let item = &shown.data.unwrap()[0];
    assert_eq!(item["dpid"], 11);
    assert_eq!(item["fail-mode"], "secure");
    assert_eq!(item["controllers"][0], ":c");
    assert_eq!(item["ports"][0], ":P");
}

// ── stats ─────────────────────────────────────────────────────

#[test]
fn queue_and_port_stats_read_through() {
    let mut ds = Datastore::new();
    let mut dp = MockDataPlane::new();

    run_ok(&mut ds, &mut dp, "queue q1 create -id 1");
    run_ok(&mut ds, &mut dp, "port P create -queue q1");

    let r = run(&mut ds, &mut dp, "queue q1 stats");
    assert!(r.is_ok());
    let item = &r.data.unwrap()[0];
    assert_eq!(item["tx-bytes"], 1024);

    let r = run(&mut ds, &mut dp, "port P stats");
    assert!(r.is_ok());
    assert_eq!(r.data.unwrap()[0]["rx-packets"], 16);

    // stats is only a sub-command where the kind has counters
    let r = run(&mut ds, &mut dp, "policer-action x stats");
    assert_eq!(r.code, ResultCode::InvalidArgs);
}

// ── show forms ────────────────────────────────────────────────

#[test]
fn show_lists_current_namespace_and_explicit_namespace() {
    let mut ds = Datastore::new();
    let mut dp = MockDataPlane::new();

    run_ok(&mut ds, &mut dp, "queue q1 create -id 1");
    run_ok(&mut ds, &mut dp, "namespace create ns1");
    run_ok(&mut ds, &mut dp, "queue ns1:q2 create -id 2");

    let r = run(&mut ds, &mut dp, "queue");
    assert_eq!(r.data.unwrap().as_array().unwrap().len(), 1);

    let r = run(&mut ds, &mut dp, "queue ns1:");
    let data = r.data.unwrap();
    assert_eq!(data.as_array().unwrap().len(), 1);
    assert_eq!(data[0]["name"], "ns1:q2");

    run_ok(&mut ds, &mut dp, "namespace set ns1");
    let r = run(&mut ds, &mut dp, "queue q2");
    assert_eq!(r.data.unwrap()[0]["name"], "ns1:q2");
}

#[test]
fn show_modified_on_clean_conf_is_not_operational() {
    let mut ds = Datastore::new();
    let mut dp = MockDataPlane::new();

    run_ok(&mut ds, &mut dp, "queue q1 create -id 1");
    let r = run(&mut ds, &mut dp, "queue q1 modified");
    assert_eq!(r.code, ResultCode::NotOperational);

    let r = run(&mut ds, &mut dp, "queue q1 current");
    assert!(r.is_ok());
    assert_eq!(r.data.unwrap()[0]["id"], 1);
}

// ── duplicate into namespace ──────────────────────────────────

#[test]
fn duplicate_rewrites_every_contained_name() {
    let mut ds = Datastore::new();
    let mut dp = MockDataPlane::new();

    run_ok(&mut ds, &mut dp, "policer-action pa create -type discard");
    run_ok(&mut ds, &mut dp, "policer p create -action pa");
    run_ok(&mut ds, &mut dp, "namespace create backup");

    ds.duplicate(Kind::Policer, ":p", "backup").unwrap();
    let dup = ds.find(Kind::Policer, "backup:p").unwrap();
    assert!(!dup.is_used);
    assert!(!dup.is_enabled);
    let attr = dup.current_attr.as_ref().unwrap();
    match attr {
        ofp_datastore::objects::Attr::Policer(p) => {
            let actions: Vec<&str> = p.action_names().iter().collect();
            assert_eq!(actions, vec!["backup:pa"]);
        }
        other => panic!("unexpected attr: {other:?}"),
    }
}

// ── teardown ──────────────────────────────────────────────────

#[test]
fn commands_after_teardown_fail_not_started() {
    let mut ds = Datastore::new();
    let mut dp = MockDataPlane::new();

    run_ok(&mut ds, &mut dp, "queue q1 create -id 1");
    ds.teardown();
    let r = run(&mut ds, &mut dp, "queue q1 create -id 1");
    assert_eq!(r.code, ResultCode::NotStarted);
}
