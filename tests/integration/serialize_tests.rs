//! Canonical serialisation and replay.

use crate::mock_dp::MockDataPlane;
use ofp_datastore::{Datastore, objects::Kind};

fn run_ok(ds: &mut Datastore, dp: &mut MockDataPlane, line: &str) {
    let r = ds.handle_line(dp, line).expect("non-blank line");
    assert!(r.is_ok(), "{line}: {:?}", r);
}

fn build_full_config(ds: &mut Datastore, dp: &mut MockDataPlane) {
    for line in [
        "namespace create site-a",
        "channel ch0 create -dst-addr 192.0.2.1 -dst-port 6653 -protocol tls",
        "policer-action pa0 create -type discard",
        "queue q0 create -type single-rate -id 1 -priority 3 -color yellow \
         -committed-burst-size 1600 -committed-information-rate 2000 -excess-burst-size 1700",
        "queue q1 create -type two-rate -id 2 -peak-burst-size 3000 -peak-information-rate 4000",
        "interface if0 create -type ethernet-rawsock -device eth0 -mtu 9000 -ip-addr 10.0.0.2",
        "policer p0 create -action pa0 -bandwidth-limit 1501 -burst-size-limit 1502 \
         -bandwidth-percent 7",
        "controller c0 create -channel ch0 -role master -connection-type main",
        "port P0 create -interface if0 -policer p0 -queue q0 -queue q1 -port-number 1",
        "bridge br0 create -controller c0 -port P0 -dpid 99 -fail-mode standalone",
        "channel site-a:ch1 create -dst-addr 198.51.100.7",
        "controller site-a:c1 create -channel site-a:ch1",
    ] {
        run_ok(ds, dp, line);
    }
}

// ── serialise ∘ replay is idempotent ──────────────────────────

#[test]
fn serialize_then_replay_is_byte_identical() {
    let mut ds = Datastore::new();
    let mut dp = MockDataPlane::new();
    build_full_config(&mut ds, &mut dp);

    let first = ds.serialize_all();

    let mut replayed = Datastore::new();
    let mut dp2 = MockDataPlane::new();
    replayed
        .load_str(&mut dp2, &first)
        .expect("replay of own serialisation");

    assert_eq!(replayed.serialize_all(), first);
}

#[test]
fn serialisation_lists_children_before_parents() {
    let mut ds = Datastore::new();
    let mut dp = MockDataPlane::new();
    build_full_config(&mut ds, &mut dp);

    let text = ds.serialize_all();
    let pos = |needle: &str| {
        text.find(needle)
            .unwrap_or_else(|| panic!("{needle} missing from:\n{text}"))
    };

    assert!(pos("policer-action :pa0") < pos("policer :p0"));
    assert!(pos("policer :p0") < pos("port :P0"));
    assert!(pos("interface :if0") < pos("port :P0"));
    assert!(pos("queue :q0") < pos("port :P0"));
    assert!(pos("channel :ch0") < pos("controller :c0"));
    assert!(pos("controller :c0") < pos("bridge :br0"));
    assert!(pos("namespace create site-a") < pos("channel site-a:ch1"));
}

// ── only the committed view is serialised ─────────────────────

#[test]
fn pending_edits_are_not_serialised() {
    let mut ds = Datastore::new();
    let mut dp = MockDataPlane::new();

    run_ok(&mut ds, &mut dp, "policer-action pa create -type discard");
    run_ok(&mut ds, &mut dp, "policer p create -action pa -bandwidth-limit 1501");
    let committed = ds.serialize_all();

    ds.begin_atomic().unwrap();
    run_ok(&mut ds, &mut dp, "policer p config -bandwidth-limit 9999");
    run_ok(&mut ds, &mut dp, "queue q9 create -id 9");

    assert_eq!(ds.serialize_all(), committed, "buffered edits must not leak");

    ds.commit(&mut dp).unwrap();
    let after = ds.serialize_all();
    assert!(after.contains("-bandwidth-limit 9999"));
    assert!(after.contains("queue :q9 create"));
}

// ── escaping ──────────────────────────────────────────────────

#[test]
fn names_with_whitespace_and_quotes_round_trip() {
    let mut ds = Datastore::new();
    let mut dp = MockDataPlane::new();

    run_ok(&mut ds, &mut dp, r#"policer-action "pa one" create -type discard"#);
    run_ok(&mut ds, &mut dp, r#"policer "p\"1" create -action "pa one""#);

    assert!(ds.find(Kind::PolicerAction, ":pa one").is_some());
    assert!(ds.find(Kind::Policer, ":p\"1").is_some());

    let first = ds.serialize_all();
    assert!(first.contains('"'), "names must be quoted: {first}");

    let mut replayed = Datastore::new();
    let mut dp2 = MockDataPlane::new();
    replayed.load_str(&mut dp2, &first).expect("replay");
    assert_eq!(replayed.serialize_all(), first);
}
