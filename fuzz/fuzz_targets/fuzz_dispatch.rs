//! Fuzz target: full command dispatch
//!
//! Feeds arbitrary text line by line into a fresh datastore backed by the
//! accept-all data plane and asserts the dispatcher never panics, whatever
//! the command mix.
//!
//! cargo fuzz run fuzz_dispatch

#![no_main]

use libfuzzer_sys::fuzz_target;
use ofp_datastore::Datastore;
use ofp_datastore::adapters::null_dp::NullDataPlane;

fuzz_target!(|data: &str| {
    let mut ds = Datastore::new();
    let mut dp = NullDataPlane::new();

    for line in data.lines().take(64) {
        let _ = ds.handle_line(&mut dp, line);
    }

    // whatever happened, the committed view must serialise and replay
    let serialized = ds.serialize_all();
    let mut replayed = Datastore::new();
    let mut dp2 = NullDataPlane::new();
    if replayed.load_str(&mut dp2, &serialized).is_ok() {
        assert_eq!(replayed.serialize_all(), serialized);
    }
});
