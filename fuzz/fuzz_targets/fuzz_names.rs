//! Fuzz target: fullname handling
//!
//! Asserts that join/split/substitute never panic and that a successfully
//! joined fullname splits back into its parts.
//!
//! cargo fuzz run fuzz_names

#![no_main]

use libfuzzer_sys::fuzz_target;
use ofp_datastore::names::{fullname, replace_namespace, split_fullname};

fuzz_target!(|input: (&str, &str, &str)| {
    let (ns, local, other_ns) = input;

    if let Ok(full) = fullname(ns, local) {
        let (split_ns, split_local) = split_fullname(&full);
        assert_eq!(split_ns, ns);
        assert_eq!(split_local, local);

        if let Ok(moved) = replace_namespace(&full, other_ns) {
            let (moved_ns, moved_local) = split_fullname(&moved);
            assert_eq!(moved_ns, other_ns);
            assert_eq!(moved_local, local);
        }
    }
});
