//! Fuzz target: `cmd::tokenize`
//!
//! Drives arbitrary text through the command-line tokenizer and asserts
//! that it never panics and that escaping a produced token re-tokenises
//! to the identical token.
//!
//! cargo fuzz run fuzz_tokenizer

#![no_main]

use libfuzzer_sys::fuzz_target;
use ofp_datastore::cmd::{escape_name, tokenize};

fuzz_target!(|data: &str| {
    let Ok(tokens) = tokenize(data) else {
        return;
    };

    // escape ∘ tokenize must be the identity on every produced token
    for token in &tokens {
        let escaped = escape_name(token);
        let round = tokenize(&escaped).expect("escaped token must tokenize");
        assert_eq!(round.len(), 1, "escaping must yield one token");
        assert_eq!(&round[0], token, "escape round-trip changed the token");
    }
});
