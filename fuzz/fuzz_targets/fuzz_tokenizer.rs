#![no_main]

use libfuzzer_sys::fuzz_target;
use sqlprism_core::query::tokenize;

fuzz_target!(|data: &[u8]| {
    if let Ok(sql) = std::str::from_utf8(data) {
        if sql.len() > 10_000 {
            return;
        }

        // Positions are character offsets and must stay inside the input
        match tokenize(sql) {
            Ok(tokens) => {
                let length = sql.chars().count();
                for token in &tokens {
                    assert!(token.position < length);
                    assert!(!token.text.is_empty());
                }
            }
            Err(e) => assert!(e.position < sql.chars().count()),
        }
    }
});
