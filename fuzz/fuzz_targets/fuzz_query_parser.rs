#![no_main]

use libfuzzer_sys::fuzz_target;
use sqlprism_core::query::{parse, tokenize};

fuzz_target!(|data: &[u8]| {
    // Convert bytes to string (ignore invalid UTF-8)
    if let Ok(sql) = std::str::from_utf8(data) {
        // Limit query length to prevent timeout
        if sql.len() > 10_000 {
            return;
        }

        // Parsing should never panic, and printed statements parse back
        // to the same tree
        if let Ok(tokens) = tokenize(sql) {
            if let Ok(statement) = parse(&tokens) {
                let printed = statement.to_string();
                let reparsed = tokenize(&printed).ok().and_then(|t| parse(&t).ok());
                assert_eq!(reparsed.as_ref(), Some(&statement), "{}", printed);
            }
        }
    }
});
