#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use sqlprism::{Compiler, CompilerConfig, MemoryCatalog, Optimizer};

#[derive(Arbitrary, Debug)]
struct Input {
    sql: String,
    prune_columns: bool,
}

fuzz_target!(|input: Input| {
    if input.sql.len() > 10_000 {
        return;
    }

    let catalog = MemoryCatalog::new()
        .with_table("t", [("id", "int"), ("name", "varchar(10)"), ("x", "decimal")])
        .with_table("u", [("id", "int"), ("t_id", "int"), ("label", "text")]);

    let config = CompilerConfig::new().with_column_pruning(input.prune_columns);
    let Ok(compiler) = Compiler::new(config) else {
        return;
    };

    if let Ok(result) = compiler.compile(&input.sql, &catalog) {
        // A second optimizer pass must not change anything
        if let Some(optimized) = result.optimized {
            let again = Optimizer::new(compiler.config().optimizer).optimize(&optimized, &catalog);
            assert_eq!(again.statement, optimized);
        }
    }
});
