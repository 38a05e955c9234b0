use sqlprism::logging::LogConfig;
use sqlprism::{Compiler, MemoryCatalog};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Trace level also logs every rewrite rule that fires
    let _guard = LogConfig::trace().init()?;

    println!("=== SQLPrism Logging Demo ===\n");

    let catalog = MemoryCatalog::new().with_table(
        "employees",
        [("id", "int(11)"), ("name", "varchar(100)"), ("age", "int(11)")],
    );
    let compiler = Compiler::default();

    println!("\n1. Accepted statement...");
    compiler.compile("SELECT * FROM employees WHERE 1=1 AND age > 30 AND age > 25", &catalog)?;

    println!("\n2. Semantic error...");
    compiler.compile("SELECT bonus FROM employees", &catalog)?;

    println!("\n3. Syntax error...");
    compiler.compile("SELECT name FROM employees WHERE (age > 3", &catalog)?;

    println!("\n4. Lexical error...");
    compiler.compile("SELECT $ FROM employees", &catalog)?;

    println!("\n=== Demo Complete ===");
    println!("Check the logs above to see tracing output!");

    Ok(())
}
