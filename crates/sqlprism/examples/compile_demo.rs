/// Compiler Demo
///
/// Runs a handful of statements through every stage and prints the verdicts
/// and the optimization trace for each.
use sqlprism::{Compiler, CompilerConfig, MemoryCatalog};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== SQLPrism Compiler Demo ===\n");

    let catalog = MemoryCatalog::new()
        .with_table(
            "employees",
            [
                ("id", "int(11)"),
                ("name", "varchar(100)"),
                ("age", "int(11)"),
                ("dept_id", "int(11)"),
            ],
        )
        .with_table("dept", [("id", "int(11)"), ("title", "varchar(50)")])
        .with_table("orders", [("id", "int(11)"), ("status", "char(1)")]);

    let compiler = Compiler::new(CompilerConfig::new())?;

    let queries = [
        "SELECT * FROM employees WHERE 1=1 AND age > 30",
        "SELECT name FROM employees WHERE age > 30 AND age > 25",
        "SELECT e.name FROM employees e JOIN dept d ON d.id = e.dept_id",
        "SELECT id FROM orders WHERE status = 'A' OR status = 'B' OR status = 'C'",
        "SELECT e.name FROM (SELECT * FROM employees WHERE age > 40) e WHERE e.dept_id = 3",
        "SELECT * FROM employees WHERE salary = 1000",
        "SELECT name age FROM employees",
        "SELECT name FROM employees WHERE age > 30 #",
    ];

    for (i, sql) in queries.iter().enumerate() {
        println!("{}. {}", i + 1, sql);
        let result = compiler.compile(sql, &catalog)?;

        println!("   tokens:    {}", result.tokens.len());
        println!("   lexical:   {}", result.lexical);
        println!("   syntax:    {}", result.syntax);
        println!("   semantic:  {}", result.semantic);

        for step in result.trace.iter().skip(1) {
            println!("   -> {}", step.description);
            println!("      {}", step.statement);
        }
        if let Some(optimized) = result.optimized_sql() {
            println!("   optimized: {}", optimized);
        }
        println!();
    }

    // Column pruning rewrites the projection, so it is opt-in
    let pruning = Compiler::new(CompilerConfig::new().with_column_pruning(true))?;
    let result = pruning.compile("SELECT name FROM employees WHERE age > 30", &catalog)?;
    println!("With column pruning:");
    for step in &result.trace {
        println!("   {}: {}", step.description, step.statement);
    }

    println!("\n=== Demo Complete ===");
    Ok(())
}
