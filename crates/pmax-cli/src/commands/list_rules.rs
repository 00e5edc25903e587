//! List rules command implementation.

use pmax_rules::all_rules;

/// Runs the list-rules command.
pub fn run() {
    println!("Available rules:\n");
    println!("{:<18} {:<16} Description", "Codes", "Name");
    println!("{}", "-".repeat(80));

    for rule in all_rules() {
        let codes = if rule.codes().is_empty() {
            rule.code().to_string()
        } else {
            rule.codes().join(",")
        };
        println!("{:<18} {:<16} {}", codes, rule.name(), rule.description());
    }

    println!("\nPresets:");
    println!("  recommended  - no-deprecated (default)");
    println!("  all          - every built-in rule");

    println!("\nUse --rules to filter specific rules, e.g.:");
    println!("  pmax check --rules no-deprecated");
    println!("  pmax check --rules PMAX001");
}
