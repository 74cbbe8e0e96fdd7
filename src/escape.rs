//! Injection-safe literal escaping for the two text protocols the
//! bridge writes into. Each function is safe for exactly one sink;
//! never feed one escaper's output to the other's protocol.

/// Escapes a string for splicing into a double-quoted AppleScript
/// literal. Backslashes are doubled before quotes are escaped so the
/// inserted backslashes are not themselves re-escaped.
pub fn script_literal(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Escapes a string for splicing into a single-quoted SQLite literal.
pub fn sql_literal(s: &str) -> String {
    s.replace('\'', "''")
}
