use std::sync::LazyLock;

use regex::{Captures, NoExpand, Regex};

static SELECT_STAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^SELECT\s+\*").unwrap());
static FIRST_FROM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bFROM\b").unwrap());
static SELECT_KEYWORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bSELECT\s").unwrap());
static MEMBERSHIP_DELAY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)IN\s*\(\s*SELECT SLEEP\((\d+)\),").unwrap());

/// Rewrite a SELECT so that evaluating it takes at least `seconds` per row.
///
/// `SELECT * ...` gets the delay appended after the star; every other
/// statement gets it as the first projected item of each `SELECT`. Delays that
/// landed inside an `IN (SELECT ...)` membership subquery are taken back out,
/// since the server may evaluate those once per outer row.
///
/// This is a textual rewrite, not a parse. Deeply nested subqueries and
/// `SELECT` inside string literals are not handled.
pub fn inject_delay(sql: &str, seconds: u64) -> String {
    let sleep = format!("SLEEP({})", seconds);

    if SELECT_STAR.is_match(sql) {
        let replacement = format!(", {} FROM ", sleep);
        return FIRST_FROM.replace(sql, NoExpand(&replacement)).into_owned();
    }

    let leading = format!("SELECT {}, ", sleep);
    let rewritten = SELECT_KEYWORD.replace_all(sql, NoExpand(&leading));

    // Only undo delays this function inserted; a user's own SLEEP(n) stays.
    let inserted = seconds.to_string();
    MEMBERSHIP_DELAY
        .replace_all(&rewritten, |caps: &Captures| {
            if caps[1] == inserted {
                "IN ( SELECT".to_string()
            } else {
                caps[0].to_string()
            }
        })
        .into_owned()
}
