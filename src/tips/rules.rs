//! Wiki Replicas specific knowledge: which tables have faster companion views.

use std::sync::LazyLock;

use regex::Regex;

/// Tables with a `<table>_userindex` view, and the prefix of their user columns.
pub(crate) const USERINDEX_TABLES: &[(&str, &str)] = &[
    ("revision", "rev"),
    ("archive", "ar"),
    ("logging", "log"),
    ("filearchive", "fa"),
    ("ipblocks", "ipb"),
    ("oldimage", "oi"),
    ("recentchanges", "rc"),
];

/// Tables with `actor_<table>` and `comment_<table>` views.
pub(crate) const ACTOR_COMMENT_TABLES: &[&str] = &[
    "filearchive",
    "image",
    "ipblocks",
    "logging",
    "oldimage",
    "protected_titles",
    "recentchanges",
    "revision",
];

pub(crate) const ROW_SCAN_THRESHOLD: u64 = 1_000_000;

pub(crate) const DANGER_OPEN: &str = r#"<span class="text-danger">"#;
pub(crate) const DANGER_CLOSE: &str = "</span>";

pub(crate) struct TableRule {
    pub table: &'static str,
    pub pattern: Regex,
}

pub(crate) static USERINDEX_RULES: LazyLock<Vec<TableRule>> = LazyLock::new(|| {
    USERINDEX_TABLES
        .iter()
        .map(|&(table, prefix)| TableRule {
            table,
            pattern: Regex::new(&format!(r"(?is)\b{}\b.*\b{}_(?:actor|user)", table, prefix)).unwrap(),
        })
        .collect()
});

pub(crate) static ACTOR_COMMENT_RULES: LazyLock<Vec<TableRule>> = LazyLock::new(|| {
    ACTOR_COMMENT_TABLES
        .iter()
        .map(|&table| TableRule {
            table,
            pattern: Regex::new(&format!(r"(?is)\b{}.*\b(actor|comment)\b", table)).unwrap(),
        })
        .collect()
});

pub(crate) static LOGINDEX_FILTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)\blogging\b.*\b(?:log_namespace|log_title|log_page)").unwrap());

pub(crate) static SORT_OR_TEMPORARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Using (?:filesort|temporary)").unwrap());

pub(crate) static RECENT_TABLES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:revision(?:_userindex)?|logging(?:_logindex)?)\b").unwrap()
});

pub(crate) fn userindex_tip(table: &str) -> String {
    format!(
        "You appear to be querying the <code>{table}</code> table and filtering by user. \
         It may be more efficient to use the <code>{table}_userindex</code> view."
    )
}

pub(crate) fn actor_comment_tip(table: &str, attribute: &str) -> String {
    format!(
        "You appear to be querying <code>{attribute}</code> and <code>{table}</code>. \
         If you only care about {attribute}s in the {table} table, use the \
         <a href=\"https://wikitech.wikimedia.org/wiki/News/Actor_storage_changes_on_the_Wiki_Replicas#special-views\">specialized view</a> \
         <code>{attribute}_{table}</code> to avoid unnecessary subqueries."
    )
}

pub(crate) const LOGINDEX_TIP: &str = "You appear to be querying the <code>logging</code> table and \
    filtering by namespace, title or page ID. It may be more efficient to use the \
    <code>logging_logindex</code> view.";

pub(crate) fn filesort_tip(label: &str) -> String {
    format!(
        "Query plan {label} is using \
         <a target=\"_blank\" href=\"https://dev.mysql.com/doc/refman/5.7/en/order-by-optimization.html#order-by-filesort\">filesort</a> \
         or a <a target=\"_blank\" href=\"https://dev.mysql.com/doc/refman/8.0/en/internal-temporary-tables.html\">temporary table</a>. \
         This is usually an indication of an inefficient query. If you find your query is slow, \
         try taking advantage of available indexes to avoid filesort."
    )
}

pub(crate) fn row_scan_tip(label: &str) -> String {
    format!(
        "Query plan {label} scans over a million rows. Your query could likely be improved, \
         or broken out into multiple queries to improve performance."
    )
}

pub(crate) const STATEMENT_TIME_TIP: &str = "When running potentially slow queries in your application, \
    consider prepending <code>SET STATEMENT max_statement_time = <i>N</i> FOR</code> to \
    <a target=\"_blank\" href=\"https://wikitech.wikimedia.org/wiki/Help:Toolforge/Database#Query_Limits\">automatically kill</a> \
    the query after <i>N</i> seconds.";

pub(crate) const RECENT_CHANGES_TIP: &str = "If you only need to query for recent revisions and log actions \
    (within the last 30 days), using <code>recentchanges</code> or <code>recentchanges_userindex</code> \
    might be faster.";
