//! Heuristic advice derived from a captured plan and the SQL that produced it.
//!
//! [`analyze`] is a pure function: same input, same [`TipSet`]. It also marks
//! `Using filesort` / `Using temporary` in each plan row's `Extra` column, and
//! running it again over already-marked rows changes nothing.

mod rules;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Serialize, Serializer};

use crate::explain::PlanRow;
use rules::*;

static MARKED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        "{}((?i:Using (?:filesort|temporary))){}",
        regex::escape(DANGER_OPEN),
        regex::escape(DANGER_CLOSE)
    ))
    .unwrap()
});

/// Where a tip applies: a plan row (0-based position) or the whole query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TipKey {
    Row(usize),
    Global,
}

impl fmt::Display for TipKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TipKey::Row(i) => write!(f, "{}", i),
            TipKey::Global => f.write_str("*"),
        }
    }
}

impl Serialize for TipKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Advice grouped by kind. Lists keep insertion order and never hold duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TipSet {
    /// Table-specific suggestions (companion views).
    pub specific: BTreeMap<TipKey, Vec<String>>,
    /// Plan-shape warnings and query-wide advice.
    pub general: BTreeMap<TipKey, Vec<String>>,
}

impl TipSet {
    pub fn is_empty(&self) -> bool {
        self.specific.is_empty() && self.general.is_empty()
    }

    pub fn len(&self) -> usize {
        self.specific.values().chain(self.general.values()).map(Vec::len).sum()
    }

    fn push_specific(&mut self, key: TipKey, tip: String) {
        push_unique(&mut self.specific, key, tip);
    }

    fn push_general(&mut self, key: TipKey, tip: String) {
        push_unique(&mut self.general, key, tip);
    }
}

fn push_unique(map: &mut BTreeMap<TipKey, Vec<String>>, key: TipKey, tip: String) {
    if tip.is_empty() {
        return;
    }
    let tips = map.entry(key).or_default();
    if !tips.contains(&tip) {
        tips.push(tip);
    }
}

/// Produce tips for `sql` and its plan, marking dangerous `Extra` phrases in place.
///
/// `None` means the plan is unavailable (the capture failed), in which case no
/// advice is given at all.
pub fn analyze(sql: &str, plan: Option<&mut [PlanRow]>) -> TipSet {
    let mut tips = TipSet::default();
    let Some(plan) = plan else {
        return tips;
    };

    for rule in USERINDEX_RULES.iter() {
        if rule.pattern.is_match(sql) {
            tips.push_specific(TipKey::Row(0), userindex_tip(rule.table));
        }
    }

    for rule in ACTOR_COMMENT_RULES.iter() {
        if let Some(caps) = rule.pattern.captures(sql) {
            let attribute = caps[1].to_lowercase();
            tips.push_specific(TipKey::Row(0), actor_comment_tip(rule.table, &attribute));
        }
    }

    if LOGINDEX_FILTER.is_match(sql) {
        tips.push_specific(TipKey::Row(0), LOGINDEX_TIP.to_string());
    }

    for (index, row) in plan.iter_mut().enumerate() {
        if let Some(extra) = row.extra.as_deref() {
            if SORT_OR_TEMPORARY.is_match(extra) {
                let marked = mark_danger(extra);
                tips.push_general(TipKey::Row(index), filesort_tip(&row.label(index)));
                row.extra = Some(marked);
            }
        }

        if row.rows.is_some_and(|rows| rows > ROW_SCAN_THRESHOLD) {
            tips.push_general(TipKey::Row(index), row_scan_tip(&row.label(index)));
        }
    }

    if !tips.is_empty() {
        tips.push_general(TipKey::Global, STATEMENT_TIME_TIP.to_string());
        if RECENT_TABLES.is_match(sql) {
            tips.push_general(TipKey::Global, RECENT_CHANGES_TIP.to_string());
        }
    }

    tips
}

/// Wrap each `Using filesort` / `Using temporary` in the danger marker exactly once.
fn mark_danger(extra: &str) -> String {
    let plain = MARKED.replace_all(extra, "${1}");
    let wrapped = format!("{}${{0}}{}", DANGER_OPEN, DANGER_CLOSE);
    SORT_OR_TEMPORARY.replace_all(&plain, wrapped.as_str()).into_owned()
}
