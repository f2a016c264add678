//! The query evaluation engine: matching a `Query` record against a
//! `Message` record.

use crate::op::{Modifiers, Op, Relation};
use crate::record::{keys, Record};
use crate::time;
use regex::RegexBuilder;

fn compare_bytes(relation: Relation, lhs: &[u8], rhs: &[u8]) -> bool {
    match relation {
        Relation::Eq => lhs == rhs,
        Relation::Ne => lhs != rhs,
        Relation::Gt => lhs > rhs,
        Relation::Ge => lhs >= rhs,
        Relation::Lt => lhs < rhs,
        Relation::Le => lhs <= rhs,
        Relation::True | Relation::False => false,
    }
}

fn compare_numeric(relation: Relation, lhs: i64, rhs: i64) -> bool {
    match relation {
        Relation::Eq => lhs == rhs,
        Relation::Ne => lhs != rhs,
        Relation::Gt => lhs > rhs,
        Relation::Ge => lhs >= rhs,
        Relation::Lt => lhs < rhs,
        Relation::Le => lhs <= rhs,
        Relation::True | Relation::False => false,
    }
}

fn test_substring(relation: Relation, qv: &[u8], mv: &[u8], casefold: bool) -> bool {
    if matches!(relation, Relation::Gt | Relation::Lt) {
        return false;
    }
    if qv.is_empty() {
        return matches!(relation, Relation::Eq | Relation::Ge | Relation::Le);
    }
    if qv.len() > mv.len() {
        return relation == Relation::Ne;
    }

    let eq = |a: &[u8], b: &[u8]| -> bool {
        if casefold {
            a.eq_ignore_ascii_case(b)
        } else {
            a == b
        }
    };

    let any_match = mv.windows(qv.len()).any(|w| eq(w, qv));
    if relation == Relation::Ne {
        !any_match
    } else {
        any_match
    }
}

fn test_prefix(relation: Relation, qv: &[u8], mv: &[u8], casefold: bool) -> bool {
    if qv.len() > mv.len() {
        return relation == Relation::Ne;
    }
    let head = &mv[..qv.len()];
    if casefold {
        compare_bytes(relation, &head.to_ascii_lowercase(), &qv.to_ascii_lowercase())
    } else {
        compare_bytes(relation, head, qv)
    }
}

fn test_suffix(relation: Relation, qv: &[u8], mv: &[u8], casefold: bool) -> bool {
    if qv.len() > mv.len() {
        return relation == Relation::Ne;
    }
    let tail = &mv[mv.len() - qv.len()..];
    if casefold {
        compare_bytes(relation, &tail.to_ascii_lowercase(), &qv.to_ascii_lowercase())
    } else {
        compare_bytes(relation, tail, qv)
    }
}

fn test_regex(relation: Relation, qv: &[u8], mv: &[u8], casefold: bool) -> bool {
    if matches!(relation, Relation::Gt | Relation::Lt) {
        return false;
    }
    let (Ok(pattern), Ok(haystack)) = (std::str::from_utf8(qv), std::str::from_utf8(mv)) else {
        return relation == Relation::Ne;
    };
    let Ok(re) = RegexBuilder::new(pattern).case_insensitive(casefold).build() else {
        return relation == Relation::Ne;
    };
    let is_match = re.is_match(haystack);
    relation_xor_ne(relation, is_match)
}

fn relation_xor_ne(relation: Relation, is_match: bool) -> bool {
    is_match ^ (relation == Relation::Ne)
}

fn test_numeric(relation: Relation, qv: &[u8], mv: &[u8]) -> bool {
    let parsed = std::str::from_utf8(qv).ok().and_then(|s| s.trim().parse::<i64>().ok())
        .zip(std::str::from_utf8(mv).ok().and_then(|s| s.trim().parse::<i64>().ok()));
    match parsed {
        Some((q, m)) => compare_numeric(relation, m, q),
        None => relation == Relation::Ne,
    }
}

fn test_default(relation: Relation, qv: &[u8], mv: &[u8], casefold: bool) -> bool {
    if casefold {
        compare_bytes(relation, &mv.to_ascii_lowercase(), &qv.to_ascii_lowercase())
    } else {
        compare_bytes(relation, mv, qv)
    }
}

/// Evaluates one query entry against a message value, dispatching by
/// operator class (§4.D).
fn test_expression(op: &Op, qv: &[u8], mv: &[u8]) -> bool {
    let relation = op.relation.expect("null operator handled by caller");
    let casefold = op.modifiers.contains(Modifiers::CASEFOLD);

    if op.modifiers.contains(Modifiers::REGEX) {
        return test_regex(relation, qv, mv, casefold);
    }
    if op.modifiers.contains(Modifiers::NUMERIC) {
        return test_numeric(relation, qv, mv);
    }
    match (op.modifiers.contains(Modifiers::PREFIX), op.modifiers.contains(Modifiers::SUFFIX)) {
        (true, true) => test_substring(relation, qv, mv, casefold),
        (true, false) => test_prefix(relation, qv, mv, casefold),
        (false, true) => test_suffix(relation, qv, mv, casefold),
        (false, false) => test_default(relation, qv, mv, casefold),
    }
}

/// Evaluates a single query entry (`relation`, `modifiers`, `key`, `value`)
/// against a candidate message, implementing the full decision tree of
/// §4.D including the `Time`-key fast path and the null-operator,
/// key-presence, and key-absence short circuits.
fn entry_matches(op: &Op, key: &[u8], value: Option<&[u8]>, msg: &Record) -> bool {
    let Some(relation) = op.relation else {
        return true; // no constraint at all
    };

    if relation == Relation::True {
        return msg.contains_key_bytes(key);
    }
    if relation == Relation::False {
        return !msg.contains_key_bytes(key);
    }

    let key_str = match std::str::from_utf8(key) {
        Ok(s) => s,
        Err(_) => return relation == Relation::Ne,
    };

    let Some(mv) = msg.get(key_str) else {
        return relation == Relation::Ne;
    };
    let qv = value.unwrap_or(b"");

    let is_time_key = key_str == keys::TIME;
    let substring_or_regex = op.modifiers.contains(Modifiers::PREFIX)
        || op.modifiers.contains(Modifiers::SUFFIX)
        || op.modifiers.contains(Modifiers::REGEX);

    if is_time_key && !substring_or_regex {
        if let (Some(qt), Some(mt)) = (
            std::str::from_utf8(qv).ok().and_then(time::parse_time),
            std::str::from_utf8(mv).ok().and_then(time::parse_time),
        ) {
            return compare_numeric(relation, mt, qt);
        }
    }

    test_expression(op, qv, mv)
}

/// Evaluates `query` against `msg`: the conjunction of every query entry.
/// An empty query matches every message.
pub fn matches(query: &Record, msg: &Record) -> bool {
    (0..query.len()).all(|i| {
        let op = query.op_at(i).unwrap_or_default();
        let key = query.key_at(i).unwrap();
        let value = query.value_at(i).unwrap();
        entry_matches(&op, key, value, msg)
    })
}
