//! The canonical bracketed textual form: `[key value]` groups for a
//! `Message`, `Q [op key value]` groups for a `Query`, and the `N\n`-headed
//! list form wrapping a sequence of either.

use crate::codec::escape::{canonical_decode, canonical_encode};
use crate::op::Op;
use crate::record::Record;

fn split_unescaped(s: &str, sep: char) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start = 0;
    let mut escaped = false;
    for (i, c) in s.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        if c == '\\' {
            escaped = true;
            continue;
        }
        if c == sep {
            tokens.push(&s[start..i]);
            start = i + c.len_utf8();
        }
    }
    tokens.push(&s[start..]);
    tokens
}

fn skip_spaces(s: &str, mut i: usize) -> usize {
    while s.as_bytes().get(i) == Some(&b' ') {
        i += 1;
    }
    i
}

/// Finds the byte offset of the unescaped `]` matching the `[` at `open`.
fn find_group_end(s: &str, open: usize) -> Option<usize> {
    let mut escaped = false;
    for (i, c) in s.char_indices().skip(open + 1) {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            ']' => return Some(i),
            _ => {}
        }
    }
    None
}

fn decode_group(inner: &str, is_query: bool, record: &mut Record) -> Option<()> {
    if inner.is_empty() {
        return None; // a group with zero tokens is malformed (§9)
    }
    let tokens = split_unescaped(inner, ' ');

    if is_query {
        let (op_tok, key_tok, value_tok) = match tokens.as_slice() {
            [op, key] => (*op, *key, None),
            [op, key, value] => (*op, *key, Some(*value)),
            _ => return None,
        };
        let op = Op::parse_token(op_tok);
        let key = canonical_decode(key_tok).ok()?;
        let value = value_tok.map(canonical_decode).transpose().ok()?;
        record.set_query(&key, value.as_deref(), op).ok()?;
    } else {
        let (key_tok, value_tok) = match tokens.as_slice() {
            [key] => (*key, None),
            [key, value] => (*key, Some(*value)),
            _ => return None,
        };
        let key = canonical_decode(key_tok).ok()?;
        let value = value_tok.map(canonical_decode).transpose().ok()?;
        record.set(&key, value.as_deref()).ok()?;
    }
    Some(())
}

/// Parses one record from its canonical textual form.
///
/// Returns `None` on any parse failure: an unterminated or unknown escape,
/// a malformed operator token, or a group that is not `[key]`,
/// `[key value]`, `[op key]`, or `[op key value]`. A leading bare decimal
/// integer (a legacy length prefix) is skipped.
pub fn decode(s: &str) -> Option<Record> {
    let mut i = skip_spaces(s, 0);

    let digit_run_end = {
        let mut j = i;
        while s.as_bytes().get(j).is_some_and(u8::is_ascii_digit) {
            j += 1;
        }
        j
    };
    if digit_run_end > i {
        i = skip_spaces(s, digit_run_end);
    }

    let is_query = if s[i..].starts_with('Q')
        && matches!(s.as_bytes().get(i + 1), None | Some(b' '))
    {
        i = skip_spaces(s, i + 1);
        true
    } else {
        false
    };

    let mut record = if is_query { Record::new_query() } else { Record::empty_message() };
    let mut saw_group = false;

    loop {
        i = skip_spaces(s, i);
        if i >= s.len() {
            break;
        }
        if s.as_bytes()[i] != b'[' {
            return None; // trailing garbage outside any group
        }
        let end = find_group_end(s, i)?;
        decode_group(&s[i + 1..end], is_query, &mut record)?;
        saw_group = true;
        i = end + 1;
    }

    saw_group.then_some(record)
}

/// Serializes one record to its canonical textual form. Does not append a
/// trailing newline; callers that need the list-form or raw-format
/// separator add it themselves.
pub fn encode(record: &Record) -> String {
    let mut out = String::new();
    if record.is_query() {
        out.push_str("Q ");
    }
    for i in 0..record.len() {
        if i > 0 {
            out.push(' ');
        }
        out.push('[');
        if record.is_query() {
            out.push_str(&record.op_at(i).unwrap_or_default().to_token());
            out.push(' ');
        }
        out.push_str(&canonical_encode(record.key_at(i).unwrap(), true));
        if let Some(value) = record.value_at(i).unwrap() {
            out.push(' ');
            out.push_str(&canonical_encode(value, false));
        }
        out.push(']');
    }
    out
}

/// Serializes a sequence of records under the `N\n record\n …` list form.
pub fn encode_list(records: &[Record]) -> String {
    let mut out = format!("{}\n", records.len());
    for record in records {
        out.push_str(&encode(record));
        out.push('\n');
    }
    out
}

/// Parses a list-form byte stream, or `None` if the header count doesn't
/// match the number of records found or any record fails to parse.
pub fn decode_list(s: &str) -> Option<Vec<Record>> {
    let mut lines = s.split('\n');
    let count: usize = lines.next()?.trim().parse().ok()?;
    let mut records = Vec::with_capacity(count);
    for line in lines {
        if line.is_empty() {
            continue;
        }
        records.push(decode(line)?);
    }
    (records.len() == count).then_some(records)
}
