//! The structured message model: ordered attribute records, either concrete
//! log messages or queries over them.

use crate::error::InputShapeError;
use crate::level::Level;
use crate::op::Op;
use std::str::FromStr;

/// Standard attribute key names, recognized by the formatter and the
/// default-message builder.
pub mod keys {
    pub const TIME: &str = "Time";
    pub const TIME_NANO_SEC: &str = "TimeNanoSec";
    pub const HOST: &str = "Host";
    pub const SENDER: &str = "Sender";
    pub const PID: &str = "PID";
    pub const UID: &str = "UID";
    pub const GID: &str = "GID";
    pub const LEVEL: &str = "Level";
    pub const MESSAGE: &str = "Message";
    pub const FACILITY: &str = "Facility";
    pub const REF_PROC: &str = "RefProc";
    pub const REF_PID: &str = "RefPID";
    pub const ASL_MESSAGE_ID: &str = "ASLMessageID";
    pub const ASL_OPTION: &str = "ASLOption";
}

/// The default-message skeleton's key order, per `new_message`.
const DEFAULT_MESSAGE_KEYS: [&str; 8] = [
    keys::TIME, keys::HOST, keys::SENDER, keys::PID,
    keys::UID, keys::GID, keys::LEVEL, keys::MESSAGE,
];

#[derive(Clone, Debug, Eq, PartialEq)]
struct Entry {
    key: Box<[u8]>,
    value: Option<Box<[u8]>>,
    op: Op,
}

/// The shared ordered-vec storage behind both [`Record`] variants.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
struct Entries(Vec<Entry>);

impl Entries {
    fn position(&self, key: &[u8]) -> Option<usize> {
        self.0.iter().position(|e| &*e.key == key)
    }

    fn get(&self, key: &str) -> Option<&[u8]> {
        self.position(key.as_bytes()).and_then(|i| self.0[i].value.as_deref())
    }

    fn unset(&mut self, key: &str) {
        if let Some(i) = self.position(key.as_bytes()) {
            self.0.remove(i);
        }
    }

    fn len(&self) -> usize {
        self.0.len()
    }

    fn key_at(&self, index: usize) -> Option<&[u8]> {
        self.0.get(index).map(|e| &*e.key)
    }

    fn op_at(&self, index: usize) -> Option<Op> {
        self.0.get(index).map(|e| e.op)
    }

    fn value_at(&self, index: usize) -> Option<Option<&[u8]>> {
        self.0.get(index).map(|e| e.value.as_deref())
    }
}

fn check_no_nul(key: &[u8], value: Option<&[u8]>) -> Result<(), InputShapeError> {
    if key.contains(&0) {
        return Err(InputShapeError::NulByteInKey);
    }
    if let Some(v) = value {
        if v.contains(&0) {
            return Err(InputShapeError::NulByteInValue);
        }
    }
    Ok(())
}

/// Trims one or more trailing `\n` bytes from a `Message` attribute value,
/// per the record store's special-case normalization.
fn normalize_message_value(value: &[u8]) -> &[u8] {
    let mut end = value.len();
    while end > 0 && value[end - 1] == b'\n' {
        end -= 1;
    }
    &value[..end]
}

/// Validates and normalizes a `Level` attribute value: a decimal digit
/// `'0'..='7'`, or one of the English level names (case-insensitive).
/// Stores the single ASCII digit on success.
fn normalize_level_value(value: &[u8]) -> Result<Box<[u8]>, InputShapeError> {
    let text = std::str::from_utf8(value)
        .map_err(|_| InputShapeError::InvalidLevel(String::from_utf8_lossy(value).into_owned()))?;
    let level = Level::from_str(text)
        .map_err(|_| InputShapeError::InvalidLevel(text.to_string()))?;
    Ok(level.as_u8().to_string().into_bytes().into_boxed_slice())
}

/// A concrete log message: an ordered sequence of key/value attribute
/// entries with replace-on-`set` semantics.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct MessageRecord {
    entries: Entries,
}

/// A query: an ordered sequence of key/value/operator entries, AND-combined
/// and matched against message records by [`crate::matcher::matches`].
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct QueryRecord {
    entries: Entries,
}

/// A record, either a concrete [`MessageRecord`] or a [`QueryRecord`].
///
/// The variant is fixed at construction: entries in a `Message` carry no
/// operator semantics (their `Op` is always [`Op::NULL`]), while entries in
/// a `Query` carry whatever operator they were given.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Record {
    Message(MessageRecord),
    Query(QueryRecord),
}

impl Record {
    /// Builds a new, empty query.
    pub fn new_query() -> Record {
        Record::Query(QueryRecord::default())
    }

    /// Builds an empty message with none of [`Record::new_message`]'s
    /// default keys, for the textual decoder to populate entry-by-entry.
    pub fn empty_message() -> Record {
        Record::Message(MessageRecord::default())
    }

    /// Builds the default eight-key message skeleton: `Time`, `Host`,
    /// `Sender`, `PID`, `UID`, `GID`, `Level`, `Message`, each present with
    /// a null value, in that order.
    pub fn new_message() -> Record {
        let mut entries = Entries::default();
        for key in DEFAULT_MESSAGE_KEYS {
            entries.0.push(Entry { key: key.as_bytes().into(), value: None, op: Op::NULL });
        }
        Record::Message(MessageRecord { entries })
    }

    pub fn is_message(&self) -> bool {
        matches!(self, Record::Message(_))
    }

    pub fn is_query(&self) -> bool {
        matches!(self, Record::Query(_))
    }

    fn entries(&self) -> &Entries {
        match self {
            Record::Message(m) => &m.entries,
            Record::Query(q) => &q.entries,
        }
    }

    /// Sets `key` to `value` with the null operator. On a `Message`, an
    /// existing entry's value is replaced in place; on a `Query`, a new
    /// entry is appended (so repeated calls with the same key AND-combine
    /// independent constraints).
    pub fn set(&mut self, key: &[u8], value: Option<&[u8]>) -> Result<(), InputShapeError> {
        self.set_query(key, value, Op::NULL)
    }

    /// Like [`Record::set`], but also records an operator. Meaningless
    /// (but harmless) on a `Message`, where operators are never consulted.
    pub fn set_query(&mut self, key: &[u8], value: Option<&[u8]>, op: Op) -> Result<(), InputShapeError> {
        check_no_nul(key, value)?;

        let normalized_value = if key == keys::MESSAGE.as_bytes() {
            value.map(normalize_message_value).map(Box::from)
        } else if key == keys::LEVEL.as_bytes() {
            match value {
                Some(v) => Some(normalize_level_value(v)?),
                None => None,
            }
        } else {
            value.map(Box::from)
        };

        match self {
            Record::Message(m) => {
                if let Some(i) = m.entries.position(key) {
                    m.entries.0[i].value = normalized_value;
                } else {
                    m.entries.0.push(Entry { key: key.into(), value: normalized_value, op: Op::NULL });
                }
            }
            Record::Query(q) => {
                q.entries.0.push(Entry { key: key.into(), value: normalized_value, op });
            }
        }
        Ok(())
    }

    /// Removes the first entry with a matching key, if any.
    pub fn unset(&mut self, key: &str) {
        match self {
            Record::Message(m) => m.entries.unset(key),
            Record::Query(q) => q.entries.unset(key),
        }
    }

    /// The first entry's value for `key`, if present.
    pub fn get(&self, key: &str) -> Option<&[u8]> {
        self.entries().get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries().position(key.as_bytes()).is_some()
    }

    /// Like [`Record::contains_key`], but takes a raw byte key so the
    /// match engine can test `TRUE`/`FALSE` presence constraints without
    /// requiring the query's key to be valid UTF-8.
    pub fn contains_key_bytes(&self, key: &[u8]) -> bool {
        self.entries().position(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn key_at(&self, index: usize) -> Option<&[u8]> {
        self.entries().key_at(index)
    }

    pub fn value_at(&self, index: usize) -> Option<Option<&[u8]>> {
        self.entries().value_at(index)
    }

    /// The operator for the entry at `index`. Always [`Op::NULL`] on a
    /// `Message`.
    pub fn op_at(&self, index: usize) -> Option<Op> {
        self.entries().op_at(index)
    }

    /// Iterates `(key, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&[u8], Option<&[u8]>)> {
        (0..self.len()).map(move |i| (self.key_at(i).unwrap(), self.value_at(i).unwrap()))
    }

    /// Structural comparison unifying message equality and query-as-message
    /// equality: two records compare equal if they have the same variant,
    /// the same entry count, and every key/value pair matches in order.
    /// Operators are not considered (this is not query matching; see
    /// [`crate::matcher::matches`] for that).
    pub fn compare(&self, other: &Record) -> bool {
        if self.is_message() != other.is_message() {
            return false;
        }
        if self.len() != other.len() {
            return false;
        }
        (0..self.len()).all(|i| {
            self.key_at(i) == other.key_at(i) && self.value_at(i) == other.value_at(i)
        })
    }
}
