//! Operator descriptors: the relation and modifier flags attached to a
//! query entry.

/// The relation half of an [`Op`].
///
/// `None` (on [`Op::relation`]) is the null operator: it carries no
/// constraint and the match engine treats the entry as always-satisfied
/// without ever looking at the key.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Relation {
    Eq,
    Gt,
    Ge,
    Lt,
    Le,
    Ne,
    /// Key must be present; the value is not compared.
    True,
    /// Key must be absent.
    False,
}

impl Relation {
    fn token(self) -> &'static str {
        match self {
            Relation::Eq => "=",
            Relation::Gt => ">",
            Relation::Ge => ">=",
            Relation::Lt => "<",
            Relation::Le => "<=",
            Relation::Ne => "!",
            Relation::True => "T",
            Relation::False => "F",
        }
    }
}

/// The modifier flags, independently combinable, of an [`Op`].
///
/// A hand-rolled bit set rather than a `bitflags!`-generated one: each flag
/// is a plain associated constant over a `u8`, in the style this crate's
/// other small bitfields (severity masks, sink deletion sentinels) use.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Modifiers(u8);

impl Modifiers {
    pub const NONE: Modifiers = Modifiers(0);
    pub const CASEFOLD: Modifiers = Modifiers(1 << 0);
    pub const REGEX: Modifiers = Modifiers(1 << 1);
    pub const NUMERIC: Modifiers = Modifiers(1 << 2);
    pub const PREFIX: Modifiers = Modifiers(1 << 3);
    pub const SUFFIX: Modifiers = Modifiers(1 << 4);
    /// `PREFIX | SUFFIX`, the substring test.
    pub const SUBSTRING: Modifiers = Modifiers(Modifiers::PREFIX.0 | Modifiers::SUFFIX.0);

    pub fn contains(self, flag: Modifiers) -> bool {
        self.0 & flag.0 == flag.0
    }

    pub fn union(self, other: Modifiers) -> Modifiers {
        Modifiers(self.0 | other.0)
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn bits(self) -> u8 {
        self.0
    }
}

impl std::ops::BitOr for Modifiers {
    type Output = Modifiers;
    fn bitor(self, rhs: Modifiers) -> Modifiers {
        self.union(rhs)
    }
}

/// An operator descriptor: a relation paired with modifier flags, as
/// attached to a query entry.
///
/// `raw` carries the full set of bits seen when this `Op` was parsed from
/// text, including any modifier letters not in the documented alphabet
/// (`C R N A Z S`); re-emitting an `Op` preserves those bits even though
/// [`Op::to_token`] only spells out the known ones, so decode-then-encode
/// never silently drops information.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Op {
    pub relation: Option<Relation>,
    pub modifiers: Modifiers,
    pub raw: u32,
}

impl Op {
    /// The null operator: no relation, no modifiers. Always satisfied by
    /// the match engine.
    pub const NULL: Op = Op { relation: None, modifiers: Modifiers::NONE, raw: 0 };

    pub fn new(relation: Relation, modifiers: Modifiers) -> Op {
        Op { relation: Some(relation), modifiers, raw: 0 }
    }

    pub fn is_null(&self) -> bool {
        self.relation.is_none()
    }

    /// Parses an operator token: a single `.` for the null operator, or any
    /// mix of modifier letters and a relation.
    ///
    /// Never fails. Every byte is scanned independently and either sets a
    /// modifier flag, sets the relation, or (if it's not one of the
    /// recognized letters) is silently skipped — an unrecognized byte does
    /// not abort the scan, so whatever recognized modifiers and relation
    /// follow it still take effect. This mirrors the ground-truth
    /// character-by-character scan, which has no error path at all; a
    /// token with no recognized relation character in it (e.g. a bare `Q`)
    /// comes back with `relation: None`, the same as [`Op::NULL`].
    pub fn parse_token(s: &str) -> Op {
        if s == "." {
            return Op::NULL;
        }

        let bytes = s.as_bytes();
        let mut modifiers = Modifiers::NONE;
        let mut relation = None;
        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                b'C' => { modifiers = modifiers.union(Modifiers::CASEFOLD); i += 1; }
                b'R' => { modifiers = modifiers.union(Modifiers::REGEX); i += 1; }
                b'N' => { modifiers = modifiers.union(Modifiers::NUMERIC); i += 1; }
                b'A' => { modifiers = modifiers.union(Modifiers::PREFIX); i += 1; }
                b'Z' => { modifiers = modifiers.union(Modifiers::SUFFIX); i += 1; }
                b'S' => { modifiers = modifiers.union(Modifiers::SUBSTRING); i += 1; }
                b'>' if bytes.get(i + 1) == Some(&b'=') => { relation = Some(Relation::Ge); i += 2; }
                b'<' if bytes.get(i + 1) == Some(&b'=') => { relation = Some(Relation::Le); i += 2; }
                b'=' => { relation = Some(Relation::Eq); i += 1; }
                b'>' => { relation = Some(Relation::Gt); i += 1; }
                b'<' => { relation = Some(Relation::Lt); i += 1; }
                b'!' => { relation = Some(Relation::Ne); i += 1; }
                b'T' => { relation = Some(Relation::True); i += 1; }
                b'F' => { relation = Some(Relation::False); i += 1; }
                _ => i += 1,
            }
        }

        let raw = (modifiers.bits() as u32) | (relation.map(|r| r as u32).unwrap_or(0) << 8);
        Op { relation, modifiers, raw }
    }

    /// Emits the minimal canonical token: modifier letters in the fixed
    /// order `C`, `R`, `N`, then `A`/`Z`/`S` (substring collapses prefix
    /// and suffix to a single `S`), followed by the relation letter.
    pub fn to_token(&self) -> String {
        let Some(relation) = self.relation else {
            return ".".to_string();
        };

        let mut token = String::new();
        if self.modifiers.contains(Modifiers::CASEFOLD) {
            token.push('C');
        }
        if self.modifiers.contains(Modifiers::REGEX) {
            token.push('R');
        }
        if self.modifiers.contains(Modifiers::NUMERIC) {
            token.push('N');
        }
        if self.modifiers.contains(Modifiers::SUBSTRING) {
            token.push('S');
        } else if self.modifiers.contains(Modifiers::PREFIX) {
            token.push('A');
        } else if self.modifiers.contains(Modifiers::SUFFIX) {
            token.push('Z');
        }
        token.push_str(relation.token());
        token
    }
}

impl Default for Op {
    fn default() -> Self {
        Op::NULL
    }
}
