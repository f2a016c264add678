//! Rendering a `Message` record into one of the output modes: `raw`, `std`,
//! `bsd`, `xml`, `msg`, or a printf-like template (§4.E, §6).

use base64::Engine;

use crate::codec::escape::{canonical_encode, safe_encode, xml_escape};
use crate::codec::text;
use crate::level::Level;
use crate::record::{keys, Record};
use crate::time;

/// Which of the output modes to render a `Message` under.
///
/// `Template` covers every non-empty selector string that isn't one of the
/// five named modes, per §6's format-selector table ("any other non-empty
/// string" is a template).
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum MsgFormat {
    Raw,
    Std,
    Bsd,
    Xml,
    Msg,
    Template(String),
}

impl MsgFormat {
    /// Parses a format-selector string per the §6 table.
    pub fn from_selector(s: &str) -> MsgFormat {
        match s {
            "raw" => MsgFormat::Raw,
            "std" => MsgFormat::Std,
            "bsd" => MsgFormat::Bsd,
            "xml" => MsgFormat::Xml,
            "msg" => MsgFormat::Msg,
            other => MsgFormat::Template(other.to_string()),
        }
    }
}

/// Which textual representation the `Time` attribute (and template `$Time`
/// substitutions) are rendered under.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TimeFormat {
    /// Integer seconds since the epoch.
    Sec,
    /// `YYYY.MM.DD HH:MM:SS UTC`.
    Utc,
    /// ctime local time, truncated at 19 characters.
    Lcl,
}

impl TimeFormat {
    /// Parses a time-format selector string per the §6 table. Unrecognized
    /// selectors fall back to `Sec`.
    pub fn from_selector(s: &str) -> TimeFormat {
        match s {
            "utc" => TimeFormat::Utc,
            "lcl" => TimeFormat::Lcl,
            _ => TimeFormat::Sec,
        }
    }

    fn render(self, secs: i64) -> String {
        match self {
            TimeFormat::Sec => secs.to_string(),
            TimeFormat::Utc => time::format_utc(secs),
            TimeFormat::Lcl => time::format_lcl(secs).chars().take(19).collect(),
        }
    }
}

/// The character-encoding policy applied to attribute values as they're
/// embedded in a rendered message (§4.A, §6).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Encoding {
    /// Identity: bytes pass through unchanged.
    None,
    /// §4.A safe encoding (terminal-friendly).
    Safe,
    /// §4.A canonical encoding with brackets and meta bytes escaped.
    Asl,
}

impl Encoding {
    /// Parses an encoding-selector string per the §6 table. Unrecognized
    /// selectors fall back to `None`.
    pub fn from_selector(s: &str) -> Encoding {
        match s {
            "safe" => Encoding::Safe,
            "asl" => Encoding::Asl,
            _ => Encoding::None,
        }
    }

    fn encode(self, bytes: &[u8]) -> Vec<u8> {
        match self {
            Encoding::None => bytes.to_vec(),
            Encoding::Safe => safe_encode(bytes),
            Encoding::Asl => canonical_encode(bytes, false).into_bytes(),
        }
    }
}

fn time_seconds(msg: &Record) -> Option<i64> {
    msg.get(keys::TIME).and_then(|v| std::str::from_utf8(v).ok()).and_then(time::parse_time)
}

fn text_or_unknown<'a>(msg: &'a Record, key: &str) -> &'a [u8] {
    msg.get(key).unwrap_or(b"unknown")
}

fn format_raw(msg: &Record, tfmt: TimeFormat) -> Vec<u8> {
    let mut rendered = msg.clone();
    if tfmt != TimeFormat::Sec {
        if let Some(secs) = time_seconds(msg) {
            let text = tfmt.render(secs);
            let _ = rendered.set(keys::TIME.as_bytes(), Some(text.as_bytes()));
        }
    }
    let mut out = text::encode(&rendered).into_bytes();
    out.push(b'\n');
    out
}

fn format_msg(msg: &Record, enc: Encoding) -> Vec<u8> {
    let mut out = enc.encode(msg.get(keys::MESSAGE).unwrap_or(b""));
    out.push(b'\n');
    out
}

fn format_bsd(msg: &Record, tfmt: TimeFormat, enc: Encoding, with_level: bool) -> Vec<u8> {
    let secs = time_seconds(msg).unwrap_or(0);
    let pid = msg.get(keys::PID);
    let ref_proc = msg.get(keys::REF_PROC);
    let ref_pid = msg.get(keys::REF_PID);

    let mut out = Vec::new();
    out.extend_from_slice(tfmt.render(secs).as_bytes());
    out.push(b' ');
    out.extend_from_slice(&enc.encode(text_or_unknown(msg, keys::HOST)));
    out.push(b' ');
    out.extend_from_slice(&enc.encode(text_or_unknown(msg, keys::SENDER)));

    if let Some(pid) = pid {
        // Exact byte comparison against the literal, matching the source's
        // `strcmp(pstr, "-1")`: the raw attribute string is never reparsed
        // as an integer, and it's printed back out verbatim.
        if pid != b"-1" {
            out.push(b'[');
            out.extend_from_slice(pid);
            out.push(b']');
        }
    }

    if ref_proc.is_some() || ref_pid.is_some() {
        out.extend_from_slice(b" (");
        out.extend_from_slice(&enc.encode(ref_proc.unwrap_or(b"")));
        out.push(b'[');
        out.extend_from_slice(ref_pid.unwrap_or(b""));
        out.push(b']');
        out.push(b')');
    }

    if with_level {
        out.push(b' ');
        let level_name = msg
            .get(keys::LEVEL)
            .and_then(|v| std::str::from_utf8(v).ok())
            .and_then(|s| s.trim().parse::<u8>().ok())
            .and_then(Level::from_u8)
            .map(|l| l.std_name().to_ascii_uppercase())
            .unwrap_or_else(|| "Unknown".to_string());
        out.extend_from_slice(level_name.as_bytes());
    }

    out.extend_from_slice(b": ");
    out.extend_from_slice(&enc.encode(msg.get(keys::MESSAGE).unwrap_or(b"")));
    out.push(b'\n');
    out
}

fn format_xml(msg: &Record, tfmt: TimeFormat) -> Vec<u8> {
    let mut out = String::new();
    out.push_str("<dict>\n");
    for i in 0..msg.len() {
        let key = msg.key_at(i).unwrap();
        let Ok(key_str) = std::str::from_utf8(key) else { continue };
        let value = msg.value_at(i).unwrap().unwrap_or(b"");

        out.push_str("\t<key>");
        out.push_str(&xml_escape(key_str));
        out.push_str("</key>\n\t");

        let rendered: std::borrow::Cow<[u8]> = if key_str == keys::TIME {
            let secs = std::str::from_utf8(value).ok().and_then(time::parse_time).unwrap_or(0);
            std::borrow::Cow::Owned(tfmt.render(secs).into_bytes())
        } else {
            std::borrow::Cow::Borrowed(value)
        };

        match std::str::from_utf8(&rendered) {
            Ok(s) => {
                out.push_str("<string>");
                out.push_str(&xml_escape(s));
                out.push_str("</string>\n");
            }
            Err(_) => {
                out.push_str("<data>");
                out.push_str(&base64::engine::general_purpose::STANDARD.encode(&*rendered));
                out.push_str("</data>\n");
            }
        }
    }
    out.push_str("</dict>\n");
    out.into_bytes()
}

/// Expands one `$K`/`$(K)` reference or `\`-escape, returning how many bytes
/// of the template's remaining text it consumed (0 means "malformed,
/// nothing to expand").
fn template_key_end(template: &str, start: usize, parenthesized: bool) -> usize {
    if parenthesized {
        template[start..].find(')').map(|p| start + p).unwrap_or(template.len())
    } else {
        template[start..]
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .map(|p| start + p)
            .unwrap_or(template.len())
    }
}

fn format_template(msg: &Record, template: &str, tfmt: TimeFormat) -> Vec<u8> {
    let bytes = template.as_bytes();
    let mut out = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'$' => {
                i += 1;
                let parenthesized = bytes.get(i) == Some(&b'(');
                let start = if parenthesized { i + 1 } else { i };
                let end = template_key_end(template, start, parenthesized);
                let key = &template[start..end];
                let consumed_end = if parenthesized { (end + 1).min(bytes.len()) } else { end };

                if key.is_empty() {
                    out.push(b'$');
                } else if key == keys::TIME {
                    let secs = time_seconds(msg).unwrap_or(0);
                    out.extend_from_slice(tfmt.render(secs).as_bytes());
                } else if let Some(v) = msg.get(key) {
                    out.extend_from_slice(v);
                }
                i = consumed_end;
            }
            b'\\' => {
                i += 1;
                match bytes.get(i) {
                    Some(b'e') => { out.push(0x1B); i += 1; }
                    Some(b'a') => { out.push(0x07); i += 1; }
                    Some(b'b') => { out.push(0x08); i += 1; }
                    Some(b'f') => { out.push(0x0C); i += 1; }
                    Some(b'n') => { out.push(b'\n'); i += 1; }
                    Some(b'r') => { out.push(b'\r'); i += 1; }
                    Some(b't') => { out.push(b'\t'); i += 1; }
                    Some(b'v') => { out.push(0x0B); i += 1; }
                    Some(b'\\') => { out.push(b'\\'); i += 1; }
                    Some(b'\'') => { out.push(b'\''); i += 1; }
                    Some(b's') => { out.push(b' '); i += 1; }
                    Some(b'$') => { out.push(b'$'); i += 1; }
                    Some(c) if c.is_ascii_digit() => {
                        let mut j = i;
                        let mut value: u32 = 0;
                        let mut digits = 0;
                        while digits < 3 && bytes.get(j).is_some_and(u8::is_ascii_digit) {
                            value = value * 10 + (bytes[j] - b'0') as u32;
                            j += 1;
                            digits += 1;
                        }
                        out.push(value as u8);
                        i = j;
                    }
                    _ => {}
                }
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }

    out.push(b'\n');
    out
}

/// Renders `msg` under the given message format, time format, and
/// character encoding, producing the final byte stream (§4.E).
pub fn format_message(msg: &Record, mfmt: &MsgFormat, tfmt: TimeFormat, enc: Encoding) -> Vec<u8> {
    match mfmt {
        MsgFormat::Raw => format_raw(msg, tfmt),
        MsgFormat::Msg => format_msg(msg, enc),
        MsgFormat::Bsd => format_bsd(msg, tfmt, enc, false),
        MsgFormat::Std => format_bsd(msg, tfmt, enc, true),
        MsgFormat::Xml => format_xml(msg, tfmt),
        MsgFormat::Template(t) => format_template(msg, t, tfmt),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Record {
        let mut m = Record::empty_message();
        m.set(b"Time", Some(b"1700000000")).unwrap();
        m.set(b"Host", Some(b"myhost")).unwrap();
        m.set(b"Sender", Some(b"myapp")).unwrap();
        m.set(b"PID", Some(b"42")).unwrap();
        m.set(b"Level", Some(b"3")).unwrap();
        m.set(b"Message", Some(b"hello there")).unwrap();
        m
    }

    #[test]
    fn msg_mode_renders_message_and_newline() {
        let out = format_message(&sample(), &MsgFormat::Msg, TimeFormat::Sec, Encoding::None);
        assert_eq!(out, b"hello there\n");
    }

    #[test]
    fn bsd_mode_omits_pid_bracket_for_negative_one() {
        let mut m = sample();
        m.set(b"PID", Some(b"-1")).unwrap();
        let out = format_message(&m, &MsgFormat::Bsd, TimeFormat::Sec, Encoding::None);
        let s = String::from_utf8(out).unwrap();
        assert!(!s.contains('['));
        assert!(s.ends_with("myhost myapp: hello there\n"));
    }

    #[test]
    fn bsd_mode_includes_pid_bracket() {
        let out = format_message(&sample(), &MsgFormat::Bsd, TimeFormat::Sec, Encoding::None);
        let s = String::from_utf8(out).unwrap();
        assert!(s.contains("myapp[42]: hello there"));
    }

    #[test]
    fn bsd_mode_prints_pid_verbatim_without_reparsing_as_an_integer() {
        // A non-numeric PID isn't rejected by the record store (only
        // `Level`/`Message` are validated there), and the source prints
        // whatever string is stored rather than requiring it to parse.
        let mut m = sample();
        m.set(b"PID", Some(b"unknown")).unwrap();
        let out = format_message(&m, &MsgFormat::Bsd, TimeFormat::Sec, Encoding::None);
        let s = String::from_utf8(out).unwrap();
        assert!(s.contains("myapp[unknown]: hello there"));
    }

    #[test]
    fn bsd_mode_pid_bracket_compares_bytes_not_integer_value() {
        // " -1" and "-1" are distinct strings; only the exact literal
        // "-1" suppresses the bracket, and "007" prints as stored, not "7".
        let mut leading_space = sample();
        leading_space.set(b"PID", Some(b" -1")).unwrap();
        let out = format_message(&leading_space, &MsgFormat::Bsd, TimeFormat::Sec, Encoding::None);
        assert!(String::from_utf8(out).unwrap().contains("[ -1]"));

        let mut padded = sample();
        padded.set(b"PID", Some(b"007")).unwrap();
        let out = format_message(&padded, &MsgFormat::Bsd, TimeFormat::Sec, Encoding::None);
        assert!(String::from_utf8(out).unwrap().contains("[007]"));
    }

    #[test]
    fn std_mode_inserts_level_name_before_colon() {
        let out = format_message(&sample(), &MsgFormat::Std, TimeFormat::Sec, Encoding::None);
        let s = String::from_utf8(out).unwrap();
        assert!(s.contains("[42] ERROR: hello there"));
    }

    #[test]
    fn bsd_mode_uses_unknown_for_null_host() {
        let mut m = Record::empty_message();
        m.set(b"Message", Some(b"x")).unwrap();
        let out = format_message(&m, &MsgFormat::Bsd, TimeFormat::Sec, Encoding::None);
        let s = String::from_utf8(out).unwrap();
        assert!(s.starts_with("0 unknown unknown: x\n"));
    }

    #[test]
    fn xml_mode_wraps_entries_in_dict() {
        let out = format_message(&sample(), &MsgFormat::Xml, TimeFormat::Sec, Encoding::None);
        let s = String::from_utf8(out).unwrap();
        assert!(s.starts_with("<dict>\n"));
        assert!(s.contains("<key>Message</key>"));
        assert!(s.contains("<string>hello there</string>"));
        assert!(s.ends_with("</dict>\n"));
    }

    #[test]
    fn xml_mode_base64_wraps_non_utf8_values() {
        let mut m = Record::empty_message();
        m.set(b"Message", Some(&[0xFF, 0xFE])).unwrap();
        let out = format_message(&m, &MsgFormat::Xml, TimeFormat::Sec, Encoding::None);
        let s = String::from_utf8(out).unwrap();
        assert!(s.contains("<data>"));
    }

    #[test]
    fn xml_mode_skips_non_utf8_keys() {
        // Keys are always valid UTF-8 in this implementation (checked at
        // `set` time via `str` round-tripping elsewhere), so this exercises
        // the defensive branch with an empty record instead.
        let m = Record::empty_message();
        let out = format_message(&m, &MsgFormat::Xml, TimeFormat::Sec, Encoding::None);
        assert_eq!(out, b"<dict>\n</dict>\n");
    }

    #[test]
    fn template_expands_dollar_key_and_escapes() {
        let out = format_message(
            &sample(),
            &MsgFormat::Template("[$(Sender)] \\t$Message\\n".to_string()),
            TimeFormat::Sec,
            Encoding::None,
        );
        assert_eq!(out, b"[myapp] \thello there\n\n");
    }

    #[test]
    fn template_expands_octal_escape() {
        let out = format_message(&sample(), &MsgFormat::Template("\\101\\102".to_string()), TimeFormat::Sec, Encoding::None);
        assert_eq!(out, b"AB\n");
    }

    #[test]
    fn raw_mode_rerenders_time_under_selected_format() {
        let out = format_message(&sample(), &MsgFormat::Raw, TimeFormat::Utc, Encoding::None);
        let s = String::from_utf8(out).unwrap();
        assert!(s.contains("2023.11.14"));
    }

    #[test]
    fn from_selector_maps_known_strings_and_falls_back_to_template() {
        assert_eq!(MsgFormat::from_selector("bsd"), MsgFormat::Bsd);
        assert_eq!(MsgFormat::from_selector("custom %m"), MsgFormat::Template("custom %m".to_string()));
    }
}
