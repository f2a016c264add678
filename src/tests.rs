//! End-to-end scenario tests exercising the record store, textual codec,
//! match engine, and list framing together, as opposed to each module's own
//! unit tests.

use crate::codec::text::{decode, decode_list, encode, encode_list};
use crate::matcher::matches;
use crate::op::{Modifiers, Op, Relation};
use crate::record::Record;

#[test]
fn s1_encodes_a_simple_message_in_insertion_order() {
    let mut msg = Record::empty_message();
    msg.set(b"Host", Some(b"a.b")).unwrap();
    msg.set(b"Sender", Some(b"x")).unwrap();
    msg.set(b"Message", Some(b"hi")).unwrap();

    assert_eq!(encode(&msg), "[Host a.b] [Sender x] [Message hi]");
}

#[test]
fn s2_escapes_special_bytes_and_round_trips_byte_identically() {
    let mut msg = Record::empty_message();
    msg.set(b"Msg", Some(b"a b\nc]")).unwrap();

    let text = encode(&msg);
    assert_eq!(text, "[Msg a\\sb\\nc\\]]");

    let decoded = decode(&text).unwrap();
    assert_eq!(decoded.get("Msg"), Some(&b"a b\nc]"[..]));
}

#[test]
fn s3_encodes_and_decodes_a_query_with_modifiers() {
    let mut q = Record::new_query();
    let op = Op::new(Relation::Le, Modifiers::CASEFOLD | Modifiers::NUMERIC);
    q.set_query(b"Level", Some(b"3"), op).unwrap();

    let text = encode(&q);
    assert_eq!(text, "Q [CN<= Level 3]");
    assert_eq!(decode(&text).unwrap(), q);
}

#[test]
fn s4_substring_match_and_its_negation() {
    let mut m = Record::empty_message();
    m.set(b"Msg", Some(b"the quick brown fox")).unwrap();

    let mut eq = Record::new_query();
    eq.set_query(b"Msg", Some(b"quick"), Op::new(Relation::Eq, Modifiers::SUBSTRING)).unwrap();
    assert!(matches(&eq, &m));

    let mut ne = Record::new_query();
    ne.set_query(b"Msg", Some(b"quick"), Op::new(Relation::Ne, Modifiers::SUBSTRING)).unwrap();
    assert!(!matches(&ne, &m));

    let mut eq_slow = Record::new_query();
    eq_slow.set_query(b"Msg", Some(b"slow"), Op::new(Relation::Eq, Modifiers::SUBSTRING)).unwrap();
    assert!(!matches(&eq_slow, &m));

    let mut ne_slow = Record::new_query();
    ne_slow.set_query(b"Msg", Some(b"slow"), Op::new(Relation::Ne, Modifiers::SUBSTRING)).unwrap();
    assert!(matches(&ne_slow, &m));
}

#[test]
fn s5_time_comparison_parses_both_sides_before_comparing() {
    let mut m = Record::empty_message();
    m.set(b"Time", Some(b"1095789191")).unwrap();

    let query_with = |relation| {
        let mut q = Record::new_query();
        q.set_query(b"Time", Some(b"2004.09.21 15:53:11 UTC"), Op::new(relation, Modifiers::NONE)).unwrap();
        q
    };

    assert!(!matches(&query_with(Relation::Gt), &m));
    assert!(matches(&query_with(Relation::Ge), &m));
    assert!(matches(&query_with(Relation::Eq), &m));
}

#[test]
fn s6_list_round_trips_and_empty_list_decodes() {
    let mut m1 = Record::empty_message();
    m1.set(b"Sender", Some(b"A")).unwrap();
    let mut m2 = Record::empty_message();
    m2.set(b"Sender", Some(b"B")).unwrap();

    let text = encode_list(&[m1.clone(), m2.clone()]);
    assert_eq!(text, "2\n[Sender A]\n[Sender B]\n");
    assert_eq!(decode_list(&text).unwrap(), vec![m1, m2]);

    assert_eq!(decode_list("0\n"), Some(Vec::new()));
}

#[test]
fn invariant_set_is_idempotent() {
    let mut once = Record::empty_message();
    once.set(b"Host", Some(b"a")).unwrap();

    let mut twice = Record::empty_message();
    twice.set(b"Host", Some(b"a")).unwrap();
    twice.set(b"Host", Some(b"a")).unwrap();

    assert_eq!(once, twice);
    assert_eq!(encode(&once), encode(&twice));
}

#[test]
fn invariant_equal_messages_match_under_an_all_eq_query() {
    let mut m1 = Record::empty_message();
    m1.set(b"Host", Some(b"a")).unwrap();
    m1.set(b"Message", Some(b"hi")).unwrap();
    let mut m2 = Record::empty_message();
    m2.set(b"Host", Some(b"a")).unwrap();
    m2.set(b"Message", Some(b"hi")).unwrap();
    assert_eq!(m1, m2);

    let mut q = Record::new_query();
    for i in 0..m1.len() {
        q.set_query(m1.key_at(i).unwrap(), m1.value_at(i).unwrap(), Op::new(Relation::Eq, Modifiers::NONE)).unwrap();
    }
    assert!(matches(&q, &m1));
}
