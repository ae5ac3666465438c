//! Integration tests for the infrastructure_pattern_store crate
//!
//! These tests exercise the table, the codec and the reader together as
//! the control process and the listing operation use them.

use entities_terms::Term;
use entities_trace::{MatchClause, PatternId};
use infrastructure_pattern_store::{
    codec, decode_program, encode_program, saved_patterns, PatternKey, PatternTable,
};

fn program(body: &str) -> Vec<MatchClause> {
    vec![MatchClause::wildcard(vec![Term::atom(body)])]
}

#[test]
fn test_table_roundtrip_through_reader() {
    let table = PatternTable::new();
    let id = table.alloc_id();
    table.insert(PatternKey::Id(id), encode_program(&program("return")));
    table.insert(PatternKey::Caller, encode_program(&program("caller")));

    let listed = saved_patterns(&table);
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[&PatternId::Saved(id)], program("return"));
    assert_eq!(listed[&PatternId::Caller], program("caller"));
}

#[test]
fn test_one_bad_entry_does_not_abort_listing() {
    let table = PatternTable::new();
    table.insert(PatternKey::Id(1), encode_program(&program("return")));

    // a truncated copy of a valid entry
    let mut bad = encode_program(&program("caller"));
    bad.truncate(bad.len() / 2);
    table.insert(PatternKey::Id(2), bad);

    let listed = saved_patterns(&table);
    assert_eq!(listed.len(), 1);
    assert!(listed.contains_key(&PatternId::Saved(1)));
}

#[test]
fn test_decode_is_the_inverse_of_encode() {
    let original = vec![
        MatchClause {
            head: Term::list(vec![Term::var("$1"), Term::var("$2")]),
            guards: vec![Term::tuple(vec![
                Term::atom("=:="),
                Term::var("$1"),
                Term::int(0),
            ])],
            body: vec![Term::atom("return"), Term::atom("caller")],
        },
        MatchClause::wildcard(vec![]),
    ];
    let decoded = decode_program(&encode_program(&original)).unwrap();
    assert_eq!(decoded, original);
}

#[test]
fn test_frames_and_programs_are_distinct_streams() {
    // a frame stream is not a program and must not decode as one
    let frame = codec::encode_frame(&Term::atom("trace"));
    assert!(decode_program(&frame).is_err());
}
