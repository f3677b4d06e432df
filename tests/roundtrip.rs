use pretty_assertions::assert_eq;
use wiredoc::{Amount, Document, PathPredicate, Predicate, PredicateValue};

fn sample_bytes() -> Vec<u8> {
    wiredoc::parse(
        r#"{
            name: "ferris",
            age: 9,
            active: true,
            tags: ["rust", "crab"],
            address: {city: "portland", zip: "97201"}
        }"#,
    )
    .unwrap()
}

#[test]
fn parses_and_reads_a_document_end_to_end() {
    let bytes = sample_bytes();
    let doc = Document::from_bytes(&bytes).unwrap();

    assert_eq!(doc.get_child("name").unwrap().as_string().unwrap(), "ferris");
    assert_eq!(doc.get_child("age").unwrap().as_integer().unwrap(), 9);
    assert!(doc.get_child("active").unwrap().as_boolean().unwrap());
    assert_eq!(doc.get_child("tags").unwrap().get_size(), 2);
    assert_eq!(
        doc.get_child("address").unwrap().get_child("city").unwrap().as_string().unwrap(),
        "portland"
    );
}

#[test]
fn compact_text_round_trips_through_the_parser() {
    let bytes = sample_bytes();
    let doc = Document::from_bytes(&bytes).unwrap();
    let text = doc.str().unwrap();

    let reparsed_bytes = wiredoc::parse(&text).unwrap();
    let reparsed = Document::from_bytes(&reparsed_bytes).unwrap();
    assert_eq!(doc, reparsed);
}

#[test]
fn insert_add_and_project_compose() {
    let bytes = sample_bytes();
    let mut doc = Document::from_owned_bytes(bytes).unwrap();

    let score_bytes = wiredoc::parse("100").unwrap();
    let score = Document::from_bytes(&score_bytes).unwrap();
    assert!(doc.insert("scores.+", &score));
    assert!(doc.insert("scores.+", &score));
    assert_eq!(doc.get_child("scores").unwrap().get_size(), 2);

    assert!(doc.add("age", Amount::Integer(1)));
    assert_eq!(doc.get_child("age").unwrap().as_integer().unwrap(), 10);

    let projected = doc.project("address.city").unwrap();
    assert_eq!(projected.as_string().unwrap(), "portland");
}

#[test]
fn search_prunes_to_requested_paths() {
    let bytes = sample_bytes();
    let doc = Document::from_bytes(&bytes).unwrap();

    let projected = doc.search(&["name", "address.city"]).unwrap();
    assert_eq!(projected.get_child("name").unwrap().as_string().unwrap(), "ferris");
    assert_eq!(
        projected.get_child("address").unwrap().get_child("city").unwrap().as_string().unwrap(),
        "portland"
    );
    assert!(projected.get_child("age").is_none());
    assert!(projected.get_child("address").unwrap().get_child("zip").is_none());
}

#[test]
fn wildcard_search_expands_over_arrays() {
    let bytes = wiredoc::parse(r#"{items: [{id: 1, note: "a"}, {id: 2, note: "b"}]}"#).unwrap();
    let doc = Document::from_bytes(&bytes).unwrap();

    let projected = doc.search(&["items.*.id"]).unwrap();
    let items = projected.get_child("items").unwrap();
    assert_eq!(items.get_size(), 2);
    assert_eq!(items.get_index(0).unwrap().get_child("id").unwrap().as_integer().unwrap(), 1);
    assert!(items.get_index(0).unwrap().get_child("note").is_none());
}

#[test]
fn predicates_match_existentially_over_wildcards() {
    let bytes = wiredoc::parse(r#"{scores: [10, 55, 99]}"#).unwrap();
    let doc = Document::from_bytes(&bytes).unwrap();

    let predicates = vec![PathPredicate {
        path: "scores.*".to_string(),
        predicate: Predicate::Gte(PredicateValue::Integer(90)),
    }];
    assert!(doc.matches_predicates(&predicates));

    let predicates = vec![PathPredicate {
        path: "scores.*".to_string(),
        predicate: Predicate::Lt(PredicateValue::Integer(0)),
    }];
    assert!(!doc.matches_predicates(&predicates));
}

#[test]
fn diff_reports_modified_added_and_deleted() {
    let a = Document::from_bytes_copied(&wiredoc::parse(r#"{x: 1, y: 2}"#).unwrap()).unwrap();
    let b = Document::from_bytes_copied(&wiredoc::parse(r#"{x: 1, z: 3}"#).unwrap()).unwrap();

    let entries = a.diff(&b).unwrap();
    assert_eq!(entries.len(), 2);

    let compressed = Document::compress_diff(&entries, true).unwrap();
    assert_eq!(compressed.get_type(), wiredoc::ValueKind::Array);
    assert_eq!(compressed.get_size(), 2);
}

#[test]
fn framed_bytes_round_trip() {
    let bytes = sample_bytes();
    let doc = Document::from_bytes(&bytes).unwrap();
    let framed = doc.to_framed_bytes();

    let (decoded, consumed) = Document::from_framed_bytes(&framed).unwrap();
    assert_eq!(decoded, doc);
    assert_eq!(consumed, framed.len());
}

#[test]
fn duplicate_is_independent_of_the_source_buffer() {
    let bytes = sample_bytes();
    let doc = Document::from_bytes(&bytes).unwrap();
    let dup = doc.duplicate();
    drop(doc);
    assert_eq!(dup.get_child("name").unwrap().as_string().unwrap(), "ferris");
}
