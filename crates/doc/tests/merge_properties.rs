//! Property-based tests for the Merger's associativity, commutativity, and
//! idempotence (§8 "Invariants (property-based)").

use doc::{annotate, merge_documents};
use quickcheck::{Arbitrary, Gen};
use quickcheck_macros::quickcheck;
use serde_json::{json, Value};

/// A small raw document varying only in which source produced it, when, and
/// what title it asserts — enough surface to exercise the leaf tie-break
/// without needing a general-purpose JSON document generator.
#[derive(Clone, Debug)]
struct SourceAssertion {
    system: u8,
    processed_at: u32,
    title: u8,
}

impl Arbitrary for SourceAssertion {
    fn arbitrary(g: &mut Gen) -> Self {
        SourceAssertion {
            system: u8::arbitrary(g) % 4,
            processed_at: u32::arbitrary(g) % 10_000,
            title: u8::arbitrary(g) % 4,
        }
    }
}

impl SourceAssertion {
    fn annotated(&self) -> Value {
        let raw = json!({
            "$schema": "book.v2",
            "classification": [{"realm": "isbn", "id": "fixed"}],
            "source": {
                "system": format!("s{}", self.system),
                "processedAt": format!("2020-01-01T00:{:02}:{:02}Z", self.processed_at / 60 % 60, self.processed_at % 60),
            },
            "title": format!("title-{}", self.title),
        });
        annotate(raw).expect("fixture annotates cleanly")
    }
}

#[quickcheck]
fn merge_is_commutative(a: SourceAssertion, b: SourceAssertion) -> bool {
    let a = a.annotated();
    let b = b.annotated();
    let left = merge_documents(a.clone(), b.clone()).expect("fixtures are coherent");
    let right = merge_documents(b, a).expect("fixtures are coherent");
    left == right
}

#[quickcheck]
fn merge_is_associative(a: SourceAssertion, b: SourceAssertion, c: SourceAssertion) -> bool {
    let a = a.annotated();
    let b = b.annotated();
    let c = c.annotated();

    let ab = merge_documents(a.clone(), b.clone()).expect("fixtures are coherent");
    let left = merge_documents(ab, c.clone()).expect("fixtures are coherent");
    let bc = merge_documents(b, c).expect("fixtures are coherent");
    let right = merge_documents(a, bc).expect("fixtures are coherent");
    left == right
}

#[quickcheck]
fn merge_is_idempotent(a: SourceAssertion) -> bool {
    let a = a.annotated();
    let merged = merge_documents(a.clone(), a.clone()).expect("fixtures are coherent");
    merged == a
}
