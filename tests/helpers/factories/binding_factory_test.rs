use crate::engine::Term;
use crate::test_helpers::factories::BindingFactory;

#[test]
fn builds_spo_rows_and_quads() {
    let row = BindingFactory::spo(3);
    assert_eq!(row.get("s"), Some(&Term::iri("http://ex.org/s3")));
    assert_eq!(row.get("o"), Some(&Term::literal("3")));

    let rows = BindingFactory::spo_list(4);
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0].get("o"), Some(&Term::literal("0")));

    let quad = BindingFactory::quad(1);
    assert_eq!(quad.subject, Term::iri("http://ex.org/s1"));
    assert!(quad.graph.is_none());

    let custom = BindingFactory::new().with_literal("name", "Ada").create();
    assert_eq!(custom.len(), 1);
}
