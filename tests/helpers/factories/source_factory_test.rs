use crate::federation::SourceKind;
use crate::test_helpers::factories::SourceFactory;

#[test]
fn builds_sources_with_defaults_and_helpers() {
    let default = SourceFactory::new().create();
    assert_eq!(default.shortname, "test");
    assert!(matches!(default.kind, SourceKind::Sparql { .. }));

    let sparql = SourceFactory::sparql("wiki");
    assert_eq!(sparql.identifier(), "wiki");
    assert_eq!(
        sparql.kind,
        SourceKind::Sparql {
            endpoint: "http://wiki.example/sparql".into()
        }
    );

    let compound = SourceFactory::compound("kg");
    assert_eq!(
        compound.kind,
        SourceKind::Compound {
            sparql_endpoint: "http://kg.example/sparql".into(),
            tpf_endpoint: "http://kg.example/tpf".into(),
        }
    );
}
