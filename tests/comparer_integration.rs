//! Integration tests for the flattening comparer

use std::collections::HashMap;

use wikiflat::{
    parse, Context, FlatteningComparer, HandlerRegistry, Markup, Page, Site, TextComparison,
};

const SAMPLES: &[&str] = &[
    "",
    "plain",
    "{{PAGENAME}}",
    "Example",
    "[[Target|Example]]",
    "{{Bogus|1}}",
    "Ex<!-- hidden -->ample",
    "{{lc:EXAMPLE}}",
];

fn with_comparer(f: impl FnOnce(&FlatteningComparer<'_>)) {
    let site = Site::default();
    let registry = HandlerRegistry::with_defaults(&site).unwrap();
    let context = Context::new(&site, &registry).with_page(Page::new("Example"));
    let comparer = FlatteningComparer::new(&context);
    f(&comparer);
}

#[test]
fn test_reflexive() {
    with_comparer(|comparer| {
        for sample in SAMPLES {
            assert!(comparer.equals(Some((*sample).into()), Some((*sample).into())).unwrap(), "{sample:?}");
        }
        assert!(comparer.equals(None, None).unwrap());
    });
}

#[test]
fn test_symmetric() {
    with_comparer(|comparer| {
        for a in SAMPLES {
            for b in SAMPLES {
                let ab = comparer.equals(Some((*a).into()), Some((*b).into())).unwrap();
                let ba = comparer.equals(Some((*b).into()), Some((*a).into())).unwrap();
                assert_eq!(ab, ba, "{a:?} vs {b:?}");
            }
            assert_eq!(
                comparer.equals(Some((*a).into()), None).unwrap(),
                comparer.equals(None, Some((*a).into())).unwrap()
            );
        }
    });
}

#[test]
fn test_markup_that_flattens_identically() {
    with_comparer(|comparer| {
        let equal = |a: &str, b: &str| comparer.equals(Some(a.into()), Some(b.into())).unwrap();
        assert!(equal("{{PAGENAME}}", "Example"));
        assert!(equal("[[Target|Example]]", "Example"));
        assert!(equal("Ex<!-- hidden -->ample", "Example"));
        assert!(equal("a<!-- one --> b", "a <!-- two -->b"));
        assert!(!equal("{{lc:EXAMPLE}}", "Example"));
        assert!(!equal("a  b", "a b"));
    });
}

#[test]
fn test_nodes_and_text() {
    with_comparer(|comparer| {
        let nodes = parse("{{FULLPAGENAME}}").unwrap();
        assert!(comparer
            .equals(Some(Markup::Nodes(&nodes)), Some(Markup::Text("Example")))
            .unwrap());
    });
}

#[test]
fn test_keys_group_equal_values() {
    let site = Site::default();
    let registry = HandlerRegistry::with_defaults(&site).unwrap();
    let context = Context::new(&site, &registry);
    let comparer = FlatteningComparer::new(&context)
        .with_normalizer(|text| text.trim().to_string())
        .with_comparison(TextComparison::IgnoreCase);

    let mut groups: HashMap<String, Vec<&str>> = HashMap::new();
    for value in ["Apple", " apple ", "{{uc:apple}}", "[[Fruit|APPLE]]", "Pear"] {
        groups
            .entry(comparer.key(value.into()).unwrap())
            .or_default()
            .push(value);
    }
    assert_eq!(groups.len(), 2);
    assert_eq!(groups["apple"].len(), 4);
    assert_eq!(groups["pear"], vec!["Pear"]);
}
