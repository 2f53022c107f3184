use safeguard_cache::make_key;
use serde_json::{json, Map, Value};

fn kwargs(pairs: &[(&str, Value)]) -> Map<String, Value> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
}

#[test]
fn keyword_order_does_not_matter() {
    let a = kwargs(&[("city", json!("Austin")), ("beds", json!(2)), ("pets", json!(true))]);
    let b = kwargs(&[("pets", json!(true)), ("city", json!("Austin")), ("beds", json!(2))]);
    assert_eq!(make_key("search", &[], &a), make_key("search", &[], &b));
}

#[test]
fn prefix_namespaces_keys() {
    let kw = Map::new();
    let listing = make_key("listing", &[json!(1)], &kw);
    let user = make_key("user", &[json!(1)], &kw);

    assert!(listing.starts_with("listing:"));
    assert!(user.starts_with("user:"));
    assert_eq!(listing["listing:".len()..], user["user:".len()..]);
}

#[test]
fn positional_and_keyword_arguments_are_distinct() {
    let positional = make_key("f", &[json!(1)], &Map::new());
    let keyword = make_key("f", &[], &kwargs(&[("0", json!(1))]));
    assert_ne!(positional, keyword);
}

#[test]
fn digest_is_stable_across_calls() {
    let kw = kwargs(&[("page", json!(3))]);
    let keys: Vec<String> = (0..5).map(|_| make_key("page", &[json!("x")], &kw)).collect();
    assert!(keys.windows(2).all(|w| w[0] == w[1]));
}
