//! Integration tests for the fixture engine.
//!
//! File-sourced fixtures are written to temporary roots with
//! [`FixtureDir`]; everything else runs against in-memory contexts.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use hazy_core::{Category, Config, ErrorKind, Fixture, HazyError, RandomProvider};
use hazy_engine::Hazy;
use hazy_test::{
    assert_error_kind, assert_has_keys, assert_same_shape, init_tracing, replace_with, set_field,
    tag_pattern, FixtureDir,
};
use proptest::prelude::*;
use serde_json::json;

fn seeded() -> Hazy {
    Hazy::with_config(Config::new().with_seed(2024))
}

fn in_dir(dir: &FixtureDir) -> Hazy {
    Hazy::with_config(dir.config().with_seed(2024))
}

// ----------------------------------------------------------------------
// Processing
// ----------------------------------------------------------------------

#[test]
fn test_tree_without_expressions_is_unchanged() {
    let hazy = seeded();
    let fixture = json!({
        "name": "plain | text",
        "nested": {"list": [1, 2.5, true, null, "x"], "empty": {}},
        "pipes": "||",
    });
    assert_eq!(hazy.process(&fixture).unwrap(), fixture);
}

#[test]
fn test_property_without_left_operand_fails() {
    let hazy = seeded();
    assert_error_kind(&hazy.evaluate("|:name|"), ErrorKind::Syntax);
    assert_error_kind(&hazy.process(&json!({"a": "|:name|"})), ErrorKind::Syntax);
}

#[test]
fn test_random_bool_is_boolean() {
    let hazy = Hazy::new();
    for _ in 0..50 {
        assert!(hazy.evaluate("|~basic:bool|").unwrap().is_boolean());
    }
}

#[test]
fn test_unknown_subtype_lists_supported() {
    let hazy = seeded();
    let result = hazy.evaluate("|~basic:doesnotexist|");
    assert_error_kind(&result, ErrorKind::Lookup);

    let message = result.unwrap_err().to_string();
    for subtype in Category::Basic.subtypes() {
        assert!(message.contains(subtype), "{message} should list {subtype}");
    }
}

#[test]
fn test_unknown_category_fails() {
    let hazy = seeded();
    assert_error_kind(&hazy.evaluate("|~nope:bool|"), ErrorKind::Lookup);
}

#[test]
fn test_empty_expression_fails() {
    let hazy = seeded();
    assert_error_kind(&hazy.evaluate("value: |+ |"), ErrorKind::Syntax);
}

#[test]
fn test_mixed_text_substitution() {
    let hazy = seeded();
    hazy.register("user", json!({"name": "Ada", "age": 36})).unwrap();

    assert_eq!(
        hazy.evaluate("|+user||:name| is |+user||:age|").unwrap(),
        json!("Ada is 36")
    );
    assert_eq!(hazy.evaluate("|+user||:age|").unwrap(), json!("36"));
}

#[test]
fn test_sole_scalar_expression_is_text() {
    let hazy = seeded();
    let value = hazy.evaluate("|~basic:integer|").unwrap();
    assert!(value.as_str().is_some_and(|n| n.parse::<i64>().is_ok()), "{value}");

    hazy.register("n", json!(7)).unwrap();
    assert_eq!(hazy.evaluate("|+n|").unwrap(), json!("7"));
}

#[test]
fn test_results_fill_first_remaining_expression() {
    let hazy = seeded();
    hazy.register("n", json!(7)).unwrap();
    assert_eq!(hazy.evaluate("|+missing| and |+n|").unwrap(), json!("7 and |+n|"));
    assert_eq!(hazy.evaluate("|+n| and |+missing|").unwrap(), json!("7 and |+missing|"));
}

#[test]
fn test_missing_property_keeps_left_value() {
    let hazy = seeded();
    hazy.register("user", json!({"name": "Ada"})).unwrap();
    hazy.register("label", json!("tag")).unwrap();

    assert_eq!(hazy.evaluate("|+user||:zip|").unwrap(), json!({"name": "Ada"}));
    assert_eq!(hazy.evaluate("|+label||:zip|").unwrap(), json!("tag|:zip|"));
}

#[test]
fn test_composite_in_text_wins() {
    let hazy = seeded();
    hazy.register("tags", json!(["a", "b"])).unwrap();
    assert_eq!(hazy.evaluate("tags: |+tags|").unwrap(), json!(["a", "b"]));
}

#[test]
fn test_keys_are_processed() {
    let hazy = seeded();
    hazy.register("key", json!("dynamic")).unwrap();
    hazy.register("obj", json!({"|+key|": 1, "static": 2})).unwrap();
    assert_eq!(
        hazy.get("obj").unwrap(),
        Some(json!({"dynamic": 1, "static": 2}))
    );
}

#[test]
fn test_query_operator_returns_matches() {
    let hazy = seeded();
    hazy.register("a", json!({"role": "admin"})).unwrap();
    hazy.register("b", json!({"role": "user"})).unwrap();
    hazy.register("c", json!({"id": 3})).unwrap();

    assert_eq!(
        hazy.evaluate("|*$.role|").unwrap(),
        json!([{"role": "admin"}, {"role": "user"}])
    );
}

#[test]
fn test_seeded_contexts_agree() {
    let template = json!({
        "name": "|~person:name|",
        "email": "|~web:email|",
        "city": "|~geo:city|",
        "id": "|~misc:guid|",
    });
    let first = seeded().process(&template).unwrap();
    let second = seeded().process(&template).unwrap();
    assert_eq!(first, second);
    assert_same_shape(&first, &json!({"name": "", "email": "", "city": "", "id": ""}));
}

#[derive(Debug)]
struct Fixed;

impl RandomProvider for Fixed {
    fn generate(&self, _category: Category, subtype: &str) -> Option<Fixture> {
        Some(json!(format!("fixed-{subtype}")))
    }
}

#[test]
fn test_custom_random_provider() {
    let hazy = Hazy::with_provider(Config::new(), Arc::new(Fixed));
    assert_eq!(hazy.evaluate("|~person:first|").unwrap(), json!("fixed-first"));

    // The catalog is still enforced in front of the provider.
    assert_error_kind(&hazy.evaluate("|~person:nickname|"), ErrorKind::Lookup);
}

proptest! {
    #[test]
    fn prop_text_without_delimiters_is_unchanged(text in "[^|]*") {
        let hazy = Hazy::new();
        prop_assert_eq!(hazy.evaluate(&text).unwrap(), Fixture::String(text.clone()));
    }

    #[test]
    fn prop_pipes_without_operator_are_literal(words in prop::collection::vec("[a-z ]{0,6}", 1..5)) {
        let text = words.join("|");
        let hazy = Hazy::new();
        prop_assert_eq!(hazy.evaluate(&text).unwrap(), Fixture::String(text.clone()));
    }
}

// ----------------------------------------------------------------------
// Store
// ----------------------------------------------------------------------

#[test]
fn test_reregistering_overwrites() {
    let hazy = seeded();
    hazy.register("a", json!({"v": "|~basic:integer|"})).unwrap();
    let first = hazy.get("a").unwrap().unwrap();
    assert!(first["v"].is_string());

    hazy.register("a", json!({"w": "|~text:word|"})).unwrap();
    let second = hazy.get("a").unwrap().unwrap();
    assert_has_keys(&second, &["w"]);
    assert!(second.get("v").is_none());
    assert_eq!(hazy.len(), 1);
}

#[test]
fn test_all_in_registration_order() {
    let hazy = seeded();
    hazy.register("z", json!(1)).unwrap();
    hazy.register("a", json!(2)).unwrap();
    assert_eq!(hazy.all().unwrap(), vec![json!(1), json!(2)]);
    assert_eq!(hazy.names(), vec!["z", "a"]);
}

#[test]
fn test_lazy_find_is_memoized_until_mutation() {
    let dir = FixtureDir::new().unwrap();
    dir.write_json("team.json", &json!({"size": 3})).unwrap();
    let hazy = in_dir(&dir);

    assert_eq!(hazy.lazy_find("team").unwrap(), json!({"size": 3}));
    assert!(hazy.contains("team.json"));

    // A cached result survives the file changing on disk.
    dir.write_json("team.json", &json!({"size": 4})).unwrap();
    assert_eq!(hazy.lazy_find("team").unwrap(), json!({"size": 3}));

    hazy.remove_all();
    assert_eq!(hazy.cache_len(), 0);
    assert_eq!(hazy.lazy_find("team").unwrap(), json!({"size": 4}));
}

#[test]
fn test_lazy_get_does_not_cache_result_replaced_mid_lookup() {
    let hazy = Arc::new(seeded());
    hazy.register("a", json!({"v": 1})).unwrap();

    let inner = Arc::downgrade(&hazy);
    let fired = AtomicBool::new(false);
    hazy.register_rule("$.v", move |fixture: &Fixture, _: &[Fixture], _: &str| {
        if !fired.swap(true, Ordering::SeqCst) {
            if let Some(hazy) = inner.upgrade() {
                hazy.register("a", json!({"v": 2})).unwrap();
            }
        }
        fixture.clone()
    })
    .unwrap();

    assert_eq!(hazy.lazy_get("a").unwrap(), Some(json!({"v": 1})));
    assert_eq!(hazy.cache_len(), 0);

    let fresh = hazy.get("a").unwrap();
    assert_eq!(fresh, Some(json!({"v": 2})));
    assert_eq!(hazy.lazy_get("a").unwrap(), fresh);
    assert_eq!(hazy.cache_len(), 1);
}

// ----------------------------------------------------------------------
// Files
// ----------------------------------------------------------------------

#[test]
fn test_find_missing_fails_with_io() {
    let dir = FixtureDir::new().unwrap();
    let hazy = in_dir(&dir);

    let result = hazy.find("missing");
    assert_error_kind(&result, ErrorKind::Io);
    assert!(matches!(result, Err(HazyError::FileRead { .. })));
    assert!(!hazy.contains("missing.json"));
}

#[test]
fn test_find_falls_back_to_file() {
    let dir = FixtureDir::new().unwrap();
    dir.write("missing.json", r#"{"id": |~basic:natural|, "name": "|~person:first|"}"#)
        .unwrap();
    let hazy = in_dir(&dir);

    let fixture = hazy.find("missing").unwrap();
    assert!(fixture["id"].is_u64());
    assert!(fixture["name"].is_string());
    assert!(hazy.contains("missing.json"));
    assert_eq!(hazy.get("missing.json").unwrap(), Some(fixture));
}

#[test]
fn test_unquoted_tokens_render_as_json() {
    let dir = FixtureDir::new().unwrap();
    dir.write("user.json", "{\n  \"age\": |~person:age|,\n  \"active\": |~basic:bool|\n}\n")
        .unwrap();
    let hazy = in_dir(&dir);

    let user = hazy.src("user.json").unwrap();
    assert!(user["age"].is_number());
    assert!(user["active"].is_boolean());
}

#[test]
fn test_token_breaking_the_document_fails_to_parse() {
    let dir = FixtureDir::new().unwrap();
    dir.write("broken.json", r#"{"name": |~person:first|}"#).unwrap();
    let hazy = in_dir(&dir);

    let result = hazy.src("broken.json");
    assert!(matches!(result, Err(HazyError::FixtureParse { .. })));
}

#[test]
fn test_yaml_fixture_file() {
    let dir = FixtureDir::new().unwrap();
    dir.write("config.yml", "name: |~person:first|\nport: |~basic:natural|\n")
        .unwrap();
    let hazy = in_dir(&dir);

    let fixture = hazy.src("config.yml").unwrap();
    assert_has_keys(&fixture, &["name", "port"]);
    assert!(fixture["port"].is_number());
}

#[test]
fn test_file_and_find_operators() {
    let dir = FixtureDir::new().unwrap();
    dir.write_json("shared/address.json", &json!({"city": "Lisbon"}))
        .unwrap();
    dir.write_json("company.json", &json!({"name": "Acme"})).unwrap();
    let hazy = in_dir(&dir);

    hazy.register(
        "user",
        json!({
            "address": "|>shared/address.json|",
            "city": "|>shared/address.json||:city|",
            "employer": "|_company||:name|",
        }),
    )
    .unwrap();

    assert_eq!(
        hazy.get("user").unwrap(),
        Some(json!({
            "address": {"city": "Lisbon"},
            "city": "Lisbon",
            "employer": "Acme",
        }))
    );
    assert!(hazy.contains("shared/address.json"));
    assert!(hazy.contains("company.json"));
}

#[test]
fn test_file_embedding_another_file() {
    let dir = FixtureDir::new().unwrap();
    dir.write_json("inner.json", &json!({"deep": true})).unwrap();
    dir.write("outer.json", r#"{"inner": |>inner.json|}"#).unwrap();
    let hazy = in_dir(&dir);

    assert_eq!(
        hazy.src("outer.json").unwrap(),
        json!({"inner": {"deep": true}})
    );
}

#[test]
fn test_glob_loads_sorted_and_registers_relative_names() {
    init_tracing();
    let dir = FixtureDir::new().unwrap();
    dir.write_json("users/b.json", &json!({"n": 2})).unwrap();
    dir.write_json("users/a.json", &json!({"n": 1})).unwrap();
    dir.write("users/c.yaml", "n: 3\n").unwrap();
    let hazy = in_dir(&dir);

    let loaded = hazy.glob("users/*.json").unwrap();
    assert_eq!(loaded, vec![json!({"n": 1}), json!({"n": 2})]);
    assert_eq!(hazy.names(), vec!["users/a.json", "users/b.json"]);
}

#[test]
fn test_glob_aborts_on_first_failure() {
    let dir = FixtureDir::new().unwrap();
    dir.write_json("a.json", &json!({"ok": true})).unwrap();
    dir.write("b.json", "{ nope").unwrap();
    dir.write_json("c.json", &json!({"ok": true})).unwrap();
    let hazy = in_dir(&dir);

    let result = hazy.glob("*.json");
    assert_error_kind(&result, ErrorKind::Io);
    assert_eq!(hazy.names(), vec!["a.json"]);
}

#[test]
fn test_glob_lenient_collects_failures() {
    let dir = FixtureDir::new().unwrap();
    dir.write_json("a.json", &json!({"ok": true})).unwrap();
    dir.write("b.json", "{ nope").unwrap();
    dir.write_json("c.json", &json!({"ok": true})).unwrap();
    let hazy = in_dir(&dir);

    let report = hazy.glob_lenient("*.json").unwrap();
    assert!(!report.is_clean());
    assert_eq!(report.loaded.len(), 2);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, "b.json");
    assert_eq!(hazy.names(), vec!["a.json", "c.json"]);
}

#[test]
fn test_glob_bad_pattern() {
    let dir = FixtureDir::new().unwrap();
    let hazy = in_dir(&dir);
    assert!(matches!(hazy.glob_lenient("[").unwrap_err(), HazyError::Glob { .. }));
}

// ----------------------------------------------------------------------
// Matchers
// ----------------------------------------------------------------------

#[test]
fn test_age_rule_applies_on_get() {
    let hazy = seeded();
    hazy.register_rule("$.age", set_field("age", json!(99))).unwrap();

    hazy.register("adult", json!({"name": "|~person:name|", "age": "|~person:age|"}))
        .unwrap();
    hazy.register("nested", json!({"age": 1, "friends": [{"age": 2}]}))
        .unwrap();
    hazy.register("ageless", json!({"name": "x"})).unwrap();

    for name in ["adult", "nested"] {
        assert_eq!(hazy.get(name).unwrap().unwrap()["age"], 99);
    }
    assert_eq!(hazy.get("ageless").unwrap(), Some(json!({"name": "x"})));
}

#[test]
fn test_search_returns_only_matching_fixture() {
    let hazy = seeded();
    hazy.register("one", json!({"email": "a@b.c"})).unwrap();
    hazy.register("two", json!({"name": "b"})).unwrap();
    hazy.register("three", json!([1, 2, 3])).unwrap();
    hazy.register_rule("$.email", tag_pattern("_match")).unwrap();

    let raw = hazy.search("$.email", Some(false)).unwrap();
    assert_eq!(raw, vec![json!({"email": "a@b.c"})]);

    let processed = hazy.search("$.email", Some(true)).unwrap();
    assert_eq!(processed.len(), 1);
    assert_eq!(
        processed[0]["_match"],
        json!({"pattern": "$.email", "matched": ["a@b.c"]})
    );
}

#[test]
fn test_invalid_pattern_is_syntax_error() {
    let hazy = seeded();
    assert_error_kind(&hazy.register_rule("$$$", replace_with(json!(1))), ErrorKind::Syntax);
    assert_error_kind(&hazy.search("not a path", None), ErrorKind::Syntax);
}

#[test]
fn test_legacy_value_matcher_is_corrupt_on_process() {
    let hazy = seeded();
    hazy.register_matcher("$.age", json!({"not": "callable"})).unwrap();
    hazy.register("p", json!({"age": 1})).unwrap();

    assert!(hazy.has_match(&json!({"age": 1})));
    assert_error_kind(&hazy.get("p"), ErrorKind::MatcherCorruption);
    assert_error_kind(
        &hazy.process_match("$.age", &json!({"age": 1})),
        ErrorKind::MatcherCorruption,
    );
}

#[test]
fn test_disabled_matching() {
    let hazy = Hazy::with_config(Config::new().with_matching(false));
    hazy.register_rule("$.age", set_field("age", json!(99))).unwrap();
    hazy.register("p", json!({"age": 1})).unwrap();

    assert!(hazy.matches(&json!({"age": 1})).is_empty());
    assert_eq!(hazy.get("p").unwrap(), Some(json!({"age": 1})));
    assert_eq!(hazy.search("$.age", None).unwrap(), vec![json!({"age": 1})]);
    assert_eq!(hazy.search("$.age", Some(true)).unwrap(), vec![json!({"age": 99})]);
}

#[test]
fn test_embedded_fixture_gets_matchers_applied() {
    let hazy = seeded();
    hazy.register("user", json!({"age": 1})).unwrap();
    hazy.register_rule("$.age", set_field("age", json!(99))).unwrap();
    hazy.register("team", json!({"lead": "|+user|"})).unwrap();

    assert_eq!(
        hazy.get("team").unwrap(),
        Some(json!({"lead": {"age": 99}}))
    );
}

#[test]
fn test_rule_handler_can_reenter_context() {
    let hazy = Arc::new(seeded());
    hazy.register("defaults", json!({"role": "viewer"})).unwrap();

    let inner = Arc::downgrade(&hazy);
    hazy.register_rule("$.user", move |fixture: &Fixture, _: &[Fixture], _: &str| {
        let mut fixture = fixture.clone();
        if let Some(hazy) = inner.upgrade() {
            fixture["role"] = hazy
                .evaluate("|+defaults||:role|")
                .unwrap_or(Fixture::Null);
        }
        fixture
    })
    .unwrap();
    hazy.register("session", json!({"user": "ada"})).unwrap();

    assert_eq!(
        hazy.get("session").unwrap(),
        Some(json!({"user": "ada", "role": "viewer"}))
    );
}

#[test]
fn test_matcher_patterns_and_clear() {
    let hazy = seeded();
    hazy.register_rule("$.a", replace_with(json!(1))).unwrap();
    hazy.register_rule("$.b", replace_with(json!(2))).unwrap();
    hazy.register_rule("$.a", replace_with(json!(3))).unwrap();
    assert_eq!(hazy.matcher_patterns(), vec!["$.b", "$.a"]);

    hazy.clear_matchers();
    assert!(hazy.matcher_patterns().is_empty());
}

// ----------------------------------------------------------------------
// Contexts
// ----------------------------------------------------------------------

#[test]
fn test_contexts_are_isolated() {
    let first = seeded();
    let second = seeded();
    first.register("only-here", json!(1)).unwrap();
    assert!(second.get("only-here").unwrap().is_none());
}

#[test]
fn test_fork_shares_nothing_mutable() {
    let hazy = seeded();
    hazy.register("a", json!(1)).unwrap();
    let fork = hazy.fork();
    fork.register_rule("$.x", replace_with(json!(0))).unwrap();

    assert!(hazy.matcher_patterns().is_empty());
    assert_eq!(fork.get("a").unwrap(), Some(json!(1)));
}

#[test]
fn test_concurrent_registration() {
    let hazy = Arc::new(Hazy::new());
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let hazy = Arc::clone(&hazy);
            thread::spawn(move || {
                for j in 0..25 {
                    let name = format!("fixture-{i}-{j}");
                    hazy.register(&name, json!({"id": "|~misc:guid|"})).unwrap();
                    assert!(hazy.get(&name).unwrap().is_some());
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(hazy.len(), 200);
}
