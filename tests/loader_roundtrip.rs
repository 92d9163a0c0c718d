mod common;

use apiprobe::loader;
use apiprobe::logger::Logger;
use apiprobe::registry::arguments::Argument;
use apiprobe::registry::request::CacheMode;
use serde_json::json;

#[test]
fn declarative_source_compiles_into_registered_requests() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("blog.requests.json"),
        r#"{
            "requests": [
                {
                    "name": "post",
                    "doc": "Fetch one post",
                    "cache": "session",
                    "method": "GET",
                    "url": "{base_url}/posts/{post_id}",
                    "args": [
                        {"name": "post_id", "type": "int", "default": 1}
                    ]
                },
                {
                    "name": "create_post",
                    "method": "POST",
                    "url": "{base_url}/posts",
                    "body": {"title": "{title}"},
                    "args": [
                        {"name": "title"}
                    ]
                }
            ]
        }"#,
    )
    .unwrap();

    let logger = Logger::new("test");
    let registry = common::fresh_registry();
    registry
        .ensure_loaded(|ctx| loader::load_all(ctx, dir.path(), &logger))
        .unwrap();

    let post = registry.find("blog:post").unwrap();
    assert_eq!(post.cache_mode, Some(CacheMode::Session));
    assert_eq!(post.doc.as_deref(), Some("Fetch one post"));
    match &post.arguments()[0] {
        Argument::Defaulted(arg) => {
            assert_eq!(arg.name, "post_id");
            assert_eq!(arg.default, json!(1));
        }
        other => panic!("expected defaulted argument, got {:?}", other),
    }

    let create = registry.find("create_post").unwrap();
    assert!(create.cache_mode.is_none());
    assert!(matches!(&create.arguments()[0], Argument::Required(arg) if arg.name == "title"));
}

#[test]
fn load_is_memoized_per_registry() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("one.requests.json"),
        r#"{"requests": [{"name": "ping", "method": "GET", "url": "u"}]}"#,
    )
    .unwrap();

    let logger = Logger::new("test");
    let registry = common::fresh_registry();
    registry
        .ensure_loaded(|ctx| loader::load_all(ctx, dir.path(), &logger))
        .unwrap();

    // a second pass must not re-scan; duplicates would be rejected anyway
    registry
        .ensure_loaded(|_| panic!("loader ran twice"))
        .unwrap();
    assert!(registry.find("one:ping").is_ok());
}

#[test]
fn reset_allows_a_clean_reload() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("one.requests.json"),
        r#"{"requests": [{"name": "ping", "method": "GET", "url": "u"}]}"#,
    )
    .unwrap();

    let logger = Logger::new("test");
    let registry = common::fresh_registry();
    registry
        .ensure_loaded(|ctx| loader::load_all(ctx, dir.path(), &logger))
        .unwrap();
    registry.reset();
    assert!(registry.find("ping").is_err());

    registry
        .ensure_loaded(|ctx| loader::load_all(ctx, dir.path(), &logger))
        .unwrap();
    assert!(registry.find("ping").is_ok());
}
