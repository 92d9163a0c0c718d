mod common;

use apiprobe::errors::RequestError;
use common::{request_with_params, RecordingHandler};

#[test]
fn ambiguous_bare_name_lists_colliding_modules() {
    let registry = common::fresh_registry();
    registry
        .register(request_with_params(
            "moduleA",
            "ping",
            vec![],
            RecordingHandler::new(),
        ))
        .unwrap();
    registry
        .register(request_with_params(
            "moduleB",
            "ping",
            vec![],
            RecordingHandler::new(),
        ))
        .unwrap();

    let err = registry.find("ping").unwrap_err();
    let message = err.to_string();
    assert!(message.contains("moduleA"));
    assert!(message.contains("moduleB"));
    assert!(matches!(err, RequestError::Ambiguous { .. }));

    // qualification is deterministic despite the collision
    assert_eq!(registry.find("moduleA:ping").unwrap().module, "moduleA");
    assert_eq!(registry.find("moduleB:ping").unwrap().module, "moduleB");
}

#[test]
fn duplicate_registration_leaves_existing_entry() {
    let registry = common::fresh_registry();
    registry
        .register(request_with_params(
            "blog",
            "post",
            vec![common::int_param_with_default("post_id", 1)],
            RecordingHandler::new(),
        ))
        .unwrap();
    let before = registry.find("blog:post").unwrap();

    let err = registry
        .register(request_with_params(
            "blog",
            "post",
            vec![],
            RecordingHandler::new(),
        ))
        .unwrap_err();
    assert!(matches!(err, RequestError::DuplicateName { .. }));

    let after = registry.find("blog:post").unwrap();
    assert_eq!(after.arguments().len(), before.arguments().len());
    assert_eq!(after.arguments().len(), 1);
}

#[test]
fn resolution_error_messages_name_the_missing_segment() {
    let registry = common::fresh_registry();
    registry
        .register(request_with_params(
            "blog",
            "post",
            vec![],
            RecordingHandler::new(),
        ))
        .unwrap();

    let err = registry.find("shop:post").unwrap_err();
    assert_eq!(err.to_string(), "Module \"shop\" does not exist.");

    let err = registry.find("blog:missing").unwrap_err();
    assert_eq!(err.to_string(), "Request \"blog:missing\" does not exist.");
}
