mod shared;

use std::sync::Arc;

use sentry_core::protocol::Value;
use sentry_logcore::{new_scope, with_scope, Configuration, Field, Level, Scope};

#[test]
fn should_attach_breadcrumbs_to_next_event() {
    let (logger, transport) = shared::init_logger(Configuration::new(Level::Error).breadcrumbs(Level::Info));
    let logger = logger.with(&[new_scope()]);

    logger.debug("below the breadcrumb level", &[]);
    logger.info("first", &[Field::new("step", 1)]);
    logger.warn("second", &[]);
    logger.error("failed", &[]);

    let event = transport.fetch_and_clear_events().remove(0);
    let messages: Vec<_> = event
        .breadcrumbs
        .iter()
        .filter_map(|b| b.message.as_deref())
        .collect();
    assert_eq!(messages, ["first", "second", "failed"]);
    assert_eq!(event.breadcrumbs[0].ty, "log");
    assert_eq!(event.breadcrumbs[0].data["step"], Value::from(1));
    assert!(!event.extra.contains_key("step"));
}

#[test]
fn should_keep_scopes_apart() {
    let (logger, transport) = shared::init_logger(Configuration::new(Level::Error).breadcrumbs(Level::Info));
    let first_scope = Arc::new(Scope::new());
    let first = logger.with(&[with_scope(first_scope.clone())]);
    let second = logger.with(&[new_scope()]);

    first.info("only in first", &[]);
    second.error("second failed", &[]);
    first.error("first failed", &[]);

    let events = transport.fetch_and_clear_events();
    let messages = |index: usize| -> Vec<String> {
        events[index]
            .breadcrumbs
            .iter()
            .filter_map(|b| b.message.clone())
            .collect()
    };
    assert_eq!(messages(0), ["second failed"]);
    assert_eq!(messages(1), ["only in first", "first failed"]);
    assert_eq!(first_scope.breadcrumbs().len(), 2);
}

#[test]
fn should_limit_breadcrumbs() {
    let scope = Arc::new(Scope::new());
    let cfg = Configuration {
        max_breadcrumbs: 3,
        scope: Some(scope.clone()),
        breadcrumbs_require_scope: false,
        ..Configuration::new(Level::Error).breadcrumbs(Level::Info)
    };
    let (logger, transport) = shared::init_logger(cfg);

    for i in 0..5 {
        logger.info(&format!("crumb {}", i), &[]);
    }
    logger.error("failed", &[]);

    let event = transport.fetch_and_clear_events().remove(0);
    let messages: Vec<_> = event
        .breadcrumbs
        .iter()
        .filter_map(|b| b.message.as_deref())
        .collect();
    assert_eq!(messages, ["crumb 3", "crumb 4", "failed"]);
}

#[test]
fn should_not_treat_configured_scope_as_local() {
    let scope = Arc::new(Scope::new());
    let cfg = Configuration {
        scope: Some(scope.clone()),
        ..Configuration::new(Level::Error).breadcrumbs(Level::Info)
    };
    let (logger, transport) = shared::init_logger(cfg);

    logger.info("dropped", &[]);
    logger.error("failed", &[]);

    let event = transport.fetch_and_clear_events().remove(0);
    assert!(event.breadcrumbs.is_empty());
    assert!(scope.breadcrumbs().is_empty());
}
