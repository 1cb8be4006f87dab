use sentry_core::test::TestTransport;
use sentry_core::{Client, ClientOptions};
use sentry_logcore::{client_from_client, Configuration, Logger, SentryCore};

use std::sync::Arc;

pub fn init_logger(cfg: Configuration) -> (Logger, Arc<TestTransport>) {
    init_logger_with_options(
        cfg,
        ClientOptions {
            attach_stacktrace: false,
            ..ClientOptions::default()
        },
    )
}

pub fn init_logger_with_options(cfg: Configuration, options: ClientOptions) -> (Logger, Arc<TestTransport>) {
    let transport = TestTransport::new();
    let client = Client::from(ClientOptions {
        dsn: Some("https://test@sentry-logcore.com/test".parse().unwrap()),
        transport: Some(Arc::new(transport.clone())),
        sample_rate: 1.0,
        ..options
    });
    let core = SentryCore::new(cfg, client_from_client(client)).unwrap();

    (Logger::new(core.into_core()), transport)
}
