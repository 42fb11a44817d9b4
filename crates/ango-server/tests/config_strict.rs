#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::time::Duration;

use ango_server::config;

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
server:
  listen: "0.0.0.0:8123"
  debgu: true # typo should fail
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.code().as_str(), "BAD_CONFIG");
}

#[test]
fn ok_minimal_config() {
    let cfg = config::load_from_str("version: 1\n").expect("must parse");
    assert_eq!(cfg.version, 1);
    assert_eq!(cfg.server.path, "/ango-websocket");
    assert_eq!(cfg.server.listen_addr().unwrap().port(), 8123);

    let opts = cfg.server.connection_options();
    assert!(!opts.debug);
    assert_eq!(opts.outbound_queue, 1024);
    assert_eq!(opts.request_timeout, None);
}

#[test]
fn unsupported_version() {
    let err = config::load_from_str("version: 2\n").expect_err("must fail");
    assert_eq!(err.code().as_str(), "UNSUPPORTED_VERSION");
}

#[test]
fn path_must_be_absolute() {
    let bad = r#"
version: 1
server:
  path: "ango-websocket"
"#;
    let err = config::load_from_str(bad).expect_err("must fail");
    assert!(err.to_string().contains("server.path"));
}

#[test]
fn bad_listen_address() {
    let bad = r#"
version: 1
server:
  listen: "localhost"
"#;
    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.code().as_str(), "BAD_CONFIG");
}

#[test]
fn request_timeout_bounds() {
    let too_small = "version: 1\nserver:\n  request_timeout_ms: 5\n";
    assert!(config::load_from_str(too_small).is_err());

    let ok = "version: 1\nserver:\n  request_timeout_ms: 1500\n  debug: true\n";
    let cfg = config::load_from_str(ok).unwrap();
    let opts = cfg.server.connection_options();
    assert!(opts.debug);
    assert_eq!(opts.request_timeout, Some(Duration::from_millis(1500)));
}
