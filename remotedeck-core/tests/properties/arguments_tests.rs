//! Property-based tests for client argument rendering

use proptest::prelude::*;
use remotedeck_core::launcher::{escape_value, render_arguments, tokenize};
use remotedeck_core::models::{ConnectionProfile, ConnectionType, DEFAULT_PORTS};
use remotedeck_core::protocol::ProtocolRegistry;

fn profile(username: &str, password: &str) -> ConnectionProfile {
    ConnectionProfile::new("box", ConnectionType::Ssh, "h", 22)
        .with_username(username)
        .with_password(password)
}

#[test]
fn renders_port_and_target() {
    let argv = render_arguments("-p {port} {username}@{host}", &profile("u", ""), &[]).unwrap();
    assert_eq!(argv, vec!["-p", "22", "u@h"]);
}

#[test]
fn password_with_space_stays_one_argument() {
    let argv = render_arguments("-pw {password}", &profile("u", "pass word"), &[]).unwrap();
    assert_eq!(argv, vec!["-pw", "pass word"]);
}

#[test]
fn default_ports() {
    let port = |t: ConnectionType| {
        DEFAULT_PORTS
            .iter()
            .find(|(ct, _)| *ct == t)
            .map(|(_, p)| *p)
    };
    assert_eq!(port(ConnectionType::Ssh), Some(22));
    assert_eq!(port(ConnectionType::Rdp), Some(3389));
    assert_eq!(port(ConnectionType::Vnc), Some(5900));
    for connection_type in ConnectionType::ALL {
        assert_eq!(port(connection_type), Some(connection_type.default_port()));
    }
}

#[test]
fn ssh_handler_fills_compression() {
    let registry = ProtocolRegistry::new();
    let handler = registry.get_by_type(ConnectionType::Ssh).unwrap();
    let p = profile("u", "");
    let argv = render_arguments(
        "{compression} -p {port} {username}@{host}",
        &p,
        &handler.placeholders(&p),
    )
    .unwrap();
    assert_eq!(argv, vec!["-p", "22", "u@h"]);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn any_password_is_one_argument(password in "[ -~]{1,40}") {
        let argv = render_arguments("-pw {password} {host}", &profile("u", &password), &[]).unwrap();
        prop_assert_eq!(argv.len(), 3);
        prop_assert_eq!(&argv[1], &password);
        prop_assert_eq!(&argv[2], "h");
    }

    #[test]
    fn escaped_value_tokenizes_back(value in "\\PC{1,32}") {
        let tokens = tokenize(&escape_value(&value)).unwrap();
        prop_assert_eq!(tokens, vec![value]);
    }

    #[test]
    fn plain_words_split_on_whitespace(words in prop::collection::vec("[A-Za-z0-9._/:=-]{1,10}", 0..8)) {
        let line = words.join("  ");
        prop_assert_eq!(tokenize(&line).unwrap(), words);
    }
}
