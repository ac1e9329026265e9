//! Argument template rendering
//!
//! A template is a single string such as `-p {port} {username}@{host}`.
//! Placeholder values are escaped before substitution so that a value with
//! spaces or shell metacharacters stays one argument; the rendered string is
//! then split into an argument vector with a quote-aware tokenizer. No shell
//! is ever involved in launching the client.

use crate::error::{LaunchError, LaunchResult};
use crate::models::ConnectionProfile;

const METACHARACTERS: &[char] = &[
    '"', '\'', '\\', '$', '`', '&', '|', ';', '<', '>', '(', ')', '*', '?', '!', '#', '~', '^',
];

/// Renders `template` for `profile` into an argument vector
///
/// Common placeholders are `{host}`, `{port}`, `{username}`, `{password}` and
/// `{protocol}`; `extra` supplies protocol-specific ones. Unknown
/// placeholders are left as written.
///
/// # Errors
/// Returns `LaunchError::InvalidTemplate` if the rendered template has an
/// unterminated quote.
pub fn render_arguments(
    template: &str,
    profile: &ConnectionProfile,
    extra: &[(&'static str, String)],
) -> LaunchResult<Vec<String>> {
    let port = profile.port.to_string();
    let mut values: Vec<(&str, &str)> = vec![
        ("host", profile.host.as_str()),
        ("port", port.as_str()),
        ("username", profile.username.as_str()),
        ("password", profile.password.as_str()),
        ("protocol", profile.connection_type().as_str()),
    ];
    values.extend(extra.iter().map(|(key, value)| (*key, value.as_str())));

    let rendered = substitute(template, &values);
    tokenize(&rendered)
}

/// Replaces `{name}` occurrences with escaped values
fn substitute(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            out.push_str(&rest[open..]);
            return out;
        };
        let name = &after[..close];
        match values.iter().find(|(key, _)| *key == name) {
            Some((_, value)) => out.push_str(&escape_value(value)),
            None => {
                out.push('{');
                out.push_str(name);
                out.push('}');
            }
        }
        rest = &after[close + 1..];
    }
    out.push_str(rest);
    out
}

/// Wraps a value in double quotes if it has whitespace or metacharacters
///
/// Inside the quotes `"` and `\` are backslash-escaped.
#[must_use]
pub fn escape_value(value: &str) -> String {
    if !value
        .chars()
        .any(|c| c.is_whitespace() || METACHARACTERS.contains(&c))
    {
        return value.to_string();
    }
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

/// Splits a command line on unquoted whitespace
///
/// Double-quoted spans honour `\"` and `\\`; single-quoted spans are literal.
/// Outside quotes a backslash is an ordinary character, so Windows paths
/// survive. Quotes are removed from the resulting tokens, and adjacent quoted
/// and unquoted text join into one token.
///
/// # Errors
/// Returns `LaunchError::InvalidTemplate` on an unterminated quote.
pub fn tokenize(line: &str) -> LaunchResult<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            c if c.is_whitespace() => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            '"' => {
                in_token = true;
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') if matches!(chars.peek(), Some('"' | '\\')) => {
                            if let Some(escaped) = chars.next() {
                                current.push(escaped);
                            }
                        }
                        Some(other) => current.push(other),
                        None => {
                            return Err(LaunchError::InvalidTemplate(format!(
                                "unterminated double quote in: {line}"
                            )))
                        }
                    }
                }
            }
            '\'' => {
                in_token = true;
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(other) => current.push(other),
                        None => {
                            return Err(LaunchError::InvalidTemplate(format!(
                                "unterminated single quote in: {line}"
                            )))
                        }
                    }
                }
            }
            other => {
                in_token = true;
                current.push(other);
            }
        }
    }
    if in_token {
        tokens.push(current);
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ConnectionType;

    fn profile() -> ConnectionProfile {
        ConnectionProfile::new("box", ConnectionType::Ssh, "h", 22).with_username("u")
    }

    #[test]
    fn test_render_basic() {
        let argv = render_arguments("-p {port} {username}@{host}", &profile(), &[]).unwrap();
        assert_eq!(argv, vec!["-p", "22", "u@h"]);
    }

    #[test]
    fn test_password_with_space_is_one_token() {
        let p = profile().with_password("pass word");
        let argv = render_arguments("-pw {password} {host}", &p, &[]).unwrap();
        assert_eq!(argv, vec!["-pw", "pass word", "h"]);
    }

    #[test]
    fn test_quoted_value_inside_word() {
        let p = profile().with_password("a b");
        let argv = render_arguments("/p:{password}", &p, &[]).unwrap();
        assert_eq!(argv, vec!["/p:a b"]);
    }

    #[test]
    fn test_metacharacters_survive() {
        let p = profile().with_password(r#"x"y\z;$(rm)"#);
        let argv = render_arguments("{password}", &p, &[]).unwrap();
        assert_eq!(argv, vec![r#"x"y\z;$(rm)"#]);
    }

    #[test]
    fn test_empty_placeholder_disappears() {
        let extra = [("compression", String::new())];
        let argv = render_arguments("{compression} -p {port} {username}@{host}", &profile(), &extra)
            .unwrap();
        assert_eq!(argv, vec!["-p", "22", "u@h"]);
    }

    #[test]
    fn test_unknown_placeholder_kept() {
        let argv = render_arguments("{nope} {host}", &profile(), &[]).unwrap();
        assert_eq!(argv, vec!["{nope}", "h"]);
    }

    #[test]
    fn test_protocol_placeholder() {
        let p = ConnectionProfile::new("f", ConnectionType::Sftp, "h", 22).with_username("u");
        let extra = [("initialpath", "/srv".to_string())];
        let argv = render_arguments(
            "{protocol}://{username}@{host}:{port}{initialpath}",
            &p,
            &extra,
        )
        .unwrap();
        assert_eq!(argv, vec!["sftp://u@h:22/srv"]);
    }

    #[test]
    fn test_tokenize_windows_path_and_quotes() {
        let argv = tokenize(r#"C:\tools\putty.exe 'single quoted' "a \"b\"""#).unwrap();
        assert_eq!(argv, vec![r"C:\tools\putty.exe", "single quoted", r#"a "b""#]);
    }

    #[test]
    fn test_tokenize_empty_quotes_is_token() {
        assert_eq!(tokenize(r#"-x """#).unwrap(), vec!["-x", ""]);
        assert!(tokenize("   ").unwrap().is_empty());
    }

    #[test]
    fn test_unterminated_quote() {
        assert!(matches!(
            tokenize(r#"-pw "open"#),
            Err(LaunchError::InvalidTemplate(_))
        ));
    }
}
