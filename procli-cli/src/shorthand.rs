//! Shorthand call syntax
//!
//! `receiver.method(arg1, "arg 2", 'arg,3')` typed after a command is rewritten
//! into the long form `--agent receiver --method method --params arg1 "arg 2" "arg,3"`.
//! The call may span several argv tokens when the shell split it on spaces.

use regex::Regex;
use std::sync::OnceLock;
use tracing::trace;

fn call_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?s)^(\w+)\.(\w+)\((.*)\)$").expect("Failed to compile shorthand regex")
    })
}

/// A call found in argv, split into its parts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShorthandCall {
    pub receiver: String,
    pub method: String,
    pub arguments: Vec<String>,
}

/// Locate a shorthand call among `tokens`
///
/// The call starts at the first token that contains both `.` and `(` and does
/// not start with `--`; it ends at the token where parentheses balance.
///
/// # Returns
///
/// The tokens before the call, the joined call text and the tokens after it,
/// or `None` when no call starts or its parentheses never close.
pub fn locate(tokens: &[String]) -> Option<(Vec<String>, String, Vec<String>)> {
    let start = tokens
        .iter()
        .position(|token| !token.starts_with("--") && token.contains('.') && token.contains('('))?;

    let mut depth: i32 = 0;
    for (index, token) in tokens.iter().enumerate().skip(start) {
        for c in token.chars() {
            match c {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        let call = tokens[start..=index].join(" ");
                        return Some((
                            tokens[..start].to_vec(),
                            call,
                            tokens[index + 1..].to_vec(),
                        ));
                    }
                }
                _ => {}
            }
        }
    }
    None
}

/// Parse joined call text such as `agent.method("a", "")`
pub fn parse_call(text: &str) -> Option<ShorthandCall> {
    let captures = call_pattern().captures(text)?;
    Some(ShorthandCall {
        receiver: captures[1].to_string(),
        method: captures[2].to_string(),
        arguments: split_arguments(&captures[3]),
    })
}

/// Split call arguments on unquoted, unescaped commas
///
/// Quotes group text and are dropped; a backslash takes the next character
/// literally. Unquoted whitespace around an argument is trimmed while quoted
/// whitespace is kept. Every unescaped comma starts a new argument, so a
/// trailing comma yields a trailing empty argument.
pub fn split_arguments(text: &str) -> Vec<String> {
    let mut arguments = Vec::new();
    let mut current = String::new();
    // Length of `current` up to its last significant character
    let mut keep = 0;
    let mut quote: Option<char> = None;
    let mut escape = false;
    let mut started = false;

    for c in text.chars() {
        if escape {
            current.push(c);
            keep = current.len();
            escape = false;
            continue;
        }
        if c == '\\' {
            escape = true;
            started = true;
            continue;
        }
        match quote {
            Some(open) if c == open => quote = None,
            Some(_) => {
                current.push(c);
                keep = current.len();
            }
            None => match c {
                '"' | '\'' => {
                    quote = Some(c);
                    started = true;
                }
                ',' => {
                    current.truncate(keep);
                    arguments.push(std::mem::take(&mut current));
                    keep = 0;
                    started = true;
                }
                c if c.is_whitespace() => {
                    started = true;
                    if !current.is_empty() {
                        current.push(c);
                    }
                }
                _ => {
                    current.push(c);
                    keep = current.len();
                    started = true;
                }
            },
        }
    }
    if started {
        current.truncate(keep);
        arguments.push(current);
    }
    arguments
}

/// Rewrite shorthand calls following the first token into the long form
///
/// The first token is treated as the command name and kept in place. Tokens
/// are returned unchanged when no well-formed call is found.
pub fn expand(tokens: &[String]) -> Vec<String> {
    let Some((head, rest)) = tokens.split_first() else {
        return Vec::new();
    };
    let Some((before, call_text, after)) = locate(rest) else {
        return tokens.to_vec();
    };
    let Some(call) = parse_call(&call_text) else {
        trace!("Not a shorthand call: {}", call_text);
        return tokens.to_vec();
    };

    trace!(
        "Expanding shorthand {}.{} with {} argument(s)",
        call.receiver,
        call.method,
        call.arguments.len()
    );
    let mut expanded = Vec::with_capacity(tokens.len() + call.arguments.len() + 6);
    expanded.push(head.clone());
    expanded.extend(before);
    expanded.push("--agent".to_string());
    expanded.push(call.receiver);
    expanded.push("--method".to_string());
    expanded.push(call.method);
    if !call.arguments.is_empty() {
        expanded.push("--params".to_string());
        expanded.extend(call.arguments);
    }
    expanded.extend(after);
    expanded
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn tokens(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_trailing_empty_argument_preserved() {
        assert_eq!(
            expand(&tokens(&["cerebro.exec", r#"agent.method("a", "")"#])),
            tokens(&["cerebro.exec", "--agent", "agent", "--method", "method", "--params", "a", ""])
        );
    }

    #[test]
    fn test_call_without_arguments_has_no_params() {
        assert_eq!(
            expand(&tokens(&["cerebro.exec", "Hisoka.run()", "--verbose-errors"])),
            tokens(&["cerebro.exec", "--agent", "Hisoka", "--method", "run", "--verbose-errors"])
        );
    }

    #[test]
    fn test_call_spanning_tokens() {
        assert_eq!(
            expand(&tokens(&["run", "fs.read(a,", "'b", "c')", "--verbose-errors"])),
            tokens(&[
                "run", "--agent", "fs", "--method", "read", "--params", "a", "b c",
                "--verbose-errors"
            ])
        );
    }

    #[test]
    fn test_tokens_before_call_are_kept() {
        assert_eq!(
            expand(&tokens(&["--interactive", "cerebro.exec", "x.y(1)"])),
            tokens(&[
                "--interactive", "cerebro.exec", "--agent", "x", "--method", "y", "--params", "1"
            ])
        );
    }

    #[rstest]
    #[case(&["cmd", "a.b(1"])]
    #[case(&["cmd", "--x.y(1)"])]
    #[case(&["cmd", "plain", "args"])]
    #[case(&["cmd", "a.b.c(1)"])]
    fn test_unchanged_without_wellformed_call(#[case] input: &[&str]) {
        assert_eq!(expand(&tokens(input)), tokens(input));
    }

    #[rstest]
    #[case(r#"a, "b, c", 'd'"#, &["a", "b, c", "d"])]
    #[case(r#"a\,b"#, &["a,b"])]
    #[case(r#""  spaced  ""#, &["  spaced  "])]
    #[case("", &[])]
    #[case("a,", &["a", ""])]
    #[case(",", &["", ""])]
    #[case("a, ", &["a", ""])]
    fn test_split_arguments(#[case] input: &str, #[case] expected: &[&str]) {
        assert_eq!(split_arguments(input), tokens(expected));
    }

    #[test]
    fn test_parse_call_allows_newlines() {
        let call = parse_call("agent.run(a,\nb)").unwrap();
        assert_eq!(call.arguments, tokens(&["a", "b"]));
    }
}
