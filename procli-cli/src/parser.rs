//! Argv parser
//!
//! Resolves the command, rewrites shorthand calls, and splits the remaining
//! tokens into positionals and raw flag values for the compiled command.

use crate::shorthand;
use crate::surface::Surface;
use procli_common::{ErrorSeverity, Severity};
use procli_contract::{parse_number, CompiledCommand, FlagDefinition, RawFlagValue, RawFlags};
use thiserror::Error;
use tracing::trace;

/// Global flags, accepted anywhere before `--`
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GlobalFlags {
    pub verbose_errors: bool,
    pub interactive: bool,
    pub help: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Global {
    VerboseErrors,
    Interactive,
    Help,
}

/// The result of parsing one argv
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedInvocation {
    /// Resolved command, `None` only for help or interactive without one
    pub command: Option<String>,
    pub positionals: Vec<String>,
    pub flags: RawFlags,
    pub interactive: bool,
    pub verbose_errors: bool,
    pub help: bool,
    /// `name(<json>)` command token, joined with the tokens it spans
    pub call_expression: Option<String>,
}

/// Argv that does not match the surface
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseFailure {
    #[error("Command not found: {}.", quoted(.name))]
    CommandNotFound { name: String },

    #[error("No command specified.")]
    NoCommand,

    #[error("Flag name {} must be longer than a character", quoted(.name))]
    SingleCharacterFlag { command: String, name: String },

    #[error("Unknown flag: --{flag}")]
    UnknownFlag { command: String, flag: String },

    #[error("Unknown flag alias: -{alias}")]
    UnknownAlias { command: String, alias: String },

    #[error("Flag --{flag} requires a value")]
    MissingValue { command: String, flag: String },
}

impl ParseFailure {
    /// Whether help should follow the message
    pub fn show_help(&self) -> bool {
        true
    }

    /// The command resolved before the failure, if any
    pub fn command(&self) -> Option<&str> {
        match self {
            Self::CommandNotFound { .. } | Self::NoCommand => None,
            Self::SingleCharacterFlag { command, .. }
            | Self::UnknownFlag { command, .. }
            | Self::UnknownAlias { command, .. }
            | Self::MissingValue { command, .. } => Some(command),
        }
    }
}

impl Severity for ParseFailure {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Error
    }
}

fn quoted(text: &str) -> String {
    serde_json::to_string(text).unwrap_or_else(|_| format!("\"{}\"", text))
}

fn global_flag(token: &str) -> Option<(Global, bool)> {
    let (name, value) = match token.split_once('=') {
        Some((name, value)) => (name, Some(value)),
        None => (token, None),
    };
    let global = match name {
        "--verbose-errors" | "--verboseErrors" => Global::VerboseErrors,
        "--interactive" => Global::Interactive,
        "--help" | "-h" => Global::Help,
        _ => return None,
    };
    match value {
        None | Some("true") => Some((global, true)),
        Some("false") => Some((global, false)),
        Some(_) => None,
    }
}

/// Collect the global flags appearing before `--`
pub fn scan_globals(tokens: &[String]) -> GlobalFlags {
    let mut globals = GlobalFlags::default();
    for token in tokens.iter().take_while(|token| token.as_str() != "--") {
        match global_flag(token) {
            Some((Global::VerboseErrors, on)) => globals.verbose_errors = on,
            Some((Global::Interactive, on)) => globals.interactive = on,
            Some((Global::Help, on)) => globals.help = on,
            None => {}
        }
    }
    globals
}

/// The last `--verbose-errors` setting before `--`, if the flag was given
pub fn verbose_override(tokens: &[String]) -> Option<bool> {
    tokens
        .iter()
        .take_while(|token| token.as_str() != "--")
        .filter_map(|token| match global_flag(token) {
            Some((Global::VerboseErrors, on)) => Some(on),
            _ => None,
        })
        .last()
}

/// Whether a token is a flag rather than a value
///
/// A lone `-` and negative numbers such as `-1`, `-0.5` or `-Infinity` are
/// values.
pub fn is_flag_token(token: &str) -> bool {
    if token.starts_with("--") {
        return true;
    }
    match token.strip_prefix('-') {
        Some(rest) => !rest.is_empty() && rest != "Infinity" && parse_number(rest).is_none(),
        None => false,
    }
}

/// Whether a token ends the values collected for a multi-value flag
fn is_array_boundary(command: &CompiledCommand, token: &str) -> bool {
    if token.starts_with("--") {
        return true;
    }
    if !is_flag_token(token) {
        return false;
    }
    let spelling = token[1..].split('=').next().unwrap_or_default();
    let mut chars = spelling.chars();
    match (chars.next(), chars.next()) {
        (Some(alias), None) => command.flag_by_alias(alias).is_some(),
        _ => false,
    }
}

fn split_inline(flag: &str) -> (&str, Option<&str>) {
    match flag.split_once('=') {
        Some((name, value)) => (name, Some(value)),
        None => (flag, None),
    }
}

/// Parse argv (without the program name) against a surface
pub fn parse(tokens: &[String], surface: &Surface) -> Result<ParsedInvocation, ParseFailure> {
    let globals = scan_globals(tokens);
    let mut invocation = ParsedInvocation {
        interactive: globals.interactive,
        verbose_errors: globals.verbose_errors,
        help: globals.help,
        ..Default::default()
    };

    let start = tokens
        .iter()
        .position(|token| global_flag(token).is_none())
        .unwrap_or(tokens.len());
    let candidate = tokens
        .get(start)
        .filter(|token| !is_flag_token(token));

    let (command, rest) = match candidate {
        Some(token) => {
            let name = token.split('(').next().unwrap_or_default();
            if let Some(command) = surface.command(name) {
                let mut rest = start + 1;
                if token.contains('(') {
                    let mut expression = vec![token.as_str()];
                    while let Some(next) = tokens.get(rest) {
                        if next.starts_with("--") || global_flag(next).is_some() {
                            break;
                        }
                        expression.push(next);
                        rest += 1;
                    }
                    invocation.call_expression = Some(expression.join(" "));
                }
                (command, rest)
            } else if let Some(command) = surface.default_command().and_then(|d| surface.command(d)) {
                (command, start)
            } else {
                return Err(ParseFailure::CommandNotFound {
                    name: name.to_string(),
                });
            }
        }
        None => match surface.default_command().and_then(|d| surface.command(d)) {
            Some(command) if !invocation.help && !invocation.interactive => (command, start),
            _ if invocation.help || invocation.interactive => return Ok(invocation),
            _ => return Err(ParseFailure::NoCommand),
        },
    };

    if let Some(name) = command.flags.keys().find(|name| name.chars().count() == 1) {
        return Err(ParseFailure::SingleCharacterFlag {
            command: command.name.clone(),
            name: name.clone(),
        });
    }

    invocation.command = Some(command.name.clone());
    let body = if invocation.call_expression.is_some() {
        tokens[rest..].to_vec()
    } else {
        let mut stream = Vec::with_capacity(tokens.len() - rest + 1);
        stream.push(command.name.clone());
        stream.extend_from_slice(&tokens[rest..]);
        let mut expanded = shorthand::expand(&stream);
        expanded.remove(0);
        expanded
    };
    trace!("Parsing {:?} for {}", body, command.name);

    let mut literal = false;
    let mut index = 0;
    while index < body.len() {
        let token = &body[index];
        index += 1;
        if literal {
            invocation.positionals.push(token.clone());
            continue;
        }
        if token == "--" {
            literal = true;
            continue;
        }
        if global_flag(token).is_some() {
            continue;
        }
        if let Some(long) = token.strip_prefix("--") {
            let (spelling, inline) = split_inline(long);
            let flag = command
                .flag_by_long(spelling)
                .ok_or_else(|| ParseFailure::UnknownFlag {
                    command: command.name.clone(),
                    flag: spelling.to_string(),
                })?;
            index = take_value(command, flag, inline, &body, index, &mut invocation.flags)?;
        } else if is_flag_token(token) {
            let (spelling, inline) = split_inline(&token[1..]);
            let mut chars = spelling.chars();
            let flag = match (chars.next(), chars.next()) {
                (Some(alias), None) => command.flag_by_alias(alias),
                _ => None,
            }
            .ok_or_else(|| ParseFailure::UnknownAlias {
                command: command.name.clone(),
                alias: spelling.to_string(),
            })?;
            index = take_value(command, flag, inline, &body, index, &mut invocation.flags)?;
        } else {
            invocation.positionals.push(token.clone());
        }
    }

    Ok(invocation)
}

fn take_value(
    command: &CompiledCommand,
    flag: &FlagDefinition,
    inline: Option<&str>,
    body: &[String],
    mut index: usize,
    flags: &mut RawFlags,
) -> Result<usize, ParseFailure> {
    if flag.is_switch() {
        let raw = match inline {
            Some(value) => RawFlagValue::Single(value.to_string()),
            None => RawFlagValue::Switch,
        };
        flags.insert(flag.name.clone(), raw);
        return Ok(index);
    }

    if flag.multiple {
        let mut values = match flags.shift_remove(&flag.name) {
            Some(RawFlagValue::Many(values)) => values,
            Some(RawFlagValue::Single(value)) => vec![value],
            _ => Vec::new(),
        };
        let before = values.len();
        match inline {
            Some(value) => values.push(value.to_string()),
            None => {
                while let Some(token) = body.get(index) {
                    if is_array_boundary(command, token) {
                        break;
                    }
                    values.push(token.clone());
                    index += 1;
                }
            }
        }
        if values.len() == before {
            return Err(ParseFailure::MissingValue {
                command: command.name.clone(),
                flag: flag.long.clone(),
            });
        }
        flags.insert(flag.name.clone(), RawFlagValue::Many(values));
        return Ok(index);
    }

    let value = match inline {
        Some(value) => value.to_string(),
        None => {
            let token = body
                .get(index)
                .filter(|token| !is_flag_token(token))
                .ok_or_else(|| ParseFailure::MissingValue {
                    command: command.name.clone(),
                    flag: flag.long.clone(),
                })?;
            index += 1;
            token.clone()
        }
    };
    flags.insert(flag.name.clone(), RawFlagValue::Single(value));
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{alias_fn, SurfaceBuilder};
    use procli_contract::{InputContract, Operation, OperationKind};
    use rstest::rstest;

    fn tokens(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn surface() -> Surface {
        let tagged = Operation::new("tagged", OperationKind::Write).input(InputContract::object([
            ("values", InputContract::array(InputContract::string())),
            ("tag", InputContract::string().optional()),
            ("dryRun", InputContract::boolean().optional()),
        ]));
        let add = Operation::new("math.add", OperationKind::Read).input(InputContract::tuple(vec![
            InputContract::number(),
            InputContract::number(),
        ]));
        let exec = Operation::new("cerebro.exec", OperationKind::Write).input(InputContract::object([
            ("agent", InputContract::string()),
            ("method", InputContract::string()),
            ("params", InputContract::array(InputContract::string()).optional()),
        ]));
        let short = Operation::new("short", OperationKind::Read)
            .input(InputContract::object([("a", InputContract::string())]));
        SurfaceBuilder::new("procli")
            .alias_policy(alias_fn(|flag, ctx| match (ctx.command, flag) {
                ("tagged", "tag") => Some("t".to_string()),
                _ => None,
            }))
            .build([&tagged, &add, &exec, &short])
            .unwrap()
    }

    fn many(values: &[&str]) -> RawFlagValue {
        RawFlagValue::Many(tokens(values))
    }

    #[test]
    fn test_negative_numbers_are_array_values() {
        let parsed = parse(&tokens(&["tagged", "--values", "-1", "-2", "3", "--tag", "demo"]), &surface()).unwrap();
        assert_eq!(parsed.flags["values"], many(&["-1", "-2", "3"]));
        assert_eq!(parsed.flags["tag"], RawFlagValue::Single("demo".into()));
    }

    #[test]
    fn test_lone_dash_is_an_array_value() {
        let parsed = parse(&tokens(&["tagged", "--values", "-", "literal", "--tag", "demo"]), &surface()).unwrap();
        assert_eq!(parsed.flags["values"], many(&["-", "literal"]));
    }

    #[test]
    fn test_declared_alias_ends_array() {
        let parsed = parse(&tokens(&["tagged", "--values", "a", "-t=x", "b"]), &surface()).unwrap();
        assert_eq!(parsed.flags["values"], many(&["a"]));
        assert_eq!(parsed.flags["tag"], RawFlagValue::Single("x".into()));
        assert_eq!(parsed.positionals, tokens(&["b"]));
    }

    #[test]
    fn test_undeclared_short_flag_is_absorbed_by_array() {
        let parsed = parse(&tokens(&["tagged", "--values", "a", "-z"]), &surface()).unwrap();
        assert_eq!(parsed.flags["values"], many(&["a", "-z"]));
    }

    #[test]
    fn test_inline_values_accumulate() {
        let parsed = parse(&tokens(&["tagged", "--values=a", "--values=b"]), &surface()).unwrap();
        assert_eq!(parsed.flags["values"], many(&["a", "b"]));
    }

    #[test]
    fn test_switch_and_kebab_spelling() {
        let parsed = parse(&tokens(&["tagged", "--dry-run", "--values", "x"]), &surface()).unwrap();
        assert_eq!(parsed.flags["dryRun"], RawFlagValue::Switch);
        let parsed = parse(&tokens(&["tagged", "--dryRun=false"]), &surface()).unwrap();
        assert_eq!(parsed.flags["dryRun"], RawFlagValue::Single("false".into()));
    }

    #[test]
    fn test_positionals_and_globals() {
        let parsed = parse(&tokens(&["--verbose-errors", "math.add", "1", "-2"]), &surface()).unwrap();
        assert_eq!(parsed.command.as_deref(), Some("math.add"));
        assert_eq!(parsed.positionals, tokens(&["1", "-2"]));
        assert!(parsed.verbose_errors);
    }

    #[test]
    fn test_double_dash_ends_flags() {
        let parsed = parse(&tokens(&["math.add", "--", "--help", "2"]), &surface()).unwrap();
        assert_eq!(parsed.positionals, tokens(&["--help", "2"]));
        assert!(!parsed.help);
    }

    #[test]
    fn test_shorthand_matches_long_form() {
        let surface = surface();
        let short = parse(&tokens(&["cerebro.exec", r#"agent.method("a", "")"#]), &surface).unwrap();
        let long = parse(
            &tokens(&["cerebro.exec", "--agent", "agent", "--method", "method", "--params", "a", ""]),
            &surface,
        )
        .unwrap();
        assert_eq!(short, long);
    }

    #[test]
    fn test_shorthand_without_arguments_omits_params() {
        let parsed = parse(&tokens(&["cerebro.exec", "Hisoka.run()"]), &surface()).unwrap();
        assert_eq!(parsed.flags["agent"], RawFlagValue::Single("Hisoka".into()));
        assert_eq!(parsed.flags["method"], RawFlagValue::Single("run".into()));
        assert!(!parsed.flags.contains_key("params"));
    }

    #[test]
    fn test_call_expression_is_kept() {
        let parsed = parse(&tokens(&["math.add([1,", "2])"]), &surface()).unwrap();
        assert_eq!(parsed.command.as_deref(), Some("math.add"));
        assert_eq!(parsed.call_expression.as_deref(), Some("math.add([1, 2])"));
        assert!(parsed.positionals.is_empty());
    }

    #[test]
    fn test_help_without_command() {
        let parsed = parse(&tokens(&["--help"]), &surface()).unwrap();
        assert_eq!(parsed.command, None);
        assert!(parsed.help);
    }

    #[rstest]
    #[case(&["does.not.exist"], "Command not found: \"does.not.exist\".")]
    #[case(&[], "No command specified.")]
    #[case(&["tagged", "--nope"], "Unknown flag: --nope")]
    #[case(&["tagged", "-q"], "Unknown flag alias: -q")]
    #[case(&["tagged", "--tag"], "Flag --tag requires a value")]
    #[case(&["tagged", "--values", "--tag", "x"], "Flag --values requires a value")]
    #[case(&["short", "--a", "x"], "Flag name \"a\" must be longer than a character")]
    fn test_failures(#[case] argv: &[&str], #[case] message: &str) {
        let failure = parse(&tokens(argv), &surface()).unwrap_err();
        assert_eq!(failure.to_string(), message);
        assert!(failure.show_help());
    }

    #[rstest]
    #[case(&["does.not.exist"], None)]
    #[case(&["tagged", "--nope"], Some("tagged"))]
    #[case(&["tagged", "--values"], Some("tagged"))]
    #[case(&["short", "--a", "x"], Some("short"))]
    fn test_failure_names_resolved_command(#[case] argv: &[&str], #[case] command: Option<&str>) {
        let failure = parse(&tokens(argv), &surface()).unwrap_err();
        assert_eq!(failure.command(), command);
    }

    #[test]
    fn test_default_command_takes_unknown_token_as_positional() {
        let add = Operation::new("math.add", OperationKind::Read).input(InputContract::tuple(vec![
            InputContract::number(),
            InputContract::number(),
        ]));
        let surface = SurfaceBuilder::new("procli")
            .default_command("math.add")
            .build([&add])
            .unwrap();
        let parsed = parse(&tokens(&["4", "5"]), &surface).unwrap();
        assert_eq!(parsed.command.as_deref(), Some("math.add"));
        assert_eq!(parsed.positionals, tokens(&["4", "5"]));

        let parsed = parse(&tokens(&[]), &surface).unwrap();
        assert_eq!(parsed.command.as_deref(), Some("math.add"));
    }

    #[rstest]
    #[case("-", false)]
    #[case("-1", false)]
    #[case("-0.5", false)]
    #[case("-Infinity", false)]
    #[case("-Inf", true)]
    #[case("-a", true)]
    #[case("--x", true)]
    #[case("value", false)]
    fn test_is_flag_token(#[case] token: &str, #[case] expected: bool) {
        assert_eq!(is_flag_token(token), expected);
    }

    #[test]
    fn test_verbose_override() {
        assert_eq!(verbose_override(&tokens(&["x"])), None);
        assert_eq!(verbose_override(&tokens(&["x", "--verboseErrors"])), Some(true));
        assert_eq!(verbose_override(&tokens(&["--verbose-errors=false", "x"])), Some(false));
    }

    #[test]
    fn test_scan_globals_stops_at_double_dash() {
        let globals = scan_globals(&tokens(&["x", "--interactive", "--", "--help"]));
        assert!(globals.interactive);
        assert!(!globals.help);
    }
}
