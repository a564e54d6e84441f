//! Surface builder
//!
//! Compiles every registered operation into a command and assembles the
//! command table the parser works against. Operations that cannot be turned
//! into a command are left out and reported through [`Surface::ignored`];
//! they never stop the rest of the surface from being built.
//!
//! ```text
//! procli
//! ├── --verbose-errors, --interactive, -h/--help   # global flags
//! ├── math.add <parameter 1> <parameter 2>          # tuple contract
//! ├── math.divide --numerator --denominator         # object contract
//! └── cerebro.exec --agent --method --params...     # shorthand target
//! ```

use clap::{Arg, ArgAction, Command};
use indexmap::IndexMap;
use procli_common::{ErrorSeverity, Severity};
use procli_contract::{compile, CompiledCommand, FlagDefinition, Operation, ValueKind};
use procli_config::CliConfig;
use thiserror::Error;
use tracing::{debug, warn};

/// Long spellings taken by global flags
pub const RESERVED_LONG_FLAGS: [&str; 4] = ["verbose-errors", "verboseErrors", "interactive", "help"];

/// Short spelling taken by `--help`
pub const RESERVED_ALIAS: char = 'h';

/// Problems assembling the command table
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SurfaceError {
    #[error("Invalid alias {alias:?} for --{flag} on {command}: aliases must be a single letter or digit")]
    InvalidAlias {
        command: String,
        flag: String,
        alias: String,
    },

    #[error("Alias -{alias} is used by both --{first} and --{second} on {command}")]
    DuplicateAlias {
        command: String,
        alias: char,
        first: String,
        second: String,
    },

    #[error("Alias -h for --{flag} on {command} is reserved for --help")]
    ReservedAlias { command: String, flag: String },

    #[error("Flag --{flag} on {command} clashes with a global flag")]
    ReservedFlag { command: String, flag: String },

    #[error("Flags {first} and {second} on {command} both map to --{long}")]
    FlagCollision {
        command: String,
        long: String,
        first: String,
        second: String,
    },

    #[error("Default command \"{name}\" is not a known command")]
    UnknownDefault { name: String },
}

impl Severity for SurfaceError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            SurfaceError::UnknownDefault { .. } => ErrorSeverity::Error,
            _ => ErrorSeverity::Warning,
        }
    }
}

/// What an alias policy sees when asked about one flag
pub struct AliasContext<'a> {
    pub command: &'a str,
    pub flags: &'a IndexMap<String, FlagDefinition>,
}

/// Chooses single-character aliases for flags
///
/// Returning `None` or an empty string leaves the flag without an alias.
pub trait AliasPolicy: Send + Sync {
    fn alias(&self, flag: &str, context: &AliasContext<'_>) -> Option<String>;
}

impl<F> AliasPolicy for F
where
    F: Fn(&str, &AliasContext<'_>) -> Option<String> + Send + Sync,
{
    fn alias(&self, flag: &str, context: &AliasContext<'_>) -> Option<String> {
        self(flag, context)
    }
}

/// Wrap a closure as an [`AliasPolicy`]
pub fn alias_fn<F>(f: F) -> F
where
    F: Fn(&str, &AliasContext<'_>) -> Option<String> + Send + Sync,
{
    f
}

/// Alias policy reading the `aliases` table of the configuration
#[derive(Debug, Clone, Default)]
pub struct ConfiguredAliases {
    config: CliConfig,
}

impl ConfiguredAliases {
    pub fn new(config: CliConfig) -> Self {
        Self { config }
    }
}

impl AliasPolicy for ConfiguredAliases {
    fn alias(&self, flag: &str, context: &AliasContext<'_>) -> Option<String> {
        self.config
            .alias_for(context.command, flag)
            .map(str::to_string)
    }
}

/// An operation left out of the surface, with the reason
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnoredOperation {
    pub operation: String,
    pub reason: String,
}

/// Builder for a [`Surface`]
pub struct SurfaceBuilder {
    program: String,
    version: Option<String>,
    description: Option<String>,
    alias_policy: Option<Box<dyn AliasPolicy>>,
    default_command: Option<String>,
}

impl SurfaceBuilder {
    /// Create a builder for a program name used in usage lines
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            version: None,
            description: None,
            alias_policy: None,
            default_command: None,
        }
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn alias_policy<P: AliasPolicy + 'static>(mut self, policy: P) -> Self {
        self.alias_policy = Some(Box::new(policy));
        self
    }

    /// Command used when no command token is given
    pub fn default_command(mut self, name: impl Into<String>) -> Self {
        self.default_command = Some(name.into());
        self
    }

    /// Compile the operations and assemble the command table
    ///
    /// # Arguments
    ///
    /// * `operations` - Operations in the order they should be listed
    ///
    /// # Returns
    ///
    /// The surface, or an error when the default command is not part of it
    pub fn build<'a, I>(self, operations: I) -> Result<Surface, SurfaceError>
    where
        I: IntoIterator<Item = &'a Operation>,
    {
        let mut commands = IndexMap::new();
        let mut ignored = Vec::new();

        for operation in operations {
            let outcome = compile(operation)
                .map_err(|e| e.to_string())
                .and_then(|command| self.finish(command).map_err(|e| e.to_string()));
            match outcome {
                Ok(command) => {
                    commands.insert(command.name.clone(), command);
                }
                Err(reason) => {
                    warn!("Ignoring operation {}: {}", operation.name, reason);
                    ignored.push(IgnoredOperation {
                        operation: operation.name.clone(),
                        reason,
                    });
                }
            }
        }

        if let Some(name) = &self.default_command {
            if !commands.contains_key(name) {
                return Err(SurfaceError::UnknownDefault { name: name.clone() });
            }
        }

        debug!(
            "Built surface with {} command(s), {} ignored",
            commands.len(),
            ignored.len()
        );
        Ok(Surface {
            program: self.program,
            version: self.version,
            description: self.description,
            commands,
            default_command: self.default_command,
            ignored,
        })
    }

    fn finish(&self, mut command: CompiledCommand) -> Result<CompiledCommand, SurfaceError> {
        {
            let mut longs: IndexMap<&str, &str> = IndexMap::new();
            for flag in command.flags.values() {
                if RESERVED_LONG_FLAGS.contains(&flag.long.as_str())
                    || RESERVED_LONG_FLAGS.contains(&flag.name.as_str())
                {
                    return Err(SurfaceError::ReservedFlag {
                        command: command.name.clone(),
                        flag: flag.long.clone(),
                    });
                }
                if let Some(first) = longs.insert(flag.long.as_str(), flag.name.as_str()) {
                    return Err(SurfaceError::FlagCollision {
                        command: command.name.clone(),
                        long: flag.long.clone(),
                        first: first.to_string(),
                        second: flag.name.clone(),
                    });
                }
            }
        }

        let Some(policy) = &self.alias_policy else {
            return Ok(command);
        };

        let mut assigned: Vec<(char, String)> = Vec::new();
        {
            let context = AliasContext {
                command: &command.name,
                flags: &command.flags,
            };
            for name in command.flags.keys() {
                let Some(alias) = policy.alias(name, &context) else {
                    continue;
                };
                if alias.is_empty() {
                    continue;
                }
                let mut chars = alias.chars();
                let (Some(c), None) = (chars.next(), chars.next()) else {
                    return Err(SurfaceError::InvalidAlias {
                        command: command.name.clone(),
                        flag: name.clone(),
                        alias,
                    });
                };
                if !c.is_ascii_alphanumeric() {
                    return Err(SurfaceError::InvalidAlias {
                        command: command.name.clone(),
                        flag: name.clone(),
                        alias,
                    });
                }
                if c == RESERVED_ALIAS {
                    return Err(SurfaceError::ReservedAlias {
                        command: command.name.clone(),
                        flag: name.clone(),
                    });
                }
                if let Some((_, first)) = assigned.iter().find(|(taken, _)| *taken == c) {
                    return Err(SurfaceError::DuplicateAlias {
                        command: command.name.clone(),
                        alias: c,
                        first: first.clone(),
                        second: name.clone(),
                    });
                }
                assigned.push((c, name.clone()));
            }
        }

        for (alias, flag) in assigned {
            command.assign_alias(&flag, alias);
        }
        Ok(command)
    }
}

/// The assembled command table
#[derive(Debug, Clone)]
pub struct Surface {
    program: String,
    version: Option<String>,
    description: Option<String>,
    commands: IndexMap<String, CompiledCommand>,
    default_command: Option<String>,
    ignored: Vec<IgnoredOperation>,
}

impl Surface {
    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn command(&self, name: &str) -> Option<&CompiledCommand> {
        self.commands.get(name)
    }

    pub fn commands(&self) -> impl Iterator<Item = &CompiledCommand> {
        self.commands.values()
    }

    pub fn default_command(&self) -> Option<&str> {
        self.default_command.as_deref()
    }

    /// Operations left out of the surface, with reasons
    pub fn ignored(&self) -> &[IgnoredOperation] {
        &self.ignored
    }

    /// Help listing the global flags and every command
    pub fn root_help(&self) -> String {
        let mut root = Command::new(self.program.clone())
            .disable_help_flag(true)
            .disable_version_flag(true)
            .disable_help_subcommand(true)
            .override_usage(format!("{} [OPTIONS] <COMMAND>", self.program))
            .args(global_args());
        if let Some(description) = &self.description {
            root = root.about(description.clone());
        }
        if let Some(version) = &self.version {
            root = root.before_help(format!("{} {}", self.program, version));
        }
        for command in self.commands.values() {
            let mut sub = Command::new(command.name.clone());
            if let Some(description) = &command.meta.description {
                sub = sub.about(description.clone());
            }
            root = root.subcommand(sub);
        }
        if let Some(name) = &self.default_command {
            root = root.after_help(format!("Default command: {}", name));
        }
        root.render_help().to_string()
    }

    /// Help for one command, or `None` when it is unknown
    pub fn command_help(&self, name: &str) -> Option<String> {
        let command = self.commands.get(name)?;
        let mut cmd = Command::new(command.name.clone())
            .disable_help_flag(true)
            .disable_version_flag(true)
            .override_usage(self.usage(command))
            .args(global_args());
        if let Some(description) = &command.meta.description {
            cmd = cmd.about(description.clone());
        }
        if let Some(version) = &command.meta.version {
            cmd = cmd.before_help(format!("{} {}", command.name, version));
        }
        if !command.meta.examples.is_empty() {
            cmd = cmd.after_help(format!(
                "Examples:\n  {}",
                command.meta.examples.join("\n  ")
            ));
        }
        for flag in command.flags.values() {
            cmd = cmd.arg(flag_arg(flag));
        }
        Some(cmd.render_help().to_string())
    }

    fn usage(&self, command: &CompiledCommand) -> String {
        if let Some(usage) = &command.meta.usage {
            return usage.clone();
        }
        let mut usage = format!("{} {}", self.program, command.name);
        for parameter in &command.parameters {
            usage.push(' ');
            usage.push_str(&parameter.display());
        }
        if !command.flags.is_empty() {
            usage.push_str(" [FLAGS]");
        }
        usage
    }
}

fn global_args() -> [Arg; 3] {
    [
        Arg::new("verbose-errors")
            .long("verbose-errors")
            .action(ArgAction::SetTrue)
            .help("Throw raw errors (by default errors are summarised)"),
        Arg::new("interactive")
            .long("interactive")
            .action(ArgAction::SetTrue)
            .help("Enter interactive mode"),
        Arg::new("help")
            .short(RESERVED_ALIAS)
            .long("help")
            .action(ArgAction::SetTrue)
            .help("Print help"),
    ]
}

fn flag_arg(flag: &FlagDefinition) -> Arg {
    let mut arg = Arg::new(flag.name.clone())
        .long(flag.long.clone())
        .required(flag.required && !flag.is_switch());
    if let Some(alias) = flag.alias {
        arg = arg.short(alias);
    }
    arg = if flag.is_switch() {
        arg.action(ArgAction::SetTrue)
    } else if flag.multiple {
        arg.action(ArgAction::Append)
            .num_args(1..)
            .value_name(value_label(flag))
    } else {
        arg.action(ArgAction::Set).value_name(value_label(flag))
    };

    let mut help = flag.description.clone().unwrap_or_default();
    if let Some(default) = &flag.default {
        if !help.is_empty() {
            help.push(' ');
        }
        help.push_str(&format!("[default: {}]", default));
    }
    if !help.is_empty() {
        arg = arg.help(help);
    }
    arg
}

fn value_label(flag: &FlagDefinition) -> &'static str {
    match flag.value_kind {
        ValueKind::String => "STRING",
        ValueKind::Number => "NUMBER",
        ValueKind::Boolean => "BOOLEAN",
        ValueKind::Object => "JSON",
        ValueKind::Array | ValueKind::Any => "VALUE",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use procli_contract::{InputContract, OperationKind};

    fn divide() -> Operation {
        Operation::new("math.divide", OperationKind::Write)
            .description("Divide two numbers")
            .example("math.divide --numerator 8 --denominator 4")
            .input(InputContract::object([
                ("numerator", InputContract::number().described("Top")),
                ("denominator", InputContract::number().described("Bottom")),
            ]))
    }

    fn add() -> Operation {
        Operation::new("math.add", OperationKind::Read).input(InputContract::tuple(vec![
            InputContract::number(),
            InputContract::number(),
        ]))
    }

    #[test]
    fn test_uncompilable_operations_are_ignored() {
        let broken = Operation::new("broken", OperationKind::Read).input(InputContract::tuple(vec![
            InputContract::object([("a", InputContract::string())]),
            InputContract::string(),
        ]));
        let surface = SurfaceBuilder::new("procli").build([&add(), &broken]).unwrap();
        assert!(surface.command("math.add").is_some());
        assert!(surface.command("broken").is_none());
        assert_eq!(surface.ignored().len(), 1);
        assert_eq!(surface.ignored()[0].operation, "broken");
        assert!(surface.ignored()[0].reason.contains("Positional parameters"));
    }

    #[test]
    fn test_alias_policy_assigns_aliases() {
        let surface = SurfaceBuilder::new("procli")
            .alias_policy(alias_fn(|flag, _| flag.get(..1).map(str::to_string)))
            .build([&divide()])
            .unwrap();
        let command = surface.command("math.divide").unwrap();
        assert_eq!(command.flags["numerator"].alias, Some('n'));
        assert_eq!(command.flags["denominator"].alias, Some('d'));
    }

    #[test]
    fn test_duplicate_alias_excludes_command() {
        let surface = SurfaceBuilder::new("procli")
            .alias_policy(alias_fn(|_, _| Some("x".to_string())))
            .build([&divide()])
            .unwrap();
        assert!(surface.command("math.divide").is_none());
        assert_eq!(
            surface.ignored()[0].reason,
            "Alias -x is used by both --numerator and --denominator on math.divide"
        );
    }

    #[test]
    fn test_multi_character_alias_rejected() {
        let surface = SurfaceBuilder::new("procli")
            .alias_policy(alias_fn(|_, _| Some("xy".to_string())))
            .build([&divide()])
            .unwrap();
        assert!(surface.command("math.divide").is_none());
    }

    #[test]
    fn test_help_alias_is_reserved() {
        let surface = SurfaceBuilder::new("procli")
            .alias_policy(alias_fn(|flag, _| (flag == "numerator").then(|| "h".to_string())))
            .build([&divide()])
            .unwrap();
        assert_eq!(
            surface.ignored()[0].reason,
            "Alias -h for --numerator on math.divide is reserved for --help"
        );
    }

    #[test]
    fn test_empty_alias_means_none() {
        let surface = SurfaceBuilder::new("procli")
            .alias_policy(alias_fn(|_, _| Some(String::new())))
            .build([&divide()])
            .unwrap();
        assert_eq!(surface.command("math.divide").unwrap().flags["numerator"].alias, None);
    }

    #[test]
    fn test_configured_aliases() {
        let mut config = CliConfig::default();
        config
            .aliases
            .entry("math.divide".to_string())
            .or_default()
            .insert("numerator".to_string(), "n".to_string());
        let surface = SurfaceBuilder::new("procli")
            .alias_policy(ConfiguredAliases::new(config))
            .build([&divide()])
            .unwrap();
        let command = surface.command("math.divide").unwrap();
        assert_eq!(command.flags["numerator"].alias, Some('n'));
        assert_eq!(command.flags["denominator"].alias, None);
    }

    #[test]
    fn test_reserved_flag_excludes_command() {
        let operation = Operation::new("x", OperationKind::Read).input(InputContract::object([(
            "interactive",
            InputContract::boolean(),
        )]));
        let surface = SurfaceBuilder::new("procli").build([&operation]).unwrap();
        assert!(surface.command("x").is_none());
    }

    #[test]
    fn test_kebab_collision_excludes_command() {
        let operation = Operation::new("x", OperationKind::Read).input(InputContract::object([
            ("dryRun", InputContract::boolean()),
            ("dry-run", InputContract::boolean()),
        ]));
        let surface = SurfaceBuilder::new("procli").build([&operation]).unwrap();
        assert!(surface.command("x").is_none());
    }

    #[test]
    fn test_unknown_default_command() {
        let error = SurfaceBuilder::new("procli")
            .default_command("nope")
            .build([&add()])
            .unwrap_err();
        assert_eq!(error, SurfaceError::UnknownDefault { name: "nope".into() });
    }

    #[test]
    fn test_root_help_lists_commands_and_globals() {
        let surface = SurfaceBuilder::new("procli")
            .default_command("math.add")
            .build([&add(), &divide()])
            .unwrap();
        let help = surface.root_help();
        assert!(help.contains("math.add"));
        assert!(help.contains("Divide two numbers"));
        assert!(help.contains("--verbose-errors"));
        assert!(help.contains("--interactive"));
        assert!(help.contains("Default command: math.add"));
    }

    #[test]
    fn test_command_help_renders_parameters_and_flags() {
        let surface = SurfaceBuilder::new("procli").build([&add(), &divide()]).unwrap();
        let help = surface.command_help("math.add").unwrap();
        assert!(help.contains("procli math.add <parameter 1> <parameter 2>"));

        let help = surface.command_help("math.divide").unwrap();
        assert!(help.contains("--numerator <NUMBER>"));
        assert!(help.contains("Bottom"));
        assert!(help.contains("math.divide --numerator 8 --denominator 4"));
        assert!(surface.command_help("missing").is_none());
    }
}
