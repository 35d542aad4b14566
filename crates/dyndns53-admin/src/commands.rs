//! Command table
//!
//! Every administration command is one [`CommandSpec`] entry in
//! [`COMMANDS`]. Help output and the clap command tree are both generated
//! from this table, so adding a command means adding an entry here and a
//! match arm for its [`Action`].

use clap::{Arg, Command};

/// Program name used in usage lines
pub const PROGRAM: &str = "dyndns53";

/// What a command does when run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Print general or per-command help
    Help,
    /// Upload a local file as the credential database
    UploadDatabase,
    /// Download the credential database
    DownloadDatabase,
}

/// A positional command argument
#[derive(Debug, Clone, Copy)]
pub struct ArgSpec {
    /// Argument name, as shown in usage lines
    pub name: &'static str,
    /// Whether the argument must be given
    pub required: bool,
}

/// One entry of the command table
#[derive(Debug, Clone, Copy)]
pub struct CommandSpec {
    /// Command name (first CLI argument)
    pub name: &'static str,
    /// Positional arguments, in order
    pub args: &'static [ArgSpec],
    /// One-line description
    pub description: &'static str,
    /// Hidden commands are not listed in general help
    pub hidden: bool,
    /// Handler
    pub action: Action,
}

/// All administration commands
pub const COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        name: "help",
        args: &[ArgSpec {
            name: "command",
            required: false,
        }],
        description: "Show help for a command.",
        hidden: true,
        action: Action::Help,
    },
    CommandSpec {
        name: "upload-database",
        args: &[ArgSpec {
            name: "input_file",
            required: true,
        }],
        description: "Upload the database file to storage.",
        hidden: false,
        action: Action::UploadDatabase,
    },
    CommandSpec {
        name: "download-database",
        args: &[ArgSpec {
            name: "output_file",
            required: false,
        }],
        description: "Download the database file from storage.",
        hidden: false,
        action: Action::DownloadDatabase,
    },
];

/// Look up a command by name
pub fn find(name: &str) -> Option<&'static CommandSpec> {
    COMMANDS.iter().find(|spec| spec.name == name)
}

impl CommandSpec {
    /// Argument synopsis, e.g. `input_file` or `[output_file]`
    pub fn synopsis(&self) -> String {
        self.args
            .iter()
            .map(|arg| {
                if arg.required {
                    arg.name.to_string()
                } else {
                    format!("[{}]", arg.name)
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Usage line for this command
    pub fn usage(&self) -> String {
        format!("Usage: {} {} {}", PROGRAM, self.name, self.synopsis())
            .trim_end()
            .to_string()
    }

    /// Help text: usage line followed by the description
    pub fn help(&self) -> String {
        format!("{}\n\n{}\n", self.usage(), self.description)
    }

    /// clap definition of this command
    fn to_clap(&self) -> Command {
        let args = self.args.iter().map(|arg| {
            Arg::new(arg.name)
                .value_name(arg.name)
                .required(arg.required)
        });

        Command::new(self.name)
            .about(self.description)
            .hide(self.hidden)
            .disable_help_flag(true)
            .args(args)
    }
}

/// General help listing the visible commands, sorted by name
pub fn general_help() -> String {
    let mut names: Vec<&str> = COMMANDS
        .iter()
        .filter(|spec| !spec.hidden)
        .map(|spec| spec.name)
        .collect();
    names.sort_unstable();

    let mut text = format!(
        "Usage: {program} command [options]\n\n\
         Type '{program} help <command>' for help on a specific command.\n\n\
         Available commands are:\n",
        program = PROGRAM
    );
    for name in names {
        text.push_str("  ");
        text.push_str(name);
        text.push('\n');
    }
    text
}

/// Message for a command name not in the table
pub fn unknown_command(name: &str) -> String {
    format!(
        "Unknown command '{}'. Type '{} help' for usage.",
        name, PROGRAM
    )
}

/// clap command tree generated from [`COMMANDS`]
pub fn command_tree() -> Command {
    Command::new(PROGRAM)
        .disable_help_subcommand(true)
        .disable_help_flag(true)
        .subcommands(COMMANDS.iter().map(CommandSpec::to_clap))
}
