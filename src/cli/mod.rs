//! CLI argument parsing
//!
//! Defines command-line interface using clap.

use clap::{Parser, Subcommand};

/// Concurrency-bounded test file runner
#[derive(Parser, Debug)]
#[command(name = "testpool")]
#[command(version)]
#[command(about = "Run test files as isolated processes with bounded parallelism")]
#[command(long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file (defaults to ./testpool.yaml and friends)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Log filter (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run test files
    Run(RunArgs),

    /// List the test files that would run
    List(ListArgs),

    /// Show or create configuration
    Config(ConfigArgs),
}

/// Arguments for run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Stream all test output and print one line per start and finish
    #[arg(short, long)]
    pub verbose: bool,

    /// Run every file in one coverage-wrapped process
    #[arg(long)]
    pub coverage: bool,

    /// Maximum concurrent test processes (default: 80% of CPUs)
    #[arg(short = 'j', long)]
    pub concurrency: Option<usize>,

    /// Kill a test file after this many seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Named run profile (unit, ci, or one from the config file)
    #[arg(short, long)]
    pub profile: Option<String>,

    /// Discovery root directory
    #[arg(long)]
    pub root: Option<String>,

    /// Discovery glob pattern (repeatable)
    #[arg(long = "pattern")]
    pub patterns: Vec<String>,

    /// Summary format (text, json, json-pretty)
    #[arg(short, long)]
    pub format: Option<String>,

    /// Save a JSON report of the run
    #[arg(short, long)]
    pub output: Option<String>,

    /// Disable coloured output
    #[arg(long)]
    pub no_color: bool,

    /// Explicit test files to run instead of discovery
    pub files: Vec<String>,
}

/// Arguments for list command
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Named run profile
    #[arg(short, long)]
    pub profile: Option<String>,

    /// Discovery root directory
    #[arg(long)]
    pub root: Option<String>,

    /// Discovery glob pattern (repeatable)
    #[arg(long = "pattern")]
    pub patterns: Vec<String>,
}

/// Arguments for config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration after profile and environment overrides
    Show {
        /// Named run profile to apply
        #[arg(short, long)]
        profile: Option<String>,
    },

    /// Write an example configuration file
    Init {
        /// Destination path
        #[arg(long, default_value = "testpool.yaml")]
        path: String,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Describe environment variable overrides
    Env,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_args_parsing() {
        let args = Args::parse_from(["testpool", "run", "-v", "--coverage", "-j", "3"]);
        match args.command {
            Command::Run(run) => {
                assert!(run.verbose);
                assert!(run.coverage);
                assert_eq!(run.concurrency, Some(3));
                assert!(run.files.is_empty());
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_run_positional_files() {
        let args = Args::parse_from([
            "testpool",
            "run",
            "src/app.test.ts",
            "src/util.test.ts",
            "--timeout",
            "30",
        ]);
        match args.command {
            Command::Run(run) => {
                assert_eq!(run.files, vec!["src/app.test.ts", "src/util.test.ts"]);
                assert_eq!(run.timeout, Some(30));
                assert!(!run.verbose);
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_repeatable_patterns_and_global_config() {
        let args = Args::parse_from([
            "testpool",
            "list",
            "--pattern",
            "ci/**/*.ci.*.ts",
            "--pattern",
            "ci/**/*.ci.*.js",
            "--config",
            "custom.yaml",
        ]);
        assert_eq!(args.config.as_deref(), Some("custom.yaml"));
        match args.command {
            Command::List(list) => assert_eq!(list.patterns.len(), 2),
            _ => panic!("Expected List command"),
        }
    }

    #[test]
    fn test_config_show_profile() {
        let args = Args::parse_from(["testpool", "config", "show", "-p", "ci"]);
        match args.command {
            Command::Config(ConfigArgs {
                action: ConfigAction::Show { profile },
            }) => assert_eq!(profile.as_deref(), Some("ci")),
            _ => panic!("Expected Config Show command"),
        }
    }

    #[test]
    fn test_config_init_defaults() {
        let args = Args::parse_from(["testpool", "config", "init"]);
        match args.command {
            Command::Config(ConfigArgs {
                action: ConfigAction::Init { path, force },
            }) => {
                assert_eq!(path, "testpool.yaml");
                assert!(!force);
            }
            _ => panic!("Expected Config Init command"),
        }
    }
}
