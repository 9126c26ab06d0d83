//! Environment variable configuration
//!
//! Provides environment variable overrides for configuration.

use std::env;

/// Environment variable prefix
const ENV_PREFIX: &str = "TESTPOOL";

/// Environment configuration from environment variables
#[derive(Clone, Debug, Default)]
pub struct EnvConfig {
    /// Concurrency bound from TESTPOOL_CONCURRENCY
    pub concurrency: Option<usize>,
    /// Per-file timeout from TESTPOOL_TIMEOUT
    pub timeout: Option<u64>,
    /// Runner program from TESTPOOL_RUNNER
    pub runner: Option<String>,
    /// Verbose from TESTPOOL_VERBOSE
    pub verbose: Option<bool>,
    /// Config file from TESTPOOL_CONFIG
    pub config_file: Option<String>,
    /// Profile name from TESTPOOL_PROFILE
    pub profile: Option<String>,
    /// Output format from TESTPOOL_FORMAT
    pub format: Option<String>,
    /// Colour output from TESTPOOL_COLOR
    pub color: Option<bool>,
    /// Log filter from TESTPOOL_LOG
    pub log: Option<String>,
}

impl EnvConfig {
    /// Load configuration from environment variables
    pub fn load() -> Self {
        Self {
            concurrency: get_env_parse("CONCURRENCY"),
            timeout: get_env_parse("TIMEOUT"),
            runner: get_env("RUNNER"),
            verbose: get_env_bool("VERBOSE"),
            config_file: get_env("CONFIG"),
            profile: get_env("PROFILE"),
            format: get_env("FORMAT"),
            color: get_env_bool("COLOR").or_else(|| env::var("NO_COLOR").ok().map(|_| false)),
            log: get_env("LOG"),
        }
    }

    /// Check if any environment variables are set
    pub fn has_any(&self) -> bool {
        self.concurrency.is_some()
            || self.timeout.is_some()
            || self.runner.is_some()
            || self.verbose.is_some()
            || self.config_file.is_some()
            || self.profile.is_some()
            || self.format.is_some()
            || self.color.is_some()
            || self.log.is_some()
    }

    /// Print current environment configuration
    pub fn print_summary(&self) {
        println!("Environment Configuration:");
        println!("  {}_CONCURRENCY: {:?}", ENV_PREFIX, self.concurrency);
        println!("  {}_TIMEOUT:     {:?}", ENV_PREFIX, self.timeout);
        println!("  {}_RUNNER:      {:?}", ENV_PREFIX, self.runner);
        println!("  {}_VERBOSE:     {:?}", ENV_PREFIX, self.verbose);
        println!("  {}_CONFIG:      {:?}", ENV_PREFIX, self.config_file);
        println!("  {}_PROFILE:     {:?}", ENV_PREFIX, self.profile);
        println!("  {}_FORMAT:      {:?}", ENV_PREFIX, self.format);
        println!("  {}_COLOR:       {:?}", ENV_PREFIX, self.color);
        println!("  {}_LOG:         {:?}", ENV_PREFIX, self.log);
    }
}

/// Get environment variable with prefix
fn get_env(name: &str) -> Option<String> {
    env::var(format!("{ENV_PREFIX}_{name}")).ok()
}

/// Get environment variable and parse to type
fn get_env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    get_env(name).and_then(|v| v.parse().ok())
}

/// Get environment variable as boolean
fn get_env_bool(name: &str) -> Option<bool> {
    get_env(name).map(|v| parse_bool(&v))
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.to_lowercase().as_str(),
        "1" | "true" | "yes" | "on" | "enabled"
    )
}

/// Print all TESTPOOL environment variables
pub fn print_env_help() {
    println!("Environment Variables:");
    println!();
    println!("  {ENV_PREFIX}_CONCURRENCY  Maximum concurrent test processes");
    println!("  {ENV_PREFIX}_TIMEOUT      Per-file timeout in seconds");
    println!("  {ENV_PREFIX}_RUNNER       Program used to run each test file");
    println!("  {ENV_PREFIX}_VERBOSE      Stream all output (true/false)");
    println!("  {ENV_PREFIX}_CONFIG       Path to configuration file");
    println!("  {ENV_PREFIX}_PROFILE      Run profile (unit, ci, ...)");
    println!("  {ENV_PREFIX}_FORMAT       Summary format (text, json, json-pretty)");
    println!("  {ENV_PREFIX}_COLOR        Colourise output (true/false)");
    println!("  {ENV_PREFIX}_LOG          Log filter (error, warn, info, debug, trace)");
    println!("  NO_COLOR              Disable colour output");
    println!();
    println!("Example:");
    println!("  export {ENV_PREFIX}_CONCURRENCY=4");
    println!("  testpool run --verbose");
}
