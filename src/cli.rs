use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Profile tabular data: column types, quality score and business domain",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Profile a CSV file and report statistics, quality and domain
    Profile(ProfileArgs),
    /// Print the built-in domain patterns or validate a custom library
    Patterns(PatternsArgs),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON document
    #[default]
    Json,
    /// Human-readable terminal summary
    Table,
}

#[derive(Debug, Args)]
pub struct ProfileArgs {
    /// Input CSV file to profile ('-' reads stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// YAML file overriding profiling thresholds
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// YAML domain pattern library replacing the built-in one
    #[arg(long)]
    pub patterns: Option<PathBuf>,
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,
    /// Write the report to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct PatternsArgs {
    /// Validate a YAML pattern library instead of printing the built-in one
    #[arg(long)]
    pub validate: Option<PathBuf>,
    /// Write the built-in library to a file instead of stdout
    #[arg(short, long, conflicts_with = "validate")]
    pub output: Option<PathBuf>,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_and_literal_delimiters_parse() {
        assert_eq!(parse_delimiter("tab"), Ok(b'\t'));
        assert_eq!(parse_delimiter("semicolon"), Ok(b';'));
        assert_eq!(parse_delimiter(":"), Ok(b':'));
        assert!(parse_delimiter("").is_err());
        assert!(parse_delimiter("ab").is_err());
        assert!(parse_delimiter("§").is_err());
    }

    #[test]
    fn profile_command_defaults_to_json() {
        let cli = Cli::parse_from(["tabular-profiler", "profile", "-i", "data.csv"]);
        let Commands::Profile(args) = cli.command else {
            panic!("expected profile command");
        };
        assert_eq!(args.format, OutputFormat::Json);
        assert_eq!(args.delimiter, None);
        assert!(args.output.is_none());
    }
}
