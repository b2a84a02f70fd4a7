//! CLI argument parsing and help text for ava-cred.

use std::path::PathBuf;
use std::time::Duration;

/// Parsed command line: global options plus the command and its arguments.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CliArgs {
    pub command: String,
    pub rest: Vec<String>,
    pub env_file: Option<PathBuf>,
    pub strict: bool,
    pub ttl: Option<Duration>,
    pub log_json: bool,
}

impl CliArgs {
    /// True if `flag` appears among the command arguments.
    pub fn has_flag(&self, flag: &str) -> bool {
        self.rest.iter().any(|a| a == flag)
    }

    /// Value following `option` among the command arguments.
    pub fn option_value(&self, option: &str) -> Option<&str> {
        self.rest
            .iter()
            .position(|a| a == option)
            .and_then(|i| self.rest.get(i + 1))
            .map(String::as_str)
    }

    /// Command arguments that are neither options nor option values.
    pub fn positionals(&self, value_options: &[&str]) -> Vec<&str> {
        let mut out = Vec::new();
        let mut i = 0;
        while i < self.rest.len() {
            let arg = self.rest[i].as_str();
            if value_options.contains(&arg) {
                i += 2;
                continue;
            }
            if !arg.starts_with("--") {
                out.push(arg);
            }
            i += 1;
        }
        out
    }
}

/// Split `args` (including the program name) into global options and the command.
pub fn parse_args(args: &[String]) -> Result<CliArgs, String> {
    let mut cli = CliArgs::default();
    let mut positional = Vec::new();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--env-file" => {
                let value = args.get(i + 1).ok_or("Missing value for --env-file")?;
                cli.env_file = Some(PathBuf::from(value));
                i += 2;
            }
            "--ttl" => {
                let value = args.get(i + 1).ok_or("Missing value for --ttl")?;
                let secs: u64 = value
                    .parse()
                    .map_err(|_| format!("Invalid --ttl value: {}", value))?;
                cli.ttl = Some(Duration::from_secs(secs));
                i += 2;
            }
            "--strict" => {
                cli.strict = true;
                i += 1;
            }
            "--log-json" => {
                cli.log_json = true;
                i += 1;
            }
            other => {
                positional.push(other.to_string());
                i += 1;
            }
        }
    }

    let mut positional = positional.into_iter();
    cli.command = positional.next().unwrap_or_else(|| "status".to_string());
    cli.rest = positional.collect();
    Ok(cli)
}

/// Print general usage information.
pub fn print_usage() {
    let version = env!("CARGO_PKG_VERSION");
    eprintln!(
        "ava-cred - AVA credential and model key tool v{}

USAGE:
    ava-cred [GLOBAL OPTIONS] [COMMAND] [OPTIONS]

COMMANDS:
    status       Show credential sources and licence state (default)
    device-id    Print this machine's licence fingerprint
    validate     Check a licence key against this machine
    keygen       Generate a new model encryption key
    decrypt      Decrypt a model file
    encrypt      Encrypt a model file
    inspect      Show the creation time of a model file
    version      Show version information
    help         Show this help message

GLOBAL OPTIONS:
    --env-file PATH  Secrets file (default: .env next to the executable)
    --strict         Refuse the placeholder encryption key
    --ttl SECONDS    Reject model files older than SECONDS
    --log-json       Emit logs as JSON

ENVIRONMENT:
    AVA_LICENSE_KEY     Licence key (overrides the secrets file)
    AVA_ENCRYPTION_KEY  Model encryption key (overrides the secrets file)
    RUST_LOG            Log level (debug, info, warn, error)

EXIT CODES:
    0  Success / Valid
    1  Failure / Invalid licence
    2  Usage or configuration error
    3  Decryption or I/O error
",
        version
    );
}

/// Print detailed help for a specific command.
pub fn print_command_help(command: &str) {
    match command {
        "status" => print_status_help(),
        "validate" => print_validate_help(),
        "decrypt" => print_decrypt_help(),
        "encrypt" => print_encrypt_help(),
        "inspect" => print_inspect_help(),
        _ => {
            eprintln!(
                "No detailed help available for '{}'. Use 'ava-cred help' for general usage.",
                command
            );
        }
    }
}

fn print_status_help() {
    eprintln!(
        "ava-cred status - Show credential status

USAGE:
    ava-cred status [--json]

OPTIONS:
    --json         Output in JSON format

DESCRIPTION:
    Reports where the licence and encryption keys come from and whether
    the licence matches this machine. Secret values are never printed.
"
    );
}

fn print_validate_help() {
    eprintln!(
        "ava-cred validate - Check a licence key

USAGE:
    ava-cred validate [KEY]

DESCRIPTION:
    Compares KEY (or the configured AVA_LICENSE_KEY) with this machine's
    fingerprint.

EXIT CODES:
    0  Licence valid
    1  Licence invalid or not configured
"
    );
}

fn print_decrypt_help() {
    eprintln!(
        "ava-cred decrypt - Decrypt a model file

USAGE:
    ava-cred decrypt <MODEL> [--out PATH]

OPTIONS:
    --out PATH     Write plaintext to PATH instead of stdout

EXIT CODES:
    0  Decrypted
    2  No usable key (strict mode)
    3  Decryption or I/O error

EXAMPLES:
    ava-cred decrypt models/phi-3.enc --out /run/ava/phi-3.gguf
    ava-cred --strict --ttl 86400 decrypt models/phi-3.enc --out phi-3.gguf
"
    );
}

fn print_encrypt_help() {
    eprintln!(
        "ava-cred encrypt - Encrypt a model file

USAGE:
    ava-cred encrypt <INPUT> <OUTPUT>

DESCRIPTION:
    Encrypts INPUT with the resolved AVA_ENCRYPTION_KEY and writes the
    token to OUTPUT.
"
    );
}

fn print_inspect_help() {
    eprintln!(
        "ava-cred inspect - Show model file metadata

USAGE:
    ava-cred inspect <MODEL>

DESCRIPTION:
    Verifies the model file's signature and prints when it was encrypted.
"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("ava-cred")
            .chain(list.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_default_command_is_status() {
        let cli = parse_args(&args(&[])).unwrap();
        assert_eq!(cli.command, "status");
        assert!(cli.rest.is_empty());
    }

    #[test]
    fn test_global_options_anywhere() {
        let cli = parse_args(&args(&["decrypt", "--strict", "m.enc", "--env-file", "/etc/ava/.env", "--out", "m.bin", "--ttl", "60"])).unwrap();
        assert_eq!(cli.command, "decrypt");
        assert!(cli.strict);
        assert_eq!(cli.env_file, Some(PathBuf::from("/etc/ava/.env")));
        assert_eq!(cli.ttl, Some(Duration::from_secs(60)));
        assert_eq!(cli.positionals(&["--out"]), vec!["m.enc"]);
        assert_eq!(cli.option_value("--out"), Some("m.bin"));
    }

    #[test]
    fn test_missing_and_bad_values() {
        assert!(parse_args(&args(&["status", "--env-file"])).is_err());
        assert!(parse_args(&args(&["--ttl", "soon"])).is_err());
    }

    #[test]
    fn test_flags() {
        let cli = parse_args(&args(&["status", "--json", "--log-json"])).unwrap();
        assert!(cli.has_flag("--json"));
        assert!(cli.log_json);
        assert!(!cli.has_flag("--log-json"));
    }
}
