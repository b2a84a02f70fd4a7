//! ava-cred entry point.
//!
//! Resolves credentials the same way the application does and exposes
//! licence checks and model file encryption for operators.

mod cli_parser;

use std::io::Write;
use std::path::Path;
use std::process::ExitCode;

use ava_credentials::security::fernet::issued_at;
use ava_credentials::telemetry;
use ava_credentials::{
    device_id, encrypt_model, validate_license, CredentialConfig, Credentials, FernetKey, ModelError,
};

use cli_parser::CliArgs;

const EXIT_USAGE: u8 = 2;
const EXIT_CRYPTO: u8 = 3;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    let cli = match cli_parser::parse_args(&args) {
        Ok(cli) => cli,
        Err(msg) => {
            eprintln!("{}", msg);
            cli_parser::print_usage();
            return ExitCode::from(EXIT_USAGE);
        }
    };
    telemetry::init_logging(cli.log_json);

    let mut config = CredentialConfig::default()
        .with_strict_keys(cli.strict)
        .with_token_ttl(cli.ttl);
    if let Some(path) = &cli.env_file {
        config = config.with_dotenv_path(path);
    }
    let credentials = Credentials::new(config);

    match cli.command.as_str() {
        "status" => run_status(&credentials, &cli),
        "device-id" => {
            println!("{}", device_id());
            ExitCode::SUCCESS
        }
        "validate" => run_validate(&credentials, &cli),
        "keygen" => {
            println!("{}", FernetKey::generate().to_encoded().as_str());
            ExitCode::SUCCESS
        }
        "decrypt" => run_decrypt(&credentials, &cli),
        "encrypt" => run_encrypt(&credentials, &cli),
        "inspect" => run_inspect(&credentials, &cli),
        "help" | "--help" | "-h" => {
            if let Some(sub) = cli.rest.first() {
                cli_parser::print_command_help(sub);
            } else {
                cli_parser::print_usage();
            }
            ExitCode::SUCCESS
        }
        "version" | "--version" | "-V" => {
            println!("ava-cred {}", env!("CARGO_PKG_VERSION"));
            ExitCode::SUCCESS
        }
        other => {
            eprintln!("Unknown command: {}", other);
            cli_parser::print_usage();
            ExitCode::from(EXIT_USAGE)
        }
    }
}

fn run_status(credentials: &Credentials, cli: &CliArgs) -> ExitCode {
    let status = credentials.status();
    if cli.has_flag("--json") {
        match serde_json::to_string_pretty(&status) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::FAILURE;
            }
        }
    } else {
        println!("Secrets file:    {}", status.dotenv_path);
        match status.license_source {
            Some(source) => println!(
                "Licence key:     {} ({})",
                source,
                if status.license_valid { "valid" } else { "invalid" }
            ),
            None => println!("Licence key:     not configured"),
        }
        println!("Encryption key:  {}", status.encryption_key_source);
        println!("Strict keys:     {}", status.strict_keys);
        println!("Device ID:       {}", status.device_id);
    }
    ExitCode::SUCCESS
}

fn run_validate(credentials: &Credentials, cli: &CliArgs) -> ExitCode {
    let key = match cli.rest.first() {
        Some(key) => key.clone(),
        None => match credentials.license_key() {
            Some(key) => key,
            None => {
                eprintln!("No licence key given and AVA_LICENSE_KEY is not configured");
                return ExitCode::FAILURE;
            }
        },
    };
    if validate_license(&key) {
        println!("Licence valid");
        ExitCode::SUCCESS
    } else {
        println!("Licence invalid for this device");
        ExitCode::FAILURE
    }
}

fn run_decrypt(credentials: &Credentials, cli: &CliArgs) -> ExitCode {
    let Some(model) = cli.positionals(&["--out"]).first().copied() else {
        cli_parser::print_command_help("decrypt");
        return ExitCode::from(EXIT_USAGE);
    };

    let plaintext = match credentials.decrypt_model(model) {
        Ok(plaintext) => plaintext,
        Err(e) => return report_model_error(&e),
    };

    let written = match cli.option_value("--out") {
        Some(out) => std::fs::write(out, &plaintext),
        None => std::io::stdout().lock().write_all(&plaintext),
    };
    match written {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: failed to write plaintext: {}", e);
            ExitCode::from(EXIT_CRYPTO)
        }
    }
}

fn run_encrypt(credentials: &Credentials, cli: &CliArgs) -> ExitCode {
    let positionals = cli.positionals(&[]);
    let (Some(input), Some(output)) = (positionals.first(), positionals.get(1)) else {
        cli_parser::print_command_help("encrypt");
        return ExitCode::from(EXIT_USAGE);
    };

    let key = match credentials.checked_encryption_key() {
        Ok(key) => key,
        Err(e) => return report_model_error(&e.into()),
    };
    match encrypt_model(Path::new(input), Path::new(output), key.as_bytes()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => report_model_error(&e),
    }
}

fn run_inspect(credentials: &Credentials, cli: &CliArgs) -> ExitCode {
    let Some(model) = cli.positionals(&[]).first().copied() else {
        cli_parser::print_command_help("inspect");
        return ExitCode::from(EXIT_USAGE);
    };

    let key = match credentials.checked_encryption_key() {
        Ok(key) => key,
        Err(e) => return report_model_error(&e.into()),
    };
    let token = match std::fs::read(model) {
        Ok(token) => token,
        Err(source) => {
            let path = Path::new(model).to_path_buf();
            return report_model_error(&ModelError::Io { path, source });
        }
    };
    let timestamp = FernetKey::from_encoded(key.as_bytes()).and_then(|k| k.extract_timestamp(&token));
    match timestamp {
        Ok(ts) => {
            let when = issued_at(ts).map(|d| d.to_rfc3339()).unwrap_or_else(|| ts.to_string());
            println!("Model file:  {}", model);
            println!("Token size:  {} bytes", token.len());
            println!("Encrypted:   {}", when);
            ExitCode::SUCCESS
        }
        Err(e) => report_model_error(&e.into()),
    }
}

fn report_model_error(err: &ModelError) -> ExitCode {
    eprintln!("Error: {}", err);
    match err {
        ModelError::KeyUnavailable(_) => ExitCode::from(EXIT_USAGE),
        ModelError::Io { .. } | ModelError::Decryption(_) => ExitCode::from(EXIT_CRYPTO),
    }
}
