//! Minimal CLI over the password utilities. Commands stay small and auditable
//! so operators can see exactly how passwords are handled.

use std::env;
use std::process::ExitCode;

use pwguard::config::{load_config, HashingConfig};
use pwguard::{generate_salt, PasswordHash, Passwords};
use tracing_subscriber::EnvFilter;
use zeroize::Zeroize;

fn print_usage() -> ExitCode {
    eprintln!("Usage: pwguard [--config <path>] <command>\n\nCommands:\n  generate-salt\n  hash-password <plaintext>\n  verify-password <plaintext> <hash>\n  needs-rehash <hash>");
    ExitCode::FAILURE
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut args: Vec<String> = env::args().skip(1).collect();

    let config = if args.first().map(String::as_str) == Some("--config") {
        if args.len() < 2 {
            return print_usage();
        }
        let path = args[1].clone();
        args.drain(..2);
        load_config(&path)
    } else {
        HashingConfig::from_env()
    };
    let config = match config {
        Ok(cfg) => cfg,
        Err(err) => {
            eprintln!("config load failed: {err}");
            return ExitCode::FAILURE;
        }
    };
    let passwords = Passwords::from_config(&config);
    tracing::debug!(scheme = passwords.scheme_name(), cost = passwords.cost(), "configuration loaded");

    let Some(command) = args.first().cloned() else {
        return print_usage();
    };

    match command.as_str() {
        "generate-salt" => {
            if args.len() != 1 {
                return print_usage();
            }
            match generate_salt() {
                Ok(salt) => println!("{}", hex::encode(salt)),
                Err(err) => {
                    eprintln!("salt generation failed: {err}");
                    return ExitCode::FAILURE;
                }
            }
        }
        "hash-password" => {
            if args.len() != 2 {
                return print_usage();
            }
            let mut plaintext = std::mem::take(&mut args[1]);
            let result = passwords.hash_password_str(&plaintext);
            plaintext.zeroize();
            match result {
                Ok(hash) => println!("{hash}"),
                Err(err) => {
                    eprintln!("hashing failed: {err}");
                    return ExitCode::FAILURE;
                }
            }
        }
        "verify-password" => {
            if args.len() != 3 {
                return print_usage();
            }
            let mut plaintext = std::mem::take(&mut args[1]);
            let hash = PasswordHash::from(args[2].as_str());
            let matches = passwords.verify_password_str(&hash, &plaintext);
            plaintext.zeroize();
            println!("{}", if matches { "match" } else { "no-match" });
            if !matches {
                return ExitCode::FAILURE;
            }
        }
        "needs-rehash" => {
            if args.len() != 2 {
                return print_usage();
            }
            let hash = PasswordHash::from(args[1].as_str());
            println!("{}", if passwords.needs_rehash(&hash) { "rehash" } else { "current" });
        }
        _ => return print_usage(),
    }

    ExitCode::SUCCESS
}
