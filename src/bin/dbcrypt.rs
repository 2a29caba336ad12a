// src/bin/dbcrypt.rs
//! dbcrypt — check, unlock, encrypt or decrypt a SQLite database in place
//!
//! Usage: dbcrypt <status|unlock|encrypt|decrypt> <path> [--temp <path>]
//!
//! The passphrase is read from the terminal (or `DBCRYPT_PASSPHRASE` when
//! set, for scripted use). Results are printed as JSON.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use rpassword::prompt_password;
use sqlcipher_migrate::{
    check_database_status, decrypt_database, encrypt_database, unlock_encrypted_database,
    Outcome, Passphrase, UnlockOutcome,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: dbcrypt <status|unlock|encrypt|decrypt> <path> [--temp <path>]";

struct Args {
    command: String,
    path: PathBuf,
    temp: Option<PathBuf>,
}

fn parse_args() -> Result<Args> {
    let mut args = std::env::args().skip(1);
    let command = args.next().context(USAGE)?;
    let path = PathBuf::from(args.next().context(USAGE)?);

    let mut temp = None;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--temp" => temp = Some(PathBuf::from(args.next().context("--temp needs a path")?)),
            other => bail!("unexpected argument {other:?}\n{USAGE}"),
        }
    }

    Ok(Args {
        command,
        path,
        temp,
    })
}

fn read_passphrase(confirm: bool) -> Result<Passphrase> {
    if let Ok(value) = std::env::var("DBCRYPT_PASSPHRASE") {
        return Ok(Passphrase::new(value));
    }

    let first = prompt_password("Passphrase: ").context("failed to read passphrase")?;
    if confirm {
        let second = prompt_password("Confirm passphrase: ").context("failed to read passphrase")?;
        if first != second {
            bail!("passphrases do not match");
        }
    }
    Ok(Passphrase::new(first))
}

fn print_outcome(outcome: &Outcome) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(outcome)?);
    if !outcome.is_ok() {
        std::process::exit(1);
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args()?;
    let temp = args.temp.as_deref();

    match args.command.as_str() {
        "status" => {
            let report = check_database_status(&args.path);
            println!("{}", serde_json::to_string(&report)?);
        }
        "unlock" => {
            let passphrase = read_passphrase(false)?;
            match unlock_encrypted_database(&args.path, &passphrase) {
                UnlockOutcome::Ok { connection } => {
                    connection.close().map_err(|(_, err)| err)?;
                    println!("{}", serde_json::json!({ "status": "ok" }));
                }
                UnlockOutcome::Error { kind, message } => {
                    println!(
                        "{}",
                        serde_json::json!({ "status": "error", "kind": kind, "message": message })
                    );
                    std::process::exit(1);
                }
            }
        }
        "encrypt" => {
            let passphrase = read_passphrase(true)?;
            info!(path = %args.path.display(), "encrypting");
            print_outcome(&encrypt_database(&args.path, &passphrase, temp))?;
        }
        "decrypt" => {
            let passphrase = read_passphrase(false)?;
            info!(path = %args.path.display(), "decrypting");
            print_outcome(&decrypt_database(&args.path, &passphrase, temp))?;
        }
        other => bail!("unknown command {other:?}\n{USAGE}"),
    }

    Ok(())
}
