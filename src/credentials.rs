//! API credential resolution.
//!
//! Lookup order: process environment (already captured in [`Config`]),
//! then the `.env` file, then an interactive prompt whose answers are
//! written back to the file for the next run. Empty credentials never
//! leave this module.

use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

use crate::config::Config;
use crate::console::Console;
use crate::error::{OrderError, Result};
use crate::logging::{self, obj, v_str, Domain, Level};

pub const API_KEY_VAR: &str = "API_KEY";
pub const API_SECRET_VAR: &str = "API_SECRET";

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub api_key: String,
    pub api_secret: String,
}

impl Credentials {
    pub fn new(api_key: &str, api_secret: &str) -> Result<Self> {
        let (api_key, api_secret) = (api_key.trim(), api_secret.trim());
        if api_key.is_empty() || api_secret.is_empty() {
            return Err(OrderError::Authentication("API credentials are required".to_string()));
        }
        Ok(Self { api_key: api_key.to_string(), api_secret: api_secret.to_string() })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"[REDACTED]")
            .field("api_secret", &"[REDACTED]")
            .finish()
    }
}

/// Read API_KEY / API_SECRET from a `.env`-style file. Missing file,
/// unparseable lines and empty values all count as absent.
pub fn load_env_file(path: &Path) -> Option<Credentials> {
    let iter = dotenvy::from_path_iter(path).ok()?;
    let (mut key, mut secret) = (None, None);
    for (name, value) in iter.flatten() {
        match name.as_str() {
            API_KEY_VAR => key = Some(value),
            API_SECRET_VAR => secret = Some(value),
            _ => {}
        }
    }
    Credentials::new(&key?, &secret?).ok()
}

/// Write the credentials into `path`, keeping any unrelated entries.
/// An existing file that cannot be read is left untouched.
pub fn save_env_file(path: &Path, creds: &Credentials) -> io::Result<()> {
    let existing = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e),
    };
    let mut out: String = existing
        .lines()
        .filter(|line| {
            let name = line.split('=').next().unwrap_or("").trim();
            let name = name.strip_prefix("export ").unwrap_or(name).trim();
            name != API_KEY_VAR && name != API_SECRET_VAR
        })
        .map(|line| format!("{}\n", line))
        .collect();
    out.push_str(&format!("{}={}\n{}={}\n", API_KEY_VAR, creds.api_key, API_SECRET_VAR, creds.api_secret));

    let mut file = owner_only_writer(path)?;
    file.write_all(out.as_bytes())?;
    file.sync_all()
}

/// Open `path` for rewriting with 0600 permissions in place before any
/// secret is written.
#[cfg(unix)]
fn owner_only_writer(path: &Path) -> io::Result<fs::File> {
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
    let file = fs::OpenOptions::new().write(true).create(true).truncate(false).mode(0o600).open(path)?;
    // mode() only applies on creation
    file.set_permissions(fs::Permissions::from_mode(0o600))?;
    file.set_len(0)?;
    Ok(file)
}

#[cfg(not(unix))]
fn owner_only_writer(path: &Path) -> io::Result<fs::File> {
    fs::OpenOptions::new().write(true).create(true).truncate(true).open(path)
}

fn ask(console: &mut dyn Console, question: &str) -> Result<String> {
    console
        .prompt(question)
        .map_err(|e| OrderError::Authentication(format!("could not read credentials: {}", e)))
}

fn prompt_and_persist(path: &Path, console: &mut dyn Console) -> Result<Credentials> {
    logging::info(Domain::Config, "credentials_missing", "API credentials not found, please enter them");
    let key = ask(console, "Enter your Binance API Key: ")?;
    let secret = ask(console, "Enter your Binance API Secret: ")?;
    let creds = Credentials::new(&key, &secret)?;

    match save_env_file(path, &creds) {
        Ok(()) => log_saved(path),
        Err(e) => logging::log(
            Level::Error,
            Domain::Config,
            "credentials_save_failed",
            obj(&[("path", v_str(&path.display().to_string())), ("msg", v_str(&e.to_string()))]),
        ),
    }
    Ok(creds)
}

fn log_saved(path: &Path) {
    logging::log(
        Level::Info,
        Domain::Config,
        "credentials_saved",
        obj(&[("path", v_str(&path.display().to_string()))]),
    );
}

/// Resolve credentials from the `.env` file at `path`, prompting when absent.
pub fn resolve_file(path: &Path, console: &mut dyn Console) -> Result<Credentials> {
    match load_env_file(path) {
        Some(creds) => {
            logging::log(
                Level::Debug,
                Domain::Config,
                "credentials_loaded",
                obj(&[("source", v_str("env_file")), ("path", v_str(&path.display().to_string()))]),
            );
            Ok(creds)
        }
        None => prompt_and_persist(path, console),
    }
}

pub fn resolve(cfg: &Config, console: &mut dyn Console) -> Result<Credentials> {
    if let Some(creds) = &cfg.env_credentials {
        logging::log(Level::Debug, Domain::Config, "credentials_loaded", obj(&[("source", v_str("environment"))]));
        return Ok(creds.clone());
    }
    resolve_file(&cfg.env_path, console)
}
