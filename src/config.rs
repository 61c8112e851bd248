/// Credentials configuration
///
/// Credentials come from CLI flags or environment variables, falling back to
/// a certbot-style credentials file:
/// ```ini
/// # FreeDNS account
/// dns_freedns_username = myuser
/// dns_freedns_password = mysecretpassword
/// ```
/// The short keys `username`, `password` and `server` are accepted too.
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Credentials file looked up in the working directory when none is given
const LOCAL_CREDENTIALS: &str = "freedns.ini";

// Main Config struct used throughout the codebase
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub username: Option<String>,
    pub password: Option<String>,
    pub server: Option<String>,
    pub dry_run: bool,
}

impl Config {
    /// Load a credentials file.
    ///
    /// Unknown keys are ignored so the same file can carry settings for
    /// other tools.
    pub fn from_file(path: &Path) -> Result<Self> {
        warn_unsafe_permissions(path);
        let content = fs::read_to_string(path)
            .map_err(|e| Error::config(format!("cannot read {}: {}", path.display(), e)))?;
        Ok(Self::parse(&content))
    }

    /// Parse `key = value` lines, skipping blanks and `#`/`;` comments.
    pub fn parse(content: &str) -> Self {
        let mut map: HashMap<String, String> = HashMap::new();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty()
                || line.starts_with('#')
                || line.starts_with(';')
                || line.starts_with('[')
            {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                let value = value.trim().trim_matches('"');
                map.insert(key.trim().to_ascii_lowercase(), value.to_string());
            }
        }

        let lookup = |long: &str, short: &str| {
            map.get(long)
                .or_else(|| map.get(short))
                .filter(|v| !v.is_empty())
                .cloned()
        };

        Config {
            username: lookup("dns_freedns_username", "username"),
            password: lookup("dns_freedns_password", "password"),
            server: lookup("dns_freedns_server", "server"),
            dry_run: false,
        }
    }

    /// Combine an optional file-derived Config with CLI arguments, using CLI values when provided.
    pub fn merge(file_config: Option<Self>, args: &crate::args::Args) -> Self {
        let base = file_config.unwrap_or_default();

        Config {
            username: args.username.clone().or(base.username),
            password: args.password.clone().or(base.password),
            server: args.server.clone().or(base.server),
            dry_run: args.test,
        }
    }

    /// Load the credentials file (if any) and merge it with CLI arguments.
    ///
    /// An explicitly named file must exist. Otherwise `freedns.ini` in the
    /// working directory, then `<config dir>/freedns-txt/credentials.ini`,
    /// are tried and silently skipped when absent.
    pub fn load(args: &crate::args::Args) -> Result<Self> {
        let file_config = match &args.credentials {
            Some(path) => Some(Self::from_file(Path::new(path))?),
            None => match default_credentials_path() {
                Some(path) => {
                    log::debug!("Using credentials file {}", path.display());
                    Some(Self::from_file(&path)?)
                }
                None => None,
            },
        };

        Ok(Self::merge(file_config, args))
    }

    /// Ensures both credentials are present and non-empty.
    pub fn validate(&self) -> Result<()> {
        if self.username.as_deref().unwrap_or_default().is_empty() {
            return Err(Error::config(
                "username is required (use --username, FREEDNS_USERNAME or a credentials file)",
            ));
        }
        if self.password.as_deref().unwrap_or_default().is_empty() {
            return Err(Error::config(
                "password is required (use --password, FREEDNS_PASSWORD or a credentials file)",
            ));
        }
        Ok(())
    }
}

fn default_credentials_path() -> Option<PathBuf> {
    let local = PathBuf::from(LOCAL_CREDENTIALS);
    if local.exists() {
        return Some(local);
    }
    dirs::config_dir()
        .map(|dir| dir.join("freedns-txt").join("credentials.ini"))
        .filter(|path| path.exists())
}

#[cfg(unix)]
fn warn_unsafe_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;

    if let Ok(meta) = fs::metadata(path) {
        if meta.permissions().mode() & 0o077 != 0 {
            log::warn!(
                "Unsafe permissions on credentials configuration file: {}",
                path.display()
            );
        }
    }
}

#[cfg(not(unix))]
fn warn_unsafe_permissions(_path: &Path) {}

/// Convert a duration string with a single-unit suffix into a number of seconds.
///
/// Accepts a numeric value followed by one of the units `s`, `m`, `h`, or `d`
/// (seconds, minutes, hours, days). Returns an error for empty input, an
/// invalid numeric portion, an unknown unit or a value that overflows.
pub fn parse_interval(interval: &str) -> Result<u64> {
    let interval = interval.trim();
    if interval.is_empty() {
        return Err(Error::config("Interval cannot be empty"));
    }

    let len = interval.len();
    if len < 2 || !interval.is_char_boundary(len - 1) {
        return Err(Error::config(format!("Invalid interval format: '{}'", interval)));
    }

    let (num_str, unit) = interval.split_at(len - 1);
    let num: u64 = num_str
        .parse()
        .map_err(|_| Error::config(format!("Invalid number in interval: '{}'", num_str)))?;

    let multiplier: u64 = match unit {
        "s" => 1,
        "m" => 60,
        "h" => 3600,
        "d" => 86400,
        _ => {
            return Err(Error::config(format!(
                "Invalid interval unit '{}'. Use s, m, h, or d",
                unit
            )))
        }
    };

    num.checked_mul(multiplier)
        .ok_or_else(|| Error::config(format!("Interval too large: '{}'", interval)))
}
