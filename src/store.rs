//! File-backed profile store: named derivation settings, one tab-separated
//! record per line. Profiles hold recipes only, never the master secret or
//! a derived password.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use std::{env, fs};

use anyhow::{Context, Result, bail};

use crate::engine::{CharsetPolicy, Recipe};
use crate::hash::Algorithm;
use crate::leet::LeetTiming;

const FILE_NAME: &str = ".passmaker_profiles";

/// A key-value store with optional per-entry expiry. Entries past their
/// expiry read as absent and are pruned on the next write.
pub struct ProfileStore {
    path: PathBuf,
}

struct Entry {
    name: String,
    expiry: Option<u64>,
    value: String,
}

impl ProfileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        ProfileStore { path: path.into() }
    }

    /// `$HOME/.passmaker_profiles`, or the current directory when HOME is
    /// not set.
    pub fn default_path() -> PathBuf {
        env::var_os("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
            .join(FILE_NAME)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&self, name: &str, value: &str, expiry: Option<SystemTime>) -> Result<()> {
        let expiry = match expiry {
            Some(at) => Some(
                at.duration_since(UNIX_EPOCH)
                    .context("Expiry predates the Unix epoch")?
                    .as_secs(),
            ),
            None => None,
        };
        let mut entries = self.read_entries()?;
        entries.retain(|entry| entry.name != name && !expired(entry));
        entries.push(Entry {
            name: name.to_string(),
            expiry,
            value: value.to_string(),
        });
        self.write_entries(&entries)
    }

    pub fn load(&self, name: &str) -> Result<Option<String>> {
        let entries = self.read_entries()?;
        Ok(entries
            .into_iter()
            .find(|entry| entry.name == name && !expired(entry))
            .map(|entry| entry.value))
    }

    pub fn delete(&self, name: &str) -> Result<()> {
        let mut entries = self.read_entries()?;
        entries.retain(|entry| entry.name != name && !expired(entry));
        self.write_entries(&entries)
    }

    /// Names of all live entries, in file order.
    pub fn list(&self) -> Result<Vec<String>> {
        let entries = self.read_entries()?;
        Ok(entries
            .into_iter()
            .filter(|entry| !expired(entry))
            .map(|entry| entry.name)
            .collect())
    }

    fn read_entries(&self) -> Result<Vec<Entry>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("Failed to read {}", self.path.display()));
            }
        };

        let mut entries = Vec::new();
        for line in contents.lines().filter(|line| !line.trim().is_empty()) {
            let mut fields = line.splitn(3, '\t');
            let (Some(name), Some(expiry), Some(value)) =
                (fields.next(), fields.next(), fields.next())
            else {
                bail!("Malformed profile record: {:?}", line);
            };
            let expiry = match expiry {
                "-" => None,
                secs => Some(
                    secs.parse::<u64>()
                        .with_context(|| format!("Bad expiry in record {:?}", line))?,
                ),
            };
            entries.push(Entry {
                name: unescape(name)?,
                expiry,
                value: unescape(value)?,
            });
        }
        Ok(entries)
    }

    fn write_entries(&self, entries: &[Entry]) -> Result<()> {
        let mut out = String::new();
        for entry in entries {
            out.push_str(&escape(&entry.name));
            out.push('\t');
            match entry.expiry {
                Some(secs) => out.push_str(&secs.to_string()),
                None => out.push('-'),
            }
            out.push('\t');
            out.push_str(&escape(&entry.value));
            out.push('\n');
        }
        fs::write(&self.path, out)
            .with_context(|| format!("Failed to write {}", self.path.display()))
    }
}

fn expired(entry: &Entry) -> bool {
    match entry.expiry {
        Some(at) => now_secs() >= at,
        None => false,
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn escape(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    for ch in field.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out
}

fn unescape(field: &str) -> Result<String> {
    let mut out = String::with_capacity(field.len());
    let mut chars = field.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            other => bail!("Bad escape {:?} in profile field", other),
        }
    }
    Ok(out)
}

/// Render a recipe as the profile value stored under its name.
pub fn recipe_to_profile(recipe: &Recipe) -> String {
    let fields = [
        ("url", recipe.url.clone()),
        ("username", recipe.username.clone()),
        ("counter", recipe.counter.clone()),
        ("algorithm", recipe.algorithm.to_string()),
        ("leet-timing", recipe.leet_timing.to_string()),
        ("leet-level", recipe.leet_level.to_string()),
        ("length", recipe.length.to_string()),
        ("prefix", recipe.prefix.clone()),
        ("suffix", recipe.suffix.clone()),
        ("charset", recipe.charset.clone()),
        (
            "charset-policy",
            match recipe.charset_policy {
                CharsetPolicy::Strict => "strict".to_string(),
                CharsetPolicy::Lenient => "lenient".to_string(),
            },
        ),
    ];
    fields
        .iter()
        .map(|(key, value)| format!("{}={}", key, escape(value)))
        .collect::<Vec<_>>()
        .join("\t")
}

/// Parse a profile value back into a recipe. Unknown keys are rejected so
/// a profile written by a newer version fails loudly instead of deriving a
/// different password.
pub fn recipe_from_profile(profile: &str) -> Result<Recipe> {
    let mut recipe = Recipe::default();
    for field in profile.split('\t').filter(|field| !field.is_empty()) {
        let Some((key, raw)) = field.split_once('=') else {
            bail!("Malformed profile field {:?}", field);
        };
        let value = unescape(raw)?;
        match key {
            "url" => recipe.url = value,
            "username" => recipe.username = value,
            "counter" => recipe.counter = value,
            "algorithm" => recipe.algorithm = value.parse::<Algorithm>()?,
            "leet-timing" => recipe.leet_timing = value.parse::<LeetTiming>()?,
            "leet-level" => {
                recipe.leet_level = value
                    .parse::<i8>()
                    .with_context(|| format!("Bad leet level {:?}", value))?;
            }
            "length" => {
                recipe.length = value
                    .parse::<usize>()
                    .with_context(|| format!("Bad length {:?}", value))?;
            }
            "prefix" => recipe.prefix = value,
            "suffix" => recipe.suffix = value,
            "charset" => recipe.charset = value,
            "charset-policy" => {
                recipe.charset_policy = match value.as_str() {
                    "strict" => CharsetPolicy::Strict,
                    "lenient" => CharsetPolicy::Lenient,
                    other => bail!("Unknown charset policy {:?}", other),
                };
            }
            other => bail!("Unknown profile key {:?}", other),
        }
    }
    Ok(recipe)
}
