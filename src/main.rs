mod ui;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use passmaker::store::{ProfileStore, recipe_from_profile, recipe_to_profile};
use passmaker::{Algorithm, CharsetPolicy, LeetTiming, Recipe, derive_password};

#[derive(Parser)]
#[command(
    name = "passmaker",
    version,
    author,
    about = "Deterministic per-site password derivation"
)]
struct Cli {
    /// Site URL folded into the derivation data
    #[arg(short, long)]
    url: Option<String>,

    /// Username folded into the derivation data
    #[arg(short = 'n', long)]
    username: Option<String>,

    /// Counter appended to the derivation data, for rotating a site's
    /// password without changing the master secret
    #[arg(short, long)]
    counter: Option<String>,

    #[arg(short, long, value_enum)]
    algorithm: Option<HashAlgorithm>,

    /// Password length in characters
    #[arg(short, long)]
    length: Option<usize>,

    /// Output alphabet (at least 2 distinct characters)
    #[arg(long)]
    charset: Option<String>,

    #[arg(long, value_enum)]
    charset_policy: Option<Policy>,

    /// Fixed text at the start of the password
    #[arg(long)]
    prefix: Option<String>,

    /// Fixed text at the end of the password, kept through truncation
    #[arg(long)]
    suffix: Option<String>,

    /// When to apply leetspeak relative to hashing
    #[arg(long = "leet", value_enum)]
    leet_timing: Option<Leet>,

    /// Leet substitution level, -1 (off) through 8
    #[arg(long, value_parser = clap::value_parser!(i8).range(-1..=8))]
    leet_level: Option<i8>,

    /// Load settings from a saved profile before applying other flags
    #[arg(short, long, value_name = "NAME")]
    profile: Option<String>,

    /// Save the effective settings under this profile name
    #[arg(long, value_name = "NAME")]
    save_profile: Option<String>,

    /// Delete a saved profile and exit
    #[arg(long, value_name = "NAME", conflicts_with_all = ["profile", "save_profile"])]
    delete_profile: Option<String>,

    /// List saved profiles and exit
    #[arg(long)]
    list_profiles: bool,

    /// Profile file location
    #[arg(long, value_name = "PATH")]
    profile_file: Option<PathBuf>,

    /// Print only the password
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "kebab-case")]
enum HashAlgorithm {
    Sha256,
    HmacSha256,
    HmacSha256Legacy,
    Sha1,
    HmacSha1,
    Md4,
    HmacMd4,
    Md5,
    Md5Legacy,
    HmacMd5,
    HmacMd5Legacy,
    Rmd160,
    HmacRmd160,
}

impl From<HashAlgorithm> for Algorithm {
    fn from(algorithm: HashAlgorithm) -> Self {
        match algorithm {
            HashAlgorithm::Sha256 => Algorithm::Sha256,
            HashAlgorithm::HmacSha256 => Algorithm::HmacSha256,
            HashAlgorithm::HmacSha256Legacy => Algorithm::HmacSha256Legacy,
            HashAlgorithm::Sha1 => Algorithm::Sha1,
            HashAlgorithm::HmacSha1 => Algorithm::HmacSha1,
            HashAlgorithm::Md4 => Algorithm::Md4,
            HashAlgorithm::HmacMd4 => Algorithm::HmacMd4,
            HashAlgorithm::Md5 => Algorithm::Md5,
            HashAlgorithm::Md5Legacy => Algorithm::Md5Legacy,
            HashAlgorithm::HmacMd5 => Algorithm::HmacMd5,
            HashAlgorithm::HmacMd5Legacy => Algorithm::HmacMd5Legacy,
            HashAlgorithm::Rmd160 => Algorithm::Rmd160,
            HashAlgorithm::HmacRmd160 => Algorithm::HmacRmd160,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "kebab-case")]
enum Leet {
    None,
    BeforeHashing,
    AfterHashing,
    Both,
}

impl From<Leet> for LeetTiming {
    fn from(timing: Leet) -> Self {
        match timing {
            Leet::None => LeetTiming::None,
            Leet::BeforeHashing => LeetTiming::BeforeHashing,
            Leet::AfterHashing => LeetTiming::AfterHashing,
            Leet::Both => LeetTiming::Both,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "lowercase")]
enum Policy {
    Strict,
    Lenient,
}

impl From<Policy> for CharsetPolicy {
    fn from(policy: Policy) -> Self {
        match policy {
            Policy::Strict => CharsetPolicy::Strict,
            Policy::Lenient => CharsetPolicy::Lenient,
        }
    }
}

fn build_recipe(cli: &Cli, store: &ProfileStore) -> Result<Recipe> {
    let mut recipe = match &cli.profile {
        Some(name) => {
            let profile = store
                .load(name)?
                .with_context(|| format!("No profile named {:?}", name))?;
            recipe_from_profile(&profile)
                .with_context(|| format!("Profile {:?} is malformed", name))?
        }
        None => Recipe::default(),
    };

    if let Some(url) = &cli.url {
        recipe.url = url.clone();
    }
    if let Some(username) = &cli.username {
        recipe.username = username.clone();
    }
    if let Some(counter) = &cli.counter {
        recipe.counter = counter.clone();
    }
    if let Some(algorithm) = cli.algorithm {
        recipe.algorithm = algorithm.into();
    }
    if let Some(length) = cli.length {
        recipe.length = length;
    }
    if let Some(charset) = &cli.charset {
        recipe.charset = charset.clone();
    }
    if let Some(policy) = cli.charset_policy {
        recipe.charset_policy = policy.into();
    }
    if let Some(prefix) = &cli.prefix {
        recipe.prefix = prefix.clone();
    }
    if let Some(suffix) = &cli.suffix {
        recipe.suffix = suffix.clone();
    }
    if let Some(timing) = cli.leet_timing {
        recipe.leet_timing = timing.into();
    }
    if let Some(level) = cli.leet_level {
        recipe.leet_level = level;
    }

    Ok(recipe)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let store = ProfileStore::new(
        cli.profile_file
            .clone()
            .unwrap_or_else(ProfileStore::default_path),
    );

    if let Some(name) = &cli.delete_profile {
        store.delete(name)?;
        if !cli.quiet {
            println!("Deleted profile {:?}", name);
        }
        return Ok(());
    }

    if cli.list_profiles {
        for name in store.list()? {
            println!("{}", name);
        }
        return Ok(());
    }

    let recipe = build_recipe(&cli, &store)?;

    if let Some(name) = &cli.save_profile {
        store.save(name, &recipe_to_profile(&recipe), None)?;
        if !cli.quiet {
            println!("Saved profile {:?}", name);
        }
    }

    let options = ui::DisplayOptions {
        unicode_support: ui::detect_unicode_support(),
        color_support: ui::detect_color_support(),
        quiet: cli.quiet,
    };

    let master_secret = ui::prompt_master_secret()?;
    let password = derive_password(&master_secret, &recipe)?;

    ui::display_output(&password, &recipe, &options);

    Ok(())
}
