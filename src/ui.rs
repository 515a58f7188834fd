use anyhow::{Context, Result};
use console::Style;
use passmaker::Recipe;
use rpassword::read_password;
use std::io::{self, Write};
use zeroize::Zeroizing;

pub const MIN_SAFE_ENTROPY: f64 = 64.0;
pub const PARANOID_ENTROPY: f64 = 128.0;

pub const MIN_SAFE_PASSWORD_LENGTH: usize = 12;

pub struct DisplayOptions {
    pub unicode_support: bool,
    pub color_support: bool,
    pub quiet: bool,
}

pub fn detect_unicode_support() -> bool {
    supports_unicode::on(supports_unicode::Stream::Stdout)
}

pub fn detect_color_support() -> bool {
    supports_color::on(supports_color::Stream::Stdout).is_some()
}

pub fn get_status_symbols(unicode_support: bool) -> (&'static str, &'static str) {
    if unicode_support { ("✓", "!") } else { ("+", "!") }
}

/// Prompt for the master secret without echo. The secret is hashed exactly
/// as typed; trimming or normalizing it would silently derive a different
/// password than other clients.
pub fn prompt_master_secret() -> Result<Zeroizing<String>> {
    print!("Master secret: ");
    io::stdout().flush()?;

    let password = Zeroizing::new(read_password().context("Failed to fetch master secret")?);

    if password.is_empty() {
        anyhow::bail!("Master secret cannot be empty");
    }

    Ok(password)
}

/// Effective entropy of the derived portion: prefix and suffix characters
/// are fixed text and contribute nothing.
pub fn entropy_bits(recipe: &Recipe) -> f64 {
    let affix = recipe.prefix.chars().count() + recipe.suffix.chars().count();
    let derived = recipe.length.saturating_sub(affix);
    derived as f64 * (recipe.distinct_symbols() as f64).log2()
}

pub fn display_output(password: &Zeroizing<String>, recipe: &Recipe, options: &DisplayOptions) {
    if options.quiet {
        println!("{}", &**password);
        return;
    }

    println!("{}\n", &**password);

    display_settings(recipe, options);
    display_stats(recipe, options);
}

fn display_settings(recipe: &Recipe, options: &DisplayOptions) {
    let style = if options.color_support {
        Style::new().cyan()
    } else {
        Style::new()
    };

    println!("Settings:");
    println!("  ├─ Algorithm  {}", style.apply_to(recipe.algorithm));
    println!(
        "  ├─ URL        {}",
        if recipe.url.is_empty() { "(none)" } else { &recipe.url }
    );
    if !recipe.username.is_empty() {
        println!("  ├─ Username   {}", recipe.username);
    }
    if !recipe.counter.is_empty() {
        println!("  ├─ Counter    {}", recipe.counter);
    }
    println!(
        "  ├─ Leet       {} (level {})",
        recipe.leet_timing, recipe.leet_level
    );
    if !recipe.prefix.is_empty() {
        println!("  ├─ Prefix     {:?}", recipe.prefix);
    }
    if !recipe.suffix.is_empty() {
        println!("  ├─ Suffix     {:?}", recipe.suffix);
    }
    println!(
        "  └─ Output     {} {}",
        recipe.length,
        if recipe.length == 1 { "char" } else { "chars" }
    );

    println!();
}

fn display_stats(recipe: &Recipe, options: &DisplayOptions) {
    let (check_ok, check_warn) = get_status_symbols(options.unicode_support);

    let entropy = entropy_bits(recipe);

    let (status_icon, entropy_style, status_text) = if entropy >= PARANOID_ENTROPY {
        (
            check_ok,
            if options.color_support {
                Style::new().green()
            } else {
                Style::new()
            },
            "Paranoid",
        )
    } else if entropy >= MIN_SAFE_ENTROPY {
        (
            check_ok,
            if options.color_support {
                Style::new().green()
            } else {
                Style::new()
            },
            "Strong",
        )
    } else {
        (
            check_warn,
            if options.color_support {
                Style::new().yellow()
            } else {
                Style::new()
            },
            "Weak",
        )
    };

    let length_secure = recipe.length >= MIN_SAFE_PASSWORD_LENGTH;

    let length_style = if options.color_support {
        if length_secure {
            Style::new().green()
        } else {
            Style::new().yellow()
        }
    } else {
        Style::new()
    };

    let length_status = if length_secure { check_ok } else { check_warn };

    println!("Stats:");

    println!(
        "  ├─ Entropy    {} {} bits ({})",
        entropy_style.apply_to(format!("[{}]", status_icon)),
        entropy_style.apply_to(format!("{:.1}", entropy)),
        entropy_style.apply_to(status_text)
    );

    println!(
        "  ├─ Length     {} {} {}",
        length_style.apply_to(format!("[{}]", length_status)),
        length_style.apply_to(recipe.length),
        if recipe.length == 1 { "char" } else { "chars" }
    );

    println!("  └─ Charset    {} distinct chars", recipe.distinct_symbols());

    println!(
        "\n{} Security: {}",
        entropy_style.apply_to(format!("[{}]", status_icon)),
        entropy_style.apply_to(status_text)
    );
}
