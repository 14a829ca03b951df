mod ui;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use lesspass::{CharacterClass, HashAlgorithm, Profile};

#[derive(Parser)]
#[command(
    name = "lesspass",
    version,
    about = "Stateless password generator compatible with LessPass"
)]
struct Cli {
    #[arg(short, long)]
    site: Option<String>,

    #[arg(short = 'u', long)]
    login: Option<String>,

    #[arg(short, long)]
    length: Option<usize>,

    #[arg(short, long)]
    counter: Option<u32>,

    #[arg(short, long)]
    iterations: Option<u32>,

    #[arg(short, long, value_enum)]
    digest: Option<Digest>,

    #[arg(long)]
    no_lowercase: bool,

    #[arg(long)]
    no_uppercase: bool,

    #[arg(long)]
    no_numbers: bool,

    #[arg(long)]
    no_symbols: bool,

    /// Load settings from a JSON profile
    #[arg(short, long, value_name = "FILE")]
    profile: Option<PathBuf>,

    /// Write the effective settings to a JSON profile
    #[arg(long, value_name = "FILE")]
    save_profile: Option<PathBuf>,

    /// Trim and NFC-normalize site and login
    #[arg(long)]
    normalize: bool,

    #[arg(short, long)]
    quiet: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "lowercase")]
enum Digest {
    Sha256,
    Sha384,
    Sha512,
}

impl From<Digest> for HashAlgorithm {
    fn from(digest: Digest) -> Self {
        match digest {
            Digest::Sha256 => HashAlgorithm::Sha256,
            Digest::Sha384 => HashAlgorithm::Sha384,
            Digest::Sha512 => HashAlgorithm::Sha512,
        }
    }
}

fn load_profile(path: &Path) -> Result<Profile> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read profile {}", path.display()))?;
    serde_json::from_str(&data).with_context(|| format!("Invalid profile {}", path.display()))
}

fn save_profile(path: &Path, profile: &Profile) -> Result<()> {
    let data = serde_json::to_string_pretty(profile).context("Failed to serialize profile")?;
    fs::write(path, data).with_context(|| format!("Failed to write profile {}", path.display()))
}

fn resolve_profile(cli: &Cli) -> Result<Profile> {
    let mut profile = match &cli.profile {
        Some(path) => load_profile(path)?,
        None => Profile::default(),
    };

    if let Some(length) = cli.length {
        profile.length = length;
    }
    if let Some(counter) = cli.counter {
        profile.counter = counter;
    }
    if let Some(iterations) = cli.iterations {
        profile.iterations = iterations;
    }
    if let Some(digest) = cli.digest {
        profile.hash_algorithm = digest.into();
    }

    let disabled = [
        (cli.no_lowercase, CharacterClass::Lowercase),
        (cli.no_uppercase, CharacterClass::Uppercase),
        (cli.no_numbers, CharacterClass::Numbers),
        (cli.no_symbols, CharacterClass::Symbols),
    ];
    for (off, class) in disabled {
        if off {
            profile.character_classes = profile.character_classes.without(class);
        }
    }

    profile.validate().context("Invalid settings")?;

    Ok(profile)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let options = ui::DisplayOptions {
        unicode_support: ui::detect_unicode_support(),
        color_support: ui::detect_color_support(),
        quiet: cli.quiet,
    };

    let profile = resolve_profile(&cli)?;

    if let Some(path) = &cli.save_profile {
        save_profile(path, &profile)?;
    }

    let site = match &cli.site {
        Some(site) => ui::prepare_identifier(site, "Site", cli.normalize)?,
        None => ui::prompt_identifier("Site", cli.normalize)?,
    };
    let login = match &cli.login {
        Some(login) => ui::prepare_identifier(login, "Login", cli.normalize)?,
        None => ui::prompt_identifier("Login", cli.normalize)?,
    };

    let master_secret = ui::prompt_master_secret()?;

    if !options.quiet {
        let fingerprint = lesspass::fingerprint(&master_secret)?;
        ui::display_fingerprint(&fingerprint, &options);
    }

    let (password, elapsed) = ui::show_progress(&options, || {
        Ok(lesspass::generate_password(
            &master_secret,
            &site,
            &login,
            &profile,
        )?)
    })?;

    ui::display_output(
        &password,
        &profile.preview(),
        profile.character_classes.alphabet().len(),
        elapsed,
        &options,
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lesspass::{CharacterSet, ConfigError};

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("lesspass").chain(args.iter().copied())).unwrap()
    }

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("lesspass-{}-{}.json", name, std::process::id()))
    }

    #[test]
    fn test_defaults() {
        let profile = resolve_profile(&parse(&[])).unwrap();
        assert_eq!(profile, Profile::default());
    }

    #[test]
    fn test_flags_override_defaults() {
        let cli = parse(&[
            "--length",
            "20",
            "--counter",
            "3",
            "--iterations",
            "5000",
            "--digest",
            "sha512",
            "--no-symbols",
            "--no-uppercase",
        ]);
        let profile = resolve_profile(&cli).unwrap();

        assert_eq!(profile.length, 20);
        assert_eq!(profile.counter, 3);
        assert_eq!(profile.iterations, 5000);
        assert_eq!(profile.hash_algorithm, HashAlgorithm::Sha512);
        assert_eq!(
            profile.character_classes,
            CharacterSet::EMPTY
                .with(CharacterClass::Lowercase)
                .with(CharacterClass::Numbers)
        );
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let cli = parse(&[
            "--no-lowercase",
            "--no-uppercase",
            "--no-numbers",
            "--no-symbols",
        ]);
        let err = resolve_profile(&cli).unwrap_err();
        let config = err.downcast_ref::<ConfigError>().unwrap();
        assert_eq!(*config, ConfigError::NoCharacterClasses);

        let cli = parse(&["--iterations", "0"]);
        assert!(resolve_profile(&cli).is_err());
    }

    #[test]
    fn test_profile_file_roundtrip_with_overrides() {
        let path = temp_path("roundtrip");
        let saved = Profile {
            length: 24,
            counter: 7,
            hash_algorithm: HashAlgorithm::Sha384,
            ..Profile::default()
        };
        save_profile(&path, &saved).unwrap();

        let path_arg = path.to_str().unwrap();
        let loaded = resolve_profile(&parse(&["--profile", path_arg])).unwrap();
        assert_eq!(loaded, saved);

        let cli = parse(&["--profile", path_arg, "--counter", "8"]);
        let overridden = resolve_profile(&cli).unwrap();
        assert_eq!(overridden.counter, 8);
        assert_eq!(overridden.length, 24);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_missing_profile_file() {
        let path = temp_path("missing");
        let cli = parse(&["--profile", path.to_str().unwrap()]);
        let err = resolve_profile(&cli).unwrap_err();
        assert!(err.to_string().contains("Failed to read profile"));
    }
}
