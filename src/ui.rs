use anyhow::{Context, Result};
use console::{Style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use lesspass::{Fingerprint, ProfilePreview};
use rpassword::read_password;
use std::io::{self, BufRead, Write};
use std::time::{Duration, Instant};
use unicode_normalization::UnicodeNormalization;
use zeroize::Zeroizing;

pub const MAX_IDENTIFIER_BYTES: usize = 4096;
pub const MAX_MASTER_BYTES: usize = 1024 * 1024;

// xterm-256 approximations of the LessPass fingerprint palette.
const FINGERPRINT_COLORS: [u8; 14] = [
    16, 23, 30, 205, 218, 54, 26, 141, 75, 153, 88, 94, 166, 46,
];

const FINGERPRINT_ICONS: &str = "♠♣♥♦★☀☂☃☎✈⚓⚑♫☘⚙✿☕⌛⚡✂✉☯♞☢";
const FINGERPRINT_ASCII: &str = "#@%&*+=?$~^<>!/|\\{}[]():";

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

pub fn get_status_symbol(unicode_support: bool) -> &'static str {
    if unicode_support { "✓" } else { "+" }
}

fn control_character_positions(s: &str) -> Vec<usize> {
    s.chars()
        .enumerate()
        .filter(|(_, c)| c.is_control())
        .map(|(pos, _)| pos)
        .collect()
}

fn confirm_control_characters(s: &str, input_name: &str) -> Result<()> {
    let positions = control_character_positions(s);

    if positions.is_empty() {
        return Ok(());
    }

    let term = Term::stderr();

    let warning_msg = format!(
        "WARNING: {} contains {} control character(s) at position(s): {}",
        input_name,
        positions.len(),
        positions
            .iter()
            .map(|pos| pos.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );

    term.write_line(&warning_msg)?;
    term.write_str("Continue anyway? [y/N]: ")?;
    term.flush()?;

    let mut response = String::new();
    io::stdin().read_line(&mut response)?;
    let response = response.trim().to_lowercase();

    term.clear_last_lines(2)?;

    if response != "y" && response != "yes" {
        anyhow::bail!("Aborted");
    }

    Ok(())
}

fn normalize_identifier(s: &str) -> String {
    s.trim().nfc().collect()
}

/// Checks a site or login taken from the command line or a prompt. With
/// `normalize`, surrounding whitespace is trimmed and the text is NFC-composed.
pub fn prepare_identifier(raw: &str, input_name: &str, normalize: bool) -> Result<String> {
    let value = if normalize {
        normalize_identifier(raw)
    } else {
        raw.to_string()
    };

    if value.is_empty() {
        anyhow::bail!("{} cannot be empty", input_name);
    }

    if value.len() > MAX_IDENTIFIER_BYTES {
        anyhow::bail!(
            "{} too long ({} bytes, maximum is {})",
            input_name,
            value.len(),
            MAX_IDENTIFIER_BYTES
        );
    }

    confirm_control_characters(&value, input_name)?;

    Ok(value)
}

fn strip_line_ending(line: &mut Vec<u8>) {
    if line.last() == Some(&b'\n') {
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
    }
}

pub fn prompt_identifier(input_name: &str, normalize: bool) -> Result<String> {
    print!("{}: ", input_name);
    io::stdout().flush()?;

    let mut line = Vec::new();
    io::stdin()
        .lock()
        .read_until(b'\n', &mut line)
        .with_context(|| format!("Failed to read {}", input_name.to_lowercase()))?;
    strip_line_ending(&mut line);

    let text = lesspass::decode_utf8(&line).with_context(|| format!("Invalid {}", input_name))?;

    prepare_identifier(text, input_name, normalize)
}

pub fn prompt_master_secret() -> Result<Zeroizing<String>> {
    print!("Master password: ");
    io::stdout().flush()?;

    let secret = Zeroizing::new(read_password().context("Failed to fetch master password")?);

    if secret.is_empty() {
        anyhow::bail!("Master password cannot be empty");
    }

    if secret.len() > MAX_MASTER_BYTES {
        anyhow::bail!(
            "Master password too long ({} bytes, maximum is {})",
            secret.len(),
            MAX_MASTER_BYTES
        );
    }

    confirm_control_characters(&secret, "Master password")?;

    Ok(secret)
}

pub fn format_fingerprint(fingerprint: &Fingerprint, options: &DisplayOptions) -> String {
    let icons = if options.unicode_support {
        FINGERPRINT_ICONS
    } else {
        FINGERPRINT_ASCII
    };
    let icons: Vec<char> = icons.chars().collect();

    fingerprint
        .windows()
        .iter()
        .map(|&window| {
            let icon = icons[window as usize % icons.len()];
            if options.color_support {
                let color = FINGERPRINT_COLORS[window as usize % FINGERPRINT_COLORS.len()];
                Style::new().color256(color).apply_to(icon).to_string()
            } else {
                icon.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn display_fingerprint(fingerprint: &Fingerprint, options: &DisplayOptions) {
    println!("Fingerprint:     {}", format_fingerprint(fingerprint, options));
}

fn write_progress_header(out: &mut impl Write, options: &DisplayOptions) -> io::Result<()> {
    if !options.quiet {
        writeln!(out)?;
    }
    Ok(())
}

fn progress_bar(options: &DisplayOptions) -> ProgressBar {
    if options.quiet {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();

    if options.unicode_support {
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠁", "⠂", "⠄", "⡀", "⢀", "⠠", "⠐", "⠈", "⠁"]),
        );
    } else {
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_chars("-\\|/-"),
        );
    }

    pb.set_message("Deriving password...");
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

pub fn show_progress<F, T>(options: &DisplayOptions, f: F) -> Result<(T, Duration)>
where
    F: FnOnce() -> Result<T>,
{
    write_progress_header(&mut io::stdout(), options)?;

    let term = Term::stdout();
    if !options.quiet {
        term.hide_cursor().ok();
    }

    let pb = progress_bar(options);

    let start = Instant::now();
    let result = f();
    let elapsed = start.elapsed();

    pb.finish_and_clear();
    if !options.quiet {
        term.show_cursor().ok();
    }

    result.map(|r| (r, elapsed))
}

pub fn display_output(
    password: &Zeroizing<String>,
    preview: &ProfilePreview,
    charset_size: usize,
    elapsed: Duration,
    options: &DisplayOptions,
) {
    if options.quiet {
        println!("{}", &**password);
        return;
    }

    println!("Password:\n{}\n", &**password);
    display_settings(preview, charset_size, elapsed, options);
}

fn display_settings(
    preview: &ProfilePreview,
    charset_size: usize,
    elapsed: Duration,
    options: &DisplayOptions,
) {
    let check_ok = get_status_symbol(options.unicode_support);
    let (branch, last) = if options.unicode_support {
        ("├─", "└─")
    } else {
        ("|-", "`-")
    };

    let value_style = if options.color_support {
        Style::new().green()
    } else {
        Style::new()
    };

    println!("Settings:");
    println!(
        "  {} KDF        PBKDF2-HMAC-{} ({} {})",
        branch,
        value_style.apply_to(preview.algorithm),
        value_style.apply_to(preview.iterations),
        if preview.iterations == 1 {
            "iteration"
        } else {
            "iterations"
        }
    );
    println!(
        "  {} Classes    {} ({} chars)",
        branch,
        value_style.apply_to(&preview.classes),
        charset_size
    );
    println!(
        "  {} Length     {} {}",
        branch,
        value_style.apply_to(preview.length),
        if preview.length == 1 { "char" } else { "chars" }
    );
    println!(
        "  {} Counter    {}",
        branch,
        value_style.apply_to(preview.counter)
    );
    println!("  {} Time       {:.1}s", last, elapsed.as_secs_f64());

    println!(
        "\n{} {}",
        value_style.apply_to(format!("[{}]", check_ok)),
        summary_line(preview)
    );
}

/// `Aa1$ 16 #1 100000 SHA256`
pub fn summary_line(preview: &ProfilePreview) -> String {
    format!(
        "{} {} #{} {} {}",
        preview.classes, preview.length, preview.counter, preview.iterations, preview.algorithm
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use lesspass::Profile;

    fn plain() -> DisplayOptions {
        DisplayOptions {
            unicode_support: false,
            color_support: false,
            quiet: false,
        }
    }

    fn quiet() -> DisplayOptions {
        DisplayOptions {
            quiet: true,
            ..plain()
        }
    }

    #[test]
    fn test_get_status_symbol() {
        assert_eq!(get_status_symbol(true), "✓");
        assert_eq!(get_status_symbol(false), "+");
    }

    #[test]
    fn test_quiet_progress_prints_nothing() {
        let mut out = Vec::new();
        write_progress_header(&mut out, &quiet()).unwrap();
        assert!(out.is_empty());
        assert!(progress_bar(&quiet()).is_hidden());

        let (value, _) = show_progress(&quiet(), || Ok(42)).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn test_progress_header_separates_prompts() {
        let mut out = Vec::new();
        write_progress_header(&mut out, &plain()).unwrap();
        assert_eq!(out, b"\n");
    }

    #[test]
    fn test_normalize_nfc() {
        let nfc = "café";
        let nfd = "cafe\u{0301}";

        assert_ne!(nfc.as_bytes(), nfd.as_bytes());
        assert_eq!(normalize_identifier(nfc), normalize_identifier(nfd));
    }

    #[test]
    fn test_trim_whitespace() {
        let cases = vec![
            ("  example.org  ", "example.org"),
            ("\texample.org\t", "example.org"),
            ("  my site  ", "my site"),
            (" café ", "café"),
        ];

        for (input, expected) in cases {
            assert_eq!(normalize_identifier(input), expected);
        }
    }

    #[test]
    fn test_prepare_identifier_keeps_raw_text_by_default() {
        let raw = prepare_identifier(" example.org", "Site", false).unwrap();
        assert_eq!(raw, " example.org");

        let normalized = prepare_identifier(" example.org", "Site", true).unwrap();
        assert_eq!(normalized, "example.org");
    }

    #[test]
    fn test_prepare_identifier_rejects_empty() {
        assert!(prepare_identifier("", "Site", false).is_err());
        assert!(prepare_identifier("   ", "Login", true).is_err());
    }

    #[test]
    fn test_prepare_identifier_rejects_oversized() {
        let long = "a".repeat(MAX_IDENTIFIER_BYTES + 1);
        let err = prepare_identifier(&long, "Site", false).unwrap_err();
        assert!(err.to_string().contains("too long"));
    }

    #[test]
    fn test_control_character_positions() {
        assert!(control_character_positions("example.org").is_empty());
        assert_eq!(control_character_positions("a\u{0007}b\tc"), vec![1, 3]);
    }

    #[test]
    fn test_strip_line_ending() {
        let mut unix = b"example.org\n".to_vec();
        strip_line_ending(&mut unix);
        assert_eq!(unix, b"example.org");

        let mut windows = b"example.org\r\n".to_vec();
        strip_line_ending(&mut windows);
        assert_eq!(windows, b"example.org");

        let mut bare = b"example.org".to_vec();
        strip_line_ending(&mut bare);
        assert_eq!(bare, b"example.org");
    }

    #[test]
    fn test_format_fingerprint_ascii() {
        let fp = lesspass::fingerprint("abc").unwrap();
        let ascii: Vec<char> = FINGERPRINT_ASCII.chars().collect();
        let expected = fp
            .windows()
            .iter()
            .map(|w| ascii[*w as usize % ascii.len()].to_string())
            .collect::<Vec<_>>()
            .join(" ");

        assert_eq!(format_fingerprint(&fp, &plain()), expected);
    }

    #[test]
    fn test_fingerprint_tables() {
        assert_eq!(FINGERPRINT_ICONS.chars().count(), 24);
        assert_eq!(FINGERPRINT_ASCII.chars().count(), 24);
        assert!(FINGERPRINT_ASCII.is_ascii());
    }

    #[test]
    fn test_format_fingerprint_differs_for_typo() {
        let options = DisplayOptions {
            unicode_support: true,
            ..plain()
        };
        let right = lesspass::fingerprint("password").unwrap();
        let typo = lesspass::fingerprint("passwrod").unwrap();
        assert_ne!(format_fingerprint(&right, &options), format_fingerprint(&typo, &options));
    }

    #[test]
    fn test_summary_line() {
        assert_eq!(
            summary_line(&Profile::default().preview()),
            "Aa1$ 16 #1 100000 SHA256"
        );
    }
}
