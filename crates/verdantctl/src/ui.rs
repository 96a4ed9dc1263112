//! Terminal UI helpers for consistent output styling.

use owo_colors::OwoColorize;
use verdant_shared::notice::{MessageClass, Notice};
use verdant_shared::rules::Progress;

/// ANSI color codes using true color (24-bit)
pub mod colors {
    pub const HEADER: &str = "\x1b[38;2;150;220;130m";
    pub const OK: &str = "\x1b[38;2;120;255;120m";
    pub const DIM: &str = "\x1b[38;2;140;140;140m";
    pub const BOLD: &str = "\x1b[1m";
    pub const RESET: &str = "\x1b[0m";
}

/// Unicode symbols
pub mod symbols {
    pub const OK: &str = "✓";
    pub const LOCKED: &str = "·";
    pub const ARROW: &str = "›";
    pub const PROGRESS_FULL: &str = "█";
    pub const PROGRESS_EMPTY: &str = "░";
}

/// Horizontal rule
pub const HR: &str =
    "──────────────────────────────────────────────────────────────────────────────";

/// Width of the key column in key-value output
pub const KEY_WIDTH: usize = 14;

/// Print a styled header with version
pub fn print_header(name: &str, version: &str) {
    println!();
    println!("{}{} v{}{}", colors::HEADER, name, version, colors::RESET);
    println!("{}{}{}", colors::DIM, HR, colors::RESET);
}

/// Print a footer with horizontal rule
pub fn print_footer() {
    println!("{}{}{}", colors::DIM, HR, colors::RESET);
    println!();
}

/// Print a section header like [section] description
pub fn print_section(section: &str, description: &str) {
    println!(
        "{}[{}{}{}]{} {}",
        colors::DIM,
        colors::RESET,
        section,
        colors::DIM,
        colors::RESET,
        description
    );
}

/// Print a key-value pair with alignment
pub fn print_kv(key: &str, value: &str) {
    println!("  {:width$} {}", key, value, width = KEY_WIDTH);
}

/// One catalog row: earned marker, glyph, name and detail
pub fn print_reward_row(earned: bool, glyph: &str, name: &str, detail: &str) {
    if earned {
        println!(
            "  {}{}{} {:8} {} {}{}{}",
            colors::OK,
            symbols::OK,
            colors::RESET,
            glyph,
            name,
            colors::DIM,
            detail,
            colors::RESET
        );
    } else {
        println!(
            "  {}{} {:8} {} {}{}",
            colors::DIM,
            symbols::LOCKED,
            glyph,
            name,
            detail,
            colors::RESET
        );
    }
}

/// Format a progress bar for a 0.0-1.0 fraction
pub fn progress_bar(fraction: f64, width: usize) -> String {
    let filled = ((fraction.clamp(0.0, 1.0) * width as f64) as usize).min(width);
    let empty = width - filled;
    format!(
        "[{}{}]",
        symbols::PROGRESS_FULL.repeat(filled),
        symbols::PROGRESS_EMPTY.repeat(empty)
    )
}

/// Progress toward a rule, e.g. "[██░░░░░░░░] 3/10"
pub fn format_progress(progress: &Progress, width: usize) -> String {
    let fraction = f64::from(progress.percentage()) / 100.0;
    format!("{} {}/{}", progress_bar(fraction, width), progress.current, progress.target)
}

/// Render a notice, colored by class
pub fn format_notice(notice: &Notice) -> String {
    let tag = format!("[{}]", notice.class);
    match notice.class {
        MessageClass::Info => format!("{} {}", tag.bright_blue(), notice.text),
        MessageClass::Success => format!("{} {}", tag.bright_green(), notice.text),
        MessageClass::Xp => format!("{} {}", tag.bright_yellow(), notice.text.yellow()),
        MessageClass::LevelUp => format!("{} {}", tag.bright_magenta().bold(), notice.text.bold()),
    }
}

pub fn print_notice(notice: &Notice) {
    println!("  {} {}", symbols::ARROW, format_notice(notice));
}

/// "1 day" / "4 days"
pub fn format_days(days: u32) -> String {
    if days == 1 {
        "1 day".to_string()
    } else {
        format!("{} days", days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(0.5, 10), "[█████░░░░░]");
        assert_eq!(progress_bar(1.0, 10), "[██████████]");
        assert_eq!(progress_bar(0.0, 10), "[░░░░░░░░░░]");
        assert_eq!(progress_bar(1.7, 4), "[████]");
    }

    #[test]
    fn test_format_progress() {
        let progress = Progress::clamped(3, 10);
        assert_eq!(format_progress(&progress, 10), "[███░░░░░░░] 3/10");
    }

    #[test]
    fn test_format_notice_keeps_text() {
        let rendered = format_notice(&Notice::new(MessageClass::Xp, "+10 xp"));
        assert!(rendered.contains("+10 xp"));
        assert!(rendered.contains("[xp]"));
    }

    #[test]
    fn test_format_days() {
        assert_eq!(format_days(0), "0 days");
        assert_eq!(format_days(1), "1 day");
        assert_eq!(format_days(12), "12 days");
    }
}
