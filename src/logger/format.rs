//! Console and file rendering of log lines
//!
//! Console lines are colored and wrapped at word boundaries. File lines are
//! plain text with a full timestamp.

use super::file::write_to_file;
use super::levels::LogLevel;
use super::tags::LogTag;
use chrono::Local;
use colored::*;
use std::io::{stderr, stdout, ErrorKind, Write};

const TAG_WIDTH: usize = 10;
const LEVEL_WIDTH: usize = 8;
const TIME_WIDTH: usize = 9;
const PREFIX_WIDTH: usize = TIME_WIDTH + TAG_WIDTH + LEVEL_WIDTH + 6;

const MAX_LINE_LENGTH: usize = 140;

pub fn format_and_log(tag: &LogTag, level: LogLevel, message: &str) {
    let now = Local::now();
    let time = format!("{} ", now.format("%H:%M:%S")).dimmed();
    let base_line = format!("{}[{}] [{}] ", time, format_tag(tag), format_level(level));

    let available = MAX_LINE_LENGTH.saturating_sub(PREFIX_WIDTH).max(40);
    let chunks = wrap_text(message, available);

    let timestamp = now.format("%Y-%m-%d %H:%M:%S").to_string();
    let tag_plain = tag.to_plain_string();
    let continuation = " ".repeat(PREFIX_WIDTH);

    for (index, chunk) in chunks.iter().enumerate() {
        let console_line = if index == 0 {
            format!("{}{}", base_line, chunk)
        } else {
            format!("{}{}", continuation, chunk)
        };
        if level <= LogLevel::Warning {
            print_stderr_safe(&console_line);
        } else {
            print_stdout_safe(&console_line);
        }
        write_to_file(&format!(
            "{} [{}] [{}] {}",
            timestamp,
            tag_plain,
            level.as_str(),
            chunk
        ));
    }
}

fn format_tag(tag: &LogTag) -> ColoredString {
    let label = format!("{:<width$}", tag.to_plain_string(), width = TAG_WIDTH);
    match tag {
        LogTag::System => label.bright_yellow().bold(),
        LogTag::Config => label.yellow().bold(),
        LogTag::Tokens => label.bright_cyan().bold(),
        LogTag::Quote => label.bright_green().bold(),
        LogTag::Approval => label.bright_blue().bold(),
        LogTag::Transaction => label.blue().bold(),
        LogTag::Submission => label.bright_magenta().bold(),
        LogTag::Session => label.bright_white().bold(),
        LogTag::Wallet => label.magenta().bold(),
        LogTag::Api => label.bright_purple().bold(),
        LogTag::Other(_) => label.white().bold(),
    }
}

fn format_level(level: LogLevel) -> ColoredString {
    let label = format!("{:<width$}", level.as_str(), width = LEVEL_WIDTH);
    match level {
        LogLevel::Error => label.bright_red().bold(),
        LogLevel::Warning => label.yellow().bold(),
        LogLevel::Info => label.white().bold(),
        LogLevel::Debug | LogLevel::Verbose => label.dimmed(),
    }
}

/// Write a line to stdout, exiting quietly if the pipe was closed
fn print_stdout_safe(message: &str) {
    let mut out = stdout().lock();
    if let Err(e) = writeln!(out, "{}", message).and_then(|_| out.flush()) {
        if e.kind() == ErrorKind::BrokenPipe {
            std::process::exit(0);
        }
    }
}

fn print_stderr_safe(message: &str) {
    let _ = writeln!(stderr().lock(), "{}", message);
}

/// Remove ANSI color sequences
pub(crate) fn strip_ansi_codes(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut in_escape = false;

    for ch in text.chars() {
        if ch == '\x1b' {
            in_escape = true;
        } else if in_escape && ch == 'm' {
            in_escape = false;
        } else if !in_escape {
            result.push(ch);
        }
    }
    result
}

/// Wrap at word boundaries, keeping existing newlines. Words longer than
/// `max_width` (hex payloads, URLs) are split into fixed-width chunks.
fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    let mut result = Vec::new();

    for line in text.split('\n') {
        if strip_ansi_codes(line).chars().count() <= max_width {
            result.push(line.to_string());
            continue;
        }

        let mut current = String::new();
        for word in line.split_whitespace() {
            let word_len = strip_ansi_codes(word).chars().count();
            let current_len = strip_ansi_codes(&current).chars().count();

            if word_len > max_width {
                if !current.is_empty() {
                    result.push(std::mem::take(&mut current));
                }
                let chars: Vec<char> = word.chars().collect();
                result.extend(chars.chunks(max_width).map(|c| c.iter().collect::<String>()));
            } else if current.is_empty() {
                current = word.to_string();
            } else if current_len + 1 + word_len <= max_width {
                current.push(' ');
                current.push_str(word);
            } else {
                result.push(std::mem::replace(&mut current, word.to_string()));
            }
        }
        if !current.is_empty() {
            result.push(current);
        }
    }

    if result.is_empty() {
        result.push(String::new());
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_text_respects_width() {
        let wrapped = wrap_text("alpha beta gamma delta", 11);
        assert_eq!(wrapped, vec!["alpha beta", "gamma delta"]);
        assert!(wrapped.iter().all(|line| line.len() <= 11));
    }

    #[test]
    fn test_wrap_text_splits_long_words() {
        let data = format!("calldata 0x{}", "ab".repeat(30));
        let wrapped = wrap_text(&data, 20);
        assert_eq!(wrapped[0], "calldata");
        assert!(wrapped[1..].iter().all(|chunk| chunk.chars().count() <= 20));
        assert_eq!(wrapped[1..].concat(), format!("0x{}", "ab".repeat(30)));
    }

    #[test]
    fn test_wrap_text_keeps_newlines_and_empty_input() {
        assert_eq!(wrap_text("a\nb", 10), vec!["a", "b"]);
        assert_eq!(wrap_text("", 10), vec![String::new()]);
    }

    #[test]
    fn test_strip_ansi_codes() {
        assert_eq!(strip_ansi_codes("\x1b[1;32mQUOTE\x1b[0m"), "QUOTE");
    }
}
