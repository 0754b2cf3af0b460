//! Styled status messages on stderr.
//!
//! Colors are used only when stderr is a terminal and `NO_COLOR` is unset.

use std::io::IsTerminal;

/// Check if colors should be disabled based on NO_COLOR env var.
fn colors_disabled() -> bool {
    std::env::var("NO_COLOR")
        .map(|v| !v.is_empty() && v != "0" && v.to_lowercase() != "false")
        .unwrap_or(false)
}

const RESET: &str = "\x1b[0m";

/// Message type for styled output.
#[derive(Debug, Clone, Copy)]
pub enum MessageType {
    Success,
    Error,
    Warning,
    Info,
}

impl MessageType {
    fn icon(&self) -> &'static str {
        match self {
            MessageType::Success => "[OK]",
            MessageType::Error => "[ERROR]",
            MessageType::Warning => "[WARN]",
            MessageType::Info => "[INFO]",
        }
    }

    fn color(&self) -> &'static str {
        match self {
            MessageType::Success => "\x1b[38;2;0;245;212m",
            MessageType::Error => "\x1b[38;2;255;107;107m",
            MessageType::Warning => "\x1b[38;2;255;200;87m",
            MessageType::Info => "\x1b[38;2;72;202;228m",
        }
    }
}

/// Format a message, with colors when `use_colors` is set.
pub fn format_styled(msg_type: MessageType, message: &str, use_colors: bool) -> String {
    if use_colors {
        let (color, icon) = (msg_type.color(), msg_type.icon());
        format!("{}{} {}{}", color, icon, message, RESET)
    } else {
        format!("{} {}", msg_type.icon(), message)
    }
}

/// Print a styled message to stderr.
pub fn print_styled(msg_type: MessageType, message: &str) {
    let use_colors = !colors_disabled() && std::io::stderr().is_terminal();
    eprintln!("{}", format_styled(msg_type, message, use_colors));
}

pub fn print_success(message: &str) {
    print_styled(MessageType::Success, message);
}

pub fn print_error(message: &str) {
    print_styled(MessageType::Error, message);
}

pub fn print_warning(message: &str) {
    print_styled(MessageType::Warning, message);
}

pub fn print_info(message: &str) {
    print_styled(MessageType::Info, message);
}
