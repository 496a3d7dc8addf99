use std::io::Write;

use console::Style;

/// Colour of a status label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Action,
    Info,
    Warn,
}

impl Tone {
    fn style(self) -> Style {
        let style = Style::new().bold();
        match self {
            Tone::Action => style.green(),
            Tone::Info => style.cyan(),
            Tone::Warn => style.yellow(),
        }
    }
}

/// Render `label` right-aligned in a 12 column gutter followed by `message`,
/// e.g. `   Resolving compileClasspath`.
pub fn format_status(tone: Tone, label: &str, message: &str) -> String {
    format!("{:>12} {message}", tone.style().apply_to(label))
}

/// Write a status line to stderr so stdout stays clean for reports.
pub fn status_with(tone: Tone, label: &str, message: &str) {
    let _ = writeln!(std::io::stderr(), "{}", format_status(tone, label, message));
}

pub fn status(label: &str, message: &str) {
    status_with(Tone::Action, label, message);
}

pub fn status_info(label: &str, message: &str) {
    status_with(Tone::Info, label, message);
}

pub fn status_warn(label: &str, message: &str) {
    status_with(Tone::Warn, label, message);
}
