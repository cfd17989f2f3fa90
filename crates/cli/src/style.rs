//! Shared styling utilities for terminal output.

use console::Style;

/// Create a success-styled string (green with checkmark).
pub fn success(msg: &str) -> String {
    let style = Style::new().green();
    format!("{} {}", style.apply_to("✓"), msg)
}

/// Create a header-styled string (bold, white).
pub fn header(msg: &str) -> String {
    let style = Style::new().bold();
    style.apply_to(msg).to_string()
}

/// Create a dim-styled string.
pub fn dim(msg: &str) -> String {
    let style = Style::new().dim();
    style.apply_to(msg).to_string()
}

/// Label for a resource whose source file changed (yellow, bold).
pub fn changed() -> String {
    let style = Style::new().yellow().bold();
    format!("{} changed", style.apply_to("●"))
}

/// Label for an untouched resource (dim).
pub fn unchanged() -> String {
    let style = Style::new().dim();
    format!("{} unchanged", style.apply_to("○"))
}
