//! Utility functions for UI rendering

use std::io;

use crossterm::{
    cursor::MoveTo,
    execute,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
};

use crate::constants::DIALOG_MARGIN;

/// Truncates a string to fit within a given width.
///
/// If the string exceeds `max_len` characters, it is cut and "..." is
/// appended.
#[must_use]
pub fn truncate_string(s: &str, max_len: usize) -> String {
    let len = s.chars().count();
    if len <= max_len {
        s.to_string()
    } else if max_len > 3 {
        let kept: String = s.chars().take(max_len - 3).collect();
        format!("{}...", kept)
    } else {
        s.chars().take(max_len).collect()
    }
}

/// Keeps the end of a path, which is the part that tells files apart.
#[must_use]
pub fn truncate_path(s: &str, max_len: usize) -> String {
    let len = s.chars().count();
    if len <= max_len || max_len <= 3 {
        truncate_string(s, max_len)
    } else {
        let kept: String = s.chars().skip(len - (max_len - 3)).collect();
        format!("...{}", kept)
    }
}

/// Fills the whole screen with a dimmed background behind a dialog.
pub fn dim_background(stdout: &mut io::Stdout, width: usize, height: usize) -> io::Result<()> {
    for y in 0..height {
        execute!(
            stdout,
            MoveTo(0, y as u16),
            SetBackgroundColor(Color::Black),
            SetForegroundColor(Color::DarkGrey),
            Print(format!("{:w$}", "", w = width)),
            ResetColor
        )?;
    }
    Ok(())
}

/// A bordered box centered on the screen.
pub struct DialogBox {
    start_x: usize,
    start_y: usize,
    inner_width: usize,
}

impl DialogBox {
    /// Centers a `box_width` x `box_height` box, shrinking it to fit.
    pub fn centered(width: usize, height: usize, box_width: usize, box_height: usize) -> Self {
        let box_width = box_width.min(width.saturating_sub(DIALOG_MARGIN)).max(4);
        let box_height = box_height.min(height.saturating_sub(2));
        Self {
            start_x: width.saturating_sub(box_width) / 2,
            start_y: height.saturating_sub(box_height) / 2,
            inner_width: box_width - 2,
        }
    }

    /// Width between the borders
    pub fn inner_width(&self) -> usize {
        self.inner_width
    }

    fn rule(&self, stdout: &mut io::Stdout, row: usize, left: &str, right: &str) -> io::Result<()> {
        execute!(
            stdout,
            MoveTo(self.start_x as u16, (self.start_y + row) as u16),
            SetBackgroundColor(Color::DarkBlue),
            SetForegroundColor(Color::White),
            Print(left),
            Print("─".repeat(self.inner_width)),
            Print(right),
            ResetColor
        )
    }

    pub fn top(&self, stdout: &mut io::Stdout, row: usize) -> io::Result<()> {
        self.rule(stdout, row, "┌", "┐")
    }

    pub fn separator(&self, stdout: &mut io::Stdout, row: usize) -> io::Result<()> {
        self.rule(stdout, row, "├", "┤")
    }

    pub fn bottom(&self, stdout: &mut io::Stdout, row: usize) -> io::Result<()> {
        self.rule(stdout, row, "└", "┘")
    }

    /// Draws `content` between the borders, padded or cut to fit.
    pub fn line(
        &self,
        stdout: &mut io::Stdout,
        row: usize,
        content: &str,
        fg: Color,
    ) -> io::Result<()> {
        let fitted = truncate_string(content, self.inner_width);
        execute!(
            stdout,
            MoveTo(self.start_x as u16, (self.start_y + row) as u16),
            SetBackgroundColor(Color::DarkBlue),
            SetForegroundColor(Color::White),
            Print("│"),
            SetForegroundColor(fg),
            Print(format!("{:<w$}", fitted, w = self.inner_width)),
            SetForegroundColor(Color::White),
            Print("│"),
            ResetColor
        )
    }

    /// Draws `title` centered between the borders.
    pub fn title(&self, stdout: &mut io::Stdout, row: usize, title: &str) -> io::Result<()> {
        let fitted = truncate_string(title, self.inner_width);
        let pad = self.inner_width.saturating_sub(fitted.chars().count()) / 2;
        let centered = format!("{:pad$}{}", "", fitted, pad = pad);
        self.line(stdout, row, &centered, Color::Yellow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("firefox", 10), "firefox");
        assert_eq!(truncate_string("firefox-bin", 8), "firef...");
        assert_eq!(truncate_string("abc", 2), "ab");
        // Counts characters, not bytes
        assert_eq!(truncate_string("────", 4), "────");
    }

    #[test]
    fn test_truncate_path_keeps_tail() {
        assert_eq!(truncate_path("/usr/bin/app", 20), "/usr/bin/app");
        assert_eq!(truncate_path("/usr/local/bin/app", 10), "...bin/app");
    }
}
