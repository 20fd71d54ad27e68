use colored::Colorize;
use std::time::Duration;

use crate::common::error::MigratorError;
use crate::domain::entities::RepositorySummary;

/// Display utilities for the CLI interface
pub struct DisplayHelper {
    pub use_color: bool,
}

impl DisplayHelper {
    /// Create a new DisplayHelper
    pub fn new(use_color: bool) -> Self {
        Self { use_color }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if self.use_color {
            println!("{} {}", "✓".green().bold(), message);
        } else {
            println!("[SUCCESS] {}", message);
        }
    }

    /// Print an error message
    pub fn error(&self, message: &str) {
        if self.use_color {
            eprintln!("{} {}", "✗".red().bold(), message);
        } else {
            eprintln!("[ERROR] {}", message);
        }
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.use_color {
            println!("{} {}", "⚠".yellow().bold(), message);
        } else {
            println!("[WARNING] {}", message);
        }
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.use_color {
            println!("{} {}", "::".blue().bold(), message);
        } else {
            println!("[INFO] {}", message);
        }
    }

    /// Format a URL with appropriate styling
    pub fn format_url(&self, url: &str) -> String {
        if self.use_color {
            url.blue().underline().to_string()
        } else {
            url.to_string()
        }
    }

    /// Format a repository name with appropriate styling
    pub fn format_repo(&self, repo: &str) -> String {
        if self.use_color {
            repo.cyan().bold().to_string()
        } else {
            repo.to_string()
        }
    }

    /// Print repositories as a table
    pub fn print_repositories(&self, repositories: &[RepositorySummary]) {
        let rows: Vec<Vec<String>> = repositories
            .iter()
            .map(|r| {
                vec![
                    r.platform.to_string(),
                    r.name.clone(),
                    r.path.clone(),
                    r.default_branch.clone().unwrap_or_else(|| "-".to_string()),
                    r.http_url.clone().unwrap_or_else(|| "-".to_string()),
                ]
            })
            .collect();
        print!(
            "{}",
            render_table(&["PLATFORM", "NAME", "PATH", "BRANCH", "CLONE URL"], &rows, self.use_color)
        );
    }

    /// Print a crate error as `[code] message`
    pub fn print_migrator_error(&self, error: &MigratorError) {
        let code = format!("[{}]", error.code());
        if self.use_color {
            eprintln!("{} {} {}", "✗".red().bold(), code.red(), error);
        } else {
            eprintln!("[ERROR] {} {}", code, error);
        }

        let mut current = std::error::Error::source(error);
        while let Some(cause) = current {
            eprintln!("  Caused by: {}", cause);
            current = cause.source();
        }
    }

    /// Format a duration in human-readable format
    pub fn format_duration(&self, duration: Duration) -> String {
        let secs = duration.as_secs();
        let millis = duration.subsec_millis();

        if secs > 60 {
            format!("{}m {}s", secs / 60, secs % 60)
        } else if secs > 0 {
            format!("{}.{}s", secs, millis / 100)
        } else {
            format!("{}ms", millis)
        }
    }
}

/// Render rows as left-aligned columns
pub fn render_table(headers: &[&str], rows: &[Vec<String>], use_color: bool) -> String {
    if rows.is_empty() {
        return String::new();
    }

    let mut col_widths = headers.iter().map(|h| h.chars().count()).collect::<Vec<_>>();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if i < col_widths.len() {
                col_widths[i] = col_widths[i].max(cell.chars().count());
            }
        }
    }

    let mut out = String::new();
    let header_line = headers
        .iter()
        .zip(&col_widths)
        .map(|(h, w)| format!("{:<width$}", h, width = *w))
        .collect::<Vec<_>>()
        .join("  ");
    if use_color {
        out.push_str(&header_line.trim_end().bold().to_string());
    } else {
        out.push_str(header_line.trim_end());
    }
    out.push('\n');

    let rule = if use_color { "─" } else { "-" };
    out.push_str(
        &col_widths
            .iter()
            .map(|w| rule.repeat(*w))
            .collect::<Vec<_>>()
            .join("  "),
    );
    out.push('\n');

    for row in rows {
        let line = row
            .iter()
            .enumerate()
            .map(|(i, cell)| format!("{:<width$}", cell, width = col_widths.get(i).copied().unwrap_or(0)))
            .collect::<Vec<_>>()
            .join("  ");
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_table_aligns_columns() {
        let rows = vec![
            vec!["api".to_string(), "team/api".to_string()],
            vec!["frontend".to_string(), "web/frontend".to_string()],
        ];
        let table = render_table(&["NAME", "PATH"], &rows, false);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "NAME      PATH");
        assert_eq!(lines[1], "--------  ------------");
        assert_eq!(lines[2], "api       team/api");
        assert_eq!(lines[3], "frontend  web/frontend");
    }

    #[test]
    fn test_render_table_empty() {
        assert_eq!(render_table(&["NAME"], &[], false), "");
    }

    #[test]
    fn test_format_duration() {
        let display = DisplayHelper::new(false);
        assert_eq!(display.format_duration(Duration::from_millis(250)), "250ms");
        assert_eq!(display.format_duration(Duration::from_millis(2500)), "2.5s");
        assert_eq!(display.format_duration(Duration::from_secs(125)), "2m 5s");
    }

    #[test]
    fn test_plain_formatting_without_color() {
        let display = DisplayHelper::new(false);
        assert_eq!(display.format_repo("api"), "api");
        assert_eq!(display.format_url("https://x/y.git"), "https://x/y.git");
    }
}
