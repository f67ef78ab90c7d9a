//! Colored output helpers for the GLIMPS CLI

use crate::types::{Job, JobStatus};
use crate::viewer::ViewerNotice;
use owo_colors::OwoColorize;
use std::io::{self, Write};

/// Output style configuration
pub struct Output {
    /// Whether to use colored output
    pub colored: bool,
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

impl Output {
    pub fn new() -> Self {
        Self { colored: true }
    }

    pub fn no_color() -> Self {
        Self { colored: false }
    }

    pub fn success(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "✓".green().bold(), message.green());
        } else {
            println!("  [OK] {}", message);
        }
    }

    pub fn info(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "•".blue(), message);
        } else {
            println!("  [INFO] {}", message);
        }
    }

    pub fn warning(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "⚠".yellow().bold(), message.yellow());
        } else {
            println!("  [WARN] {}", message);
        }
    }

    pub fn error(&self, message: &str) {
        if self.colored {
            eprintln!("  {} {}", "✗".red().bold(), message.red());
        } else {
            eprintln!("  [ERROR] {}", message);
        }
    }

    pub fn header(&self, title: &str) {
        if self.colored {
            println!("\n  {}", title.bright_white().bold().underline());
        } else {
            println!("\n  === {} ===", title);
        }
    }

    pub fn kv(&self, key: &str, value: &str) {
        if self.colored {
            println!("    {}: {}", key.dimmed(), value.bright_white());
        } else {
            println!("    {}: {}", key, value);
        }
    }

    pub fn hint(&self, message: &str) {
        if self.colored {
            println!("\n  {}", message.dimmed().italic());
        } else {
            println!("\n  [TIP] {}", message);
        }
    }

    pub fn command(&self, cmd: &str) {
        if self.colored {
            println!("     {}", format!("$ {}", cmd).bright_cyan());
        } else {
            println!("     $ {}", cmd);
        }
    }

    /// Ask a yes/no question on stdin. Anything but `y`/`yes` is a no.
    pub fn confirm(&self, message: &str) -> bool {
        if self.colored {
            print!(
                "  {} {} [y/N]: ",
                "?".bright_yellow().bold(),
                message.bright_white()
            );
        } else {
            print!("  [?] {} [y/N]: ", message);
        }
        io::stdout().flush().ok();

        let mut input = String::new();
        if io::stdin().read_line(&mut input).is_ok() {
            let input = input.trim().to_lowercase();
            input == "y" || input == "yes"
        } else {
            false
        }
    }

    /// Read one line from stdin after printing `label`.
    pub fn prompt(&self, label: &str) -> io::Result<String> {
        if self.colored {
            print!("  {} ", format!("{}:", label).bright_white());
        } else {
            print!("  {}: ", label);
        }
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        Ok(input.trim_end_matches(['\r', '\n']).to_string())
    }

    pub fn table_header(&self, columns: &[(&str, usize)]) {
        let header = pad_row(columns.iter().map(|(c, w)| (*c, *w)));
        let rule_width: usize = columns.iter().map(|(_, w)| w + 1).sum();
        if self.colored {
            println!("    {}", header.bright_white().bold());
            println!("    {}", "─".repeat(rule_width).dimmed());
        } else {
            println!("    {}", header);
            println!("    {}", "-".repeat(rule_width));
        }
    }

    pub fn table_row(&self, values: &[(&str, usize)]) {
        println!("    {}", pad_row(values.iter().map(|(v, w)| (*v, *w))));
    }

    /// Status word colored by job state.
    pub fn status(&self, status: JobStatus) -> String {
        let label = format!("{:<10}", status.as_str());
        if !self.colored {
            return label;
        }
        match status {
            JobStatus::Completed => label.green().to_string(),
            JobStatus::Failed => label.red().to_string(),
            JobStatus::Cancelled => label.dimmed().to_string(),
            JobStatus::Running => label.cyan().bold().to_string(),
            JobStatus::Pending | JobStatus::Queued => label.yellow().to_string(),
        }
    }

    pub fn job_row(&self, job: &Job) {
        let progress = progress_bar(job.progress_percent, 20);
        let message = job
            .error_message
            .as_deref()
            .or(job.progress_message.as_deref())
            .unwrap_or("");
        println!(
            "    {:<38} {:<16} {} {} {}",
            job.id,
            job.job_type.label(),
            self.status(job.status),
            progress,
            message
        );
    }

    /// The viewer's error presentation.
    pub fn viewer_notice(&self, notice: &ViewerNotice) {
        if self.colored {
            eprintln!("\n  {}", notice.title.red().bold());
            eprintln!("  {}", notice.message);
            eprintln!("  {}", notice.hint.dimmed());
        } else {
            eprintln!("\n  [ERROR] {}", notice.title);
            eprintln!("  {}", notice.message);
            eprintln!("  {}", notice.hint);
        }
    }

    pub fn newline(&self) {
        println!();
    }
}

fn pad_row<'a>(cells: impl Iterator<Item = (&'a str, usize)>) -> String {
    cells
        .map(|(value, width)| format!("{:<width$}", truncate(value, width), width = width))
        .collect::<Vec<_>>()
        .join(" ")
}

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    let keep = width.saturating_sub(1);
    let mut out: String = value.chars().take(keep).collect();
    out.push('…');
    out
}

/// `[#####-----]  50%` style bar.
pub fn progress_bar(percent: f64, width: usize) -> String {
    let clamped = percent.clamp(0.0, 100.0);
    let filled = ((clamped / 100.0) * width as f64).round() as usize;
    format!(
        "[{}{}] {:>3.0}%",
        "#".repeat(filled),
        "-".repeat(width - filled),
        clamped
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(0.0, 10), "[----------]   0%");
        assert_eq!(progress_bar(50.0, 10), "[#####-----]  50%");
        assert_eq!(progress_bar(250.0, 4), "[####] 100%");
        assert_eq!(progress_bar(-3.0, 4), "[----]   0%");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a very long project name", 8), "a very …");
    }

    #[test]
    fn test_plain_status_is_padded() {
        let output = Output::no_color();
        assert_eq!(output.status(JobStatus::Running), "running   ");
    }

    #[test]
    fn test_output_methods_no_panic() {
        let output = Output::no_color();
        output.success("saved");
        output.info("info");
        output.warning("careful");
        output.error("failed");
        output.header("Projects");
        output.kv("key", "value");
        output.hint("hint");
        output.command("glimps login");
        output.table_header(&[("ID", 8), ("Name", 12)]);
        output.table_row(&[("abc", 8), ("Lysozyme", 12)]);
        output.table_row(&[]);
        output.newline();
    }
}
