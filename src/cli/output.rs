//! Output formatting module for vpclookup
//!
//! Results go to stdout so they can be piped; diagnostics go to stderr.

use colored::Colorize;
use vpclookup::output::{render_human, render_json, Outputs};

/// Output formatter for different output modes
pub struct OutputFormatter {
    /// Use colored output
    use_color: bool,
    /// JSON output mode
    json_mode: bool,
    /// Verbosity level
    verbosity: u8,
}

impl OutputFormatter {
    /// Create a new output formatter
    pub fn new(use_color: bool, json_mode: bool, verbosity: u8) -> Self {
        // Respect NO_COLOR environment variable
        let use_color = use_color && std::env::var("NO_COLOR").is_err();

        Self {
            use_color,
            json_mode,
            verbosity,
        }
    }

    pub fn is_json(&self) -> bool {
        self.json_mode
    }

    /// Print bound outputs to stdout
    pub fn outputs(&self, outputs: &Outputs) -> anyhow::Result<()> {
        if self.json_mode {
            println!("{}", render_json(outputs)?);
            return Ok(());
        }

        if outputs.is_empty() {
            self.warning("descriptor declares no outputs");
            return Ok(());
        }

        if !self.use_color {
            print!("{}", render_human(outputs));
            return Ok(());
        }

        for (name, output) in outputs {
            let value = if output.sensitive {
                "<sensitive>".to_string()
            } else {
                output.value.to_string()
            };
            println!("{} = {}", name.bright_white().bold(), value.green());
        }
        Ok(())
    }

    /// Print a line of plain result text to stdout
    pub fn plain(&self, text: &str) {
        println!("{}", text);
    }

    /// Print a JSON document to stdout
    pub fn json(&self, value: &serde_json::Value) -> anyhow::Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }

    /// Print a success line (human mode only)
    pub fn success(&self, message: &str) {
        if self.json_mode {
            return;
        }

        if self.use_color {
            eprintln!("{}", message.green().bold());
        } else {
            eprintln!("{}", message);
        }
    }

    /// Print an error message
    pub fn error(&self, message: &str) {
        if self.json_mode {
            let err = serde_json::json!({
                "type": "error",
                "message": message
            });
            eprintln!("{}", err);
            return;
        }

        if self.use_color {
            eprintln!("{} {}", "ERROR:".red().bold(), message);
        } else {
            eprintln!("ERROR: {}", message);
        }
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.json_mode {
            let warn = serde_json::json!({
                "type": "warning",
                "message": message
            });
            eprintln!("{}", warn);
            return;
        }

        if self.use_color {
            eprintln!("{} {}", "WARNING:".yellow().bold(), message);
        } else {
            eprintln!("WARNING: {}", message);
        }
    }

    /// Print a hint message
    pub fn hint(&self, message: &str) {
        if self.json_mode {
            return;
        }

        if self.use_color {
            eprintln!("{} {}", "HINT:".cyan().bold(), message);
        } else {
            eprintln!("HINT: {}", message);
        }
    }

    /// Print an info message (respects verbosity)
    pub fn info(&self, message: &str) {
        if self.verbosity < 1 || self.json_mode {
            return;
        }

        if self.use_color {
            eprintln!("{} {}", "INFO:".blue(), message);
        } else {
            eprintln!("INFO: {}", message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_no_color_env_disables_color() {
        std::env::set_var("NO_COLOR", "1");
        let formatter = OutputFormatter::new(true, false, 0);
        assert!(!formatter.use_color);
        std::env::remove_var("NO_COLOR");
    }

    #[test]
    fn test_json_mode_flag() {
        let formatter = OutputFormatter::new(false, true, 2);
        assert!(formatter.is_json());
    }
}
