use console::style;
use std::io::{self, Write};

use crate::runner::BuildOutcome;
use crate::session::RegisteredFile;

pub struct OutputHandler;

impl OutputHandler {
    pub fn new() -> Self {
        Self
    }

    pub fn print_assistant_label(&self) {
        println!("{}", style("Assistant:").green().bold());
    }

    pub fn print_chunk(&self, chunk: &str) {
        print!("{}", chunk);
        let _ = io::stdout().flush();
    }

    pub fn print_error(&self, content: &str) {
        println!("{} {}", style("Error:").red().bold(), content);
    }

    pub fn print_system(&self, content: &str) {
        println!("{}", style(content).yellow().dim());
    }

    pub fn print_success(&self, content: &str) {
        println!("{} {}", style("✔").green(), content);
    }

    pub fn print_registered_files(&self, files: &[RegisteredFile]) {
        if files.is_empty() {
            return;
        }
        println!();
        println!("{}", style("Generated code files:").cyan().bold());
        for file in files {
            println!(
                "  {} ({}, {})",
                style(&file.filename).cyan(),
                file.file_type,
                file.category
            );
        }
    }

    pub fn print_build_outcome(&self, outcome: &BuildOutcome) {
        if outcome.success {
            self.print_success(&outcome.message);
        } else {
            self.print_error(&outcome.message);
        }
        if !outcome.output.is_empty() {
            println!("{}", style(&outcome.output).dim());
        }
    }
}

impl Default for OutputHandler {
    fn default() -> Self {
        Self::new()
    }
}
