// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Yombool Contributors

//! Interactive shell over a controller

use super::reporter::{Reporter, SessionReport};
use super::script::{deliver_file, execute, Step};
use crate::brush::BooleanEvaluator;
use crate::controller::{Control, Controller, Notifier};
use anyhow::{Context, Result};
use colored::*;
use std::io::{BufRead, Write};
use std::path::Path;

const HELP: &str = "\
Commands:
  add FILE          union FILE into the current solid (first file seeds it)
  subtract FILE     subtract FILE from the current solid
  intersect FILE    keep the overlap with FILE
  cut FILE          split the current solid along FILE into two pieces
  save              write the current solid(s) to the output directory
  status [--json]   show the session
  help              show this help
  quit              leave the shell

An operation without FILE asks for the file on the next line;
an empty line cancels it.";

/// What the shell should do after a line
#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Line-oriented front end. Prompts are only printed when `interactive`.
pub struct Shell<R: BufRead> {
    input: R,
    interactive: bool,
}

impl<R: BufRead> Shell<R> {
    pub fn new(input: R, interactive: bool) -> Self {
        Self { input, interactive }
    }

    /// Read and run commands until `quit` or end of input
    pub fn run<N: Notifier, E: BooleanEvaluator>(
        &mut self,
        controller: &mut Controller<N, E>,
    ) -> Result<()> {
        if self.interactive {
            println!(
                "{} {} (type {} for commands)",
                "yombool".bold(),
                env!("CARGO_PKG_VERSION"),
                "help".cyan()
            );
        }

        while let Some(line) = self.read_line("yombool> ")? {
            if self.handle_line(controller, &line)? == Flow::Quit {
                break;
            }
        }
        Ok(())
    }

    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        if self.interactive {
            print!("{}", prompt.bright_black());
            std::io::stdout().flush().context("Failed to flush stdout")?;
        }

        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .context("Failed to read command")?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn handle_line<N: Notifier, E: BooleanEvaluator>(
        &mut self,
        controller: &mut Controller<N, E>,
        line: &str,
    ) -> Result<Flow> {
        let (verb, arg) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, Some(rest.trim())),
            None => (line, None),
        };

        match verb {
            "" => {}
            "quit" | "exit" => return Ok(Flow::Quit),
            "help" | "?" => println!("{}", HELP),
            "status" if arg == Some("--json") => {
                let report = SessionReport::capture(controller.session(), &controller.controls());
                println!(
                    "{}",
                    serde_json::to_string_pretty(&report).context("Failed to encode status")?
                );
            }
            _ => match verb.parse::<Control>() {
                Ok(control) if control != Control::Save && arg.is_none() => {
                    self.two_phase(controller, control)?
                }
                _ => match Step::from_parts(verb, arg) {
                    Ok(step) => {
                        if let Err(err) = execute(controller, &step) {
                            if !err.is_notified() {
                                Reporter::report_error(&err.to_string());
                            }
                        }
                    }
                    Err(message) => Reporter::report_error(&message),
                },
            },
        }
        Ok(Flow::Continue)
    }

    /// Press the control, then take the file from the next line
    fn two_phase<N: Notifier, E: BooleanEvaluator>(
        &mut self,
        controller: &mut Controller<N, E>,
        control: Control,
    ) -> Result<()> {
        if let Err(err) = controller.press(control) {
            Reporter::report_error(&err.to_string());
            return Ok(());
        }

        match self.read_line("file> ")? {
            Some(file) if !file.is_empty() => {
                if let Err(err) = deliver_file(controller, Path::new(&file)) {
                    if !err.is_notified() {
                        Reporter::report_error(&err.to_string());
                    }
                }
            }
            _ => {
                controller.dialog_cancelled();
                Reporter::report_info(&format!("{} cancelled", control));
            }
        }
        Ok(())
    }
}
