//! CLI - reedline-based REPL interface
//!
//! Reads commands, runs them against the [`Session`], and prints results.
//! The same executor backs batch mode (`-x`), where the first failure stops
//! the run.

use anyhow::{anyhow, Result};
use colored::Colorize;
use reedline::{Prompt, PromptHistorySearch, PromptHistorySearchStatus, Reedline, Signal};
use std::borrow::Cow;

use crate::analysis::loader::LoadedBinary;
use crate::app::{parse_command, AppCommand, Session};

/// Custom prompt showing what the session is looking at
pub struct BoxPrompt {
    status: String,
}

impl BoxPrompt {
    pub fn new() -> Self {
        Self {
            status: "---".into(),
        }
    }

    pub fn update(&mut self, session: &Session) {
        self.status = match (session.debugger.target_pid(), &session.binary) {
            (Some(pid), _) => format!("pid:{}", pid),
            (None, Some(_)) => "img".into(),
            (None, None) => "---".into(),
        };
    }
}

impl Default for BoxPrompt {
    fn default() -> Self {
        Self::new()
    }
}

impl Prompt for BoxPrompt {
    fn render_prompt_left(&self) -> Cow<'_, str> {
        Cow::Owned(format!("[{}]", self.status))
    }

    fn render_prompt_right(&self) -> Cow<'_, str> {
        Cow::Borrowed("")
    }

    fn render_prompt_indicator(&self, _prompt_mode: reedline::PromptEditMode) -> Cow<'_, str> {
        Cow::Borrowed("> ")
    }

    fn render_prompt_multiline_indicator(&self) -> Cow<'_, str> {
        Cow::Borrowed("... ")
    }

    fn render_prompt_history_search_indicator(
        &self,
        history_search: PromptHistorySearch,
    ) -> Cow<'_, str> {
        let prefix = match history_search.status {
            PromptHistorySearchStatus::Passing => "",
            PromptHistorySearchStatus::Failing => "(failed) ",
        };
        Cow::Owned(format!("(search: {}{}) ", prefix, history_search.term))
    }
}

/// What the loop should do after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

const BOX_HELP: &str = "\
Examine memory and display the results in specific byte order.

Usage: box/FMT ADDRESS

Arguments:
   - FMT is a repeat count followed by a size letter and an endianness letter.
       - Size letters: b(byte), h(halfword), w(word), g(giant, 8 bytes);
         h, w and g may also be written in uppercase
       - Endianness letters: l or L (little endian), B (big endian);
         b means big endian only next to a lowercase l
   - ADDRESS is an expression for the memory address to examine:
     numbers and symbols joined by + and -

The specified number of objects of the specified size are printed in
hexadecimal, according to the specified byte order.

Default count is 1. Default size is w (word). Default endianness is the
native endianness of the target (see `endian`).";

const X_HELP: &str = "\
Examine memory in the target's own byte order.

Usage: x/FMT ADDRESS

FMT and ADDRESS are the same as for `box`; an endianness letter is accepted
and ignored.";

const ENDIAN_HELP: &str = "\
Show or set the target's byte order.

Usage: endian [auto|little|big]

With `auto`, an attached process uses this machine's byte order and a loaded
image uses the one in its header. Flat images loaded with `raw` have none.";

/// Print the help message
fn print_help(topic: Option<&str>) -> Result<()> {
    match topic {
        Some("box") => println!("{}", BOX_HELP),
        Some("x") => println!("{}", X_HELP),
        Some("endian") => println!("{}", ENDIAN_HELP),
        Some(other) => return Err(anyhow!("No help for '{}'", other)),
        None => print_overview(),
    }
    Ok(())
}

fn print_overview() {
    println!("{}", "boxamine Commands".bold().cyan());
    println!("{}", "═".repeat(50).cyan());

    println!("\n{}", "Examine:".bold().yellow());
    println!("  {}  Memory in a chosen byte order", "box/FMT <addr>".green());
    println!("  {}    Memory in the target's byte order", "x/FMT <addr>".green());
    println!("  {}  Show/set target byte order", "endian [mode]".green());

    println!("\n{}", "Targets:".bold().yellow());
    println!("  {}    Attach to a process", "attach <pid>".green());
    println!("  {}          Detach from the process", "detach".green());
    println!("  {}        Load an executable image", "o <path>".green());
    println!("  {} Load a flat image", "raw <path> [base]".green());
    println!("  {}            Show session status", "info".green());

    println!("\n{}", "Other:".bold().yellow());
    println!("  {}      Help for one command", "help <cmd>".green());
    println!("  {}               Show this help", "?".green());
    println!("  {}               Quit", "q".green());
}

/// Execute a parsed command
pub fn execute_command(session: &mut Session, cmd: AppCommand) -> Result<Flow> {
    match cmd {
        AppCommand::Box(args) => {
            let text = session.examine_converted(&args)?;
            print!("{}", text);
        }
        AppCommand::Examine(args) => {
            let text = session.examine_raw(&args)?;
            print!("{}", text);
        }
        AppCommand::Endian(None) => {
            println!("{}", session.describe_endian());
        }
        AppCommand::Endian(Some(setting)) => {
            session.endian = setting;
            log::debug!("endian set to {}", setting);
            println!("{}", session.describe_endian());
        }
        AppCommand::Attach(pid) => {
            session.debugger.attach(pid)?;
            println!("[*] Attached to process {}", pid);
        }
        AppCommand::Detach => {
            let pid = session.debugger.detach()?;
            println!("[*] Detached from process {}", pid);
        }
        AppCommand::LoadBinary(path) => {
            let binary = LoadedBinary::from_file(&path)?;
            println!("[*] Loaded {}", path);
            println!("{}", binary.summary());
            session.binary = Some(binary);
        }
        AppCommand::LoadRaw { path, base } => {
            let binary = LoadedBinary::raw_from_file(&path, base)?;
            println!(
                "[*] Loaded {} bytes from {} at {:#x}",
                binary.data.len(),
                path,
                base
            );
            session.binary = Some(binary);
        }
        AppCommand::Info => {
            print!("{}", session.describe());
        }
        AppCommand::Help(topic) => {
            print_help(topic.as_deref())?;
        }
        AppCommand::Quit => {
            println!("[*] Shutting down...");
            return Ok(Flow::Quit);
        }
        AppCommand::Unknown(input) => {
            return Err(anyhow!("Unknown command: '{}'. Type '?' for help", input));
        }
    }
    Ok(Flow::Continue)
}

/// Run commands non-interactively, stopping at the first failure
pub fn run_batch(session: &mut Session, commands: &[String]) -> Result<()> {
    for line in commands {
        log::debug!("batch: {}", line);
        let cmd = parse_command(line);
        if execute_command(session, cmd).map_err(|e| anyhow!("{}: {}", line, e))? == Flow::Quit {
            break;
        }
    }
    Ok(())
}

/// Run the CLI REPL
pub fn run_cli(session: &mut Session) -> Result<()> {
    let mut line_editor = Reedline::create();
    let mut prompt = BoxPrompt::new();
    prompt.update(session);

    println!(
        "{}",
        "╔══════════════════════════════════════════════════════════════╗".cyan()
    );
    println!(
        "{}",
        "║  boxamine - Type '?' for help, 'q' to quit                   ║".cyan()
    );
    println!(
        "{}",
        "╚══════════════════════════════════════════════════════════════╝".cyan()
    );

    loop {
        let sig = line_editor.read_line(&prompt)?;
        match sig {
            Signal::Success(buffer) => {
                let input = buffer.trim();
                if input.is_empty() {
                    continue;
                }

                let cmd = parse_command(input);
                match execute_command(session, cmd) {
                    Ok(Flow::Quit) => break,
                    Ok(Flow::Continue) => {}
                    Err(e) => println!("{} {}", "[!]".red(), e),
                }
                prompt.update(session);
            }
            Signal::CtrlD | Signal::CtrlC => {
                println!("\n[*] Interrupted");
                break;
            }
        }
    }

    Ok(())
}
