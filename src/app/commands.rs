//! Command processing
//!
//! Turns one line of user input into an [`AppCommand`].

use super::state::EndianSetting;

/// Application commands that can be executed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    /// Examine memory in a chosen byte order: box[/FMT] ADDR
    Box(String),
    /// Examine memory in the target's byte order: x[/FMT] ADDR
    Examine(String),
    /// Show (None) or change the endianness setting
    Endian(Option<EndianSetting>),
    /// Attach to a live process
    Attach(u32),
    /// Detach from the live process
    Detach,
    /// Load an executable image
    LoadBinary(String),
    /// Load a flat memory image at a base address
    LoadRaw { path: String, base: u64 },
    /// Show session status
    Info,
    /// Show help, optionally for one command
    Help(Option<String>),
    /// Quit application
    Quit,
    /// Unknown command
    Unknown(String),
}

/// Parse a command string into AppCommand
pub fn parse_command(input: &str) -> AppCommand {
    let input = input.trim();

    // `box/4hl addr` glues the format token to the command name
    let split = input
        .find(|c: char| c == '/' || c.is_whitespace())
        .unwrap_or(input.len());
    let (cmd, rest) = input.split_at(split);
    let arg = Some(rest.trim()).filter(|s| !s.is_empty());

    if rest.starts_with('/') && !matches!(cmd, "box" | "x") {
        return AppCommand::Unknown(input.to_string());
    }

    match cmd {
        "box" => AppCommand::Box(rest.to_string()),
        "x" => AppCommand::Examine(rest.to_string()),
        "endian" => match arg {
            None => AppCommand::Endian(None),
            Some(value) => match EndianSetting::parse(value) {
                Some(setting) => AppCommand::Endian(Some(setting)),
                None => AppCommand::Unknown(format!("endian expects auto, little or big, not '{}'", value)),
            },
        },
        "attach" => match arg.and_then(|s| s.parse().ok()) {
            Some(pid) => AppCommand::Attach(pid),
            None => AppCommand::Unknown("attach requires a process id".into()),
        },
        "detach" => AppCommand::Detach,
        "load" | "open" | "o" => {
            if let Some(path) = arg {
                AppCommand::LoadBinary(path.to_string())
            } else {
                AppCommand::Unknown("load requires a path".into())
            }
        }
        "raw" => {
            let mut parts = arg.unwrap_or("").split_whitespace();
            match (parts.next(), parts.next(), parts.next()) {
                (Some(path), None, None) => AppCommand::LoadRaw {
                    path: path.to_string(),
                    base: 0,
                },
                (Some(path), Some(base), None) => match parse_address(base) {
                    Some(base) => AppCommand::LoadRaw {
                        path: path.to_string(),
                        base,
                    },
                    None => AppCommand::Unknown("Invalid address".into()),
                },
                _ => AppCommand::Unknown("raw requires a path and an optional base address".into()),
            }
        }
        "info" => AppCommand::Info,
        "help" | "?" => AppCommand::Help(arg.map(str::to_string)),
        "quit" | "exit" | "q" => AppCommand::Quit,
        _ => AppCommand::Unknown(input.to_string()),
    }
}

/// Parse an address from hex or decimal string
pub fn parse_address(s: &str) -> Option<u64> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).ok()
    } else {
        s.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_with_glued_format() {
        assert_eq!(
            parse_command("box/4hl  $sp"),
            AppCommand::Box("/4hl  $sp".into())
        );
        assert_eq!(parse_command("box main"), AppCommand::Box(" main".into()));
        assert_eq!(parse_command("x/2g 0x10"), AppCommand::Examine("/2g 0x10".into()));
    }

    #[test]
    fn test_box_without_args_still_dispatches() {
        // The examine path reports the missing address itself
        assert_eq!(parse_command("box"), AppCommand::Box(String::new()));
    }

    #[test]
    fn test_endian() {
        assert_eq!(parse_command("endian"), AppCommand::Endian(None));
        assert_eq!(
            parse_command("endian big"),
            AppCommand::Endian(Some(EndianSetting::Big))
        );
        assert!(matches!(parse_command("endian pdp"), AppCommand::Unknown(_)));
    }

    #[test]
    fn test_attach_and_load() {
        assert_eq!(parse_command("attach 1234"), AppCommand::Attach(1234));
        assert!(matches!(parse_command("attach me"), AppCommand::Unknown(_)));
        assert_eq!(
            parse_command("o /bin/ls"),
            AppCommand::LoadBinary("/bin/ls".into())
        );
        assert_eq!(
            parse_command("raw dump.bin 0x8000"),
            AppCommand::LoadRaw {
                path: "dump.bin".into(),
                base: 0x8000
            }
        );
        assert_eq!(
            parse_command("raw dump.bin"),
            AppCommand::LoadRaw {
                path: "dump.bin".into(),
                base: 0
            }
        );
    }

    #[test]
    fn test_format_on_other_command() {
        assert!(matches!(parse_command("info/4w"), AppCommand::Unknown(_)));
    }

    #[test]
    fn test_help() {
        assert_eq!(parse_command("?"), AppCommand::Help(None));
        assert_eq!(parse_command("help box"), AppCommand::Help(Some("box".into())));
    }

    #[test]
    fn test_parse_address() {
        assert_eq!(parse_address("0x1000"), Some(0x1000));
        assert_eq!(parse_address("4096"), Some(4096));
        assert_eq!(parse_address("zz"), None);
    }
}
