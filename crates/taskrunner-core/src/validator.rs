use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

pub const MAX_COMMAND_LEN: usize = 256;

/// Whitespace is the ASCII set only.
static ALLOWED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^[a-zA-Z0-9[:space:]._/+:='",!\-]*$"#).expect("allow-list pattern compiles")
});

/// Checked in order; the first hit is reported.
pub const BANNED_TOKENS: &[&str] = &[
    "rm", "sudo", "chmod", "chown", "mkfs", "dd", "kill", "pkill", "reboot", "shutdown", "halt",
    "init", "telnet", "nc", "netcat", "curl", "wget", "scp", "ssh", ">", "<", "|", ";", "&&",
    "||", "`", "$((", "&",
];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Command must not be blank")]
    Blank,

    #[error("Command too long ({len} chars, max {max})", max = MAX_COMMAND_LEN)]
    TooLong { len: usize },

    #[error("Command contains disallowed characters")]
    DisallowedCharacters,

    #[error("Command contains banned token: {0}")]
    BannedToken(&'static str),
}

/// Heuristic gate run before a command is stored or executed.
///
/// It rejects the obvious escalation and injection shapes (shell operators,
/// destructive binaries, network tools). It is not a sandbox: a command that
/// passes can still do damage inside whatever environment runs it.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandValidator;

impl CommandValidator {
    pub fn new() -> Self {
        Self
    }

    pub fn validate(&self, command: &str) -> Result<(), ValidationError> {
        if command.trim().is_empty() {
            return Err(ValidationError::Blank);
        }

        let len = command.chars().count();
        if len > MAX_COMMAND_LEN {
            return Err(ValidationError::TooLong { len });
        }

        if !ALLOWED.is_match(command) {
            return Err(ValidationError::DisallowedCharacters);
        }

        let lowered = command.to_lowercase();
        match BANNED_TOKENS.iter().find(|token| lowered.contains(*token)) {
            Some(token) => Err(ValidationError::BannedToken(*token)),
            None => Ok(()),
        }
    }
}
