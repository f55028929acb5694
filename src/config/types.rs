//! Configuration types.

use serde::{Deserialize, Serialize};

use crate::process::ProcSig;

/// Which grammar the control console parses.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CommandSyntax {
    /// Chunk-safe tokenizer and command assembler.
    #[default]
    Tokens,
    /// One command per line, parsed with regular expressions.
    Simple,
}

/// Input event record decoding.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordConfig {
    /// Byte order of the type, code and value fields.
    pub little_endian: bool,
}

impl Default for RecordConfig {
    fn default() -> Self {
        Self {
            little_endian: true,
        }
    }
}

/// Control console behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub syntax: CommandSyntax,
    /// Exit code used when input ends, or for `exit` without an argument.
    pub default_exit_code: i32,
    /// Signal the `kill` command broadcasts to the group.
    pub kill_signal: ProcSig,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            syntax: CommandSyntax::default(),
            default_exit_code: 0,
            kill_signal: ProcSig::SigKill,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub records: RecordConfig,
    pub console: ConsoleConfig,
}
