// Error taxonomy. These are diagnostics, not exceptions: the
// hot fetch/execute path never returns a Result, it emits one of these
// through `Mcu::verbose` as a side channel. `Result`/`?` are reserved for
// the outer layers (file loading, CLI parsing, xref-file parsing) where a
// failure should stop the program before the core starts running.

use thiserror::Error;

bitflags::bitflags! {
    #[derive(Default)]
    pub struct VerboseType: u8 {
        const PROG_ERROR = 1 << 0;
        const DATA_ERROR = 1 << 1;
        const EEPROM     = 1 << 2;
        const NOT_IMPL   = 1 << 3;
        const ALL = Self::PROG_ERROR.bits() | Self::DATA_ERROR.bits() | Self::EEPROM.bits() | Self::NOT_IMPL.bits();
    }
}

#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub kind: VerboseType,
    pub text: String,
}

impl Diagnostic {
    pub fn new(kind: VerboseType, text: impl Into<String>) -> Self {
        Diagnostic { kind, text: text.into() }
    }
}

/// Errors that stop the program before the core starts running: CLI
/// argument problems, unknown chip names, unreadable files. Unlike
/// `Diagnostic`, these do cross an API boundary as a real `Result` error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown MCU type \"{0}\"")]
    UnknownMcu(String),
    #[error("failed to read \"{path}\": {source}")]
    ReadFailed { path: String, #[source] source: std::io::Error },
    #[error("malformed xref line: \"{0}\"")]
    BadXrefLine(String),
}
