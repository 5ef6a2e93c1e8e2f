//! Voice input (speech-to-text) and output (text-to-speech).
//!
//! Both sides are wrapped as independent, cancelable services driven by
//! external commands: capture runs a configured transcriber, playback runs a
//! synthesizer found on PATH (or configured explicitly). Capability is
//! resolved once at startup; a missing command simply means the feature is
//! absent and its controls no-op.

pub mod capture;
pub mod playback;

pub use capture::{CaptureEvent, CaptureService};
pub use playback::{PlaybackEvent, PlaybackRequest, PlaybackService};

/// A program plus fixed leading arguments, parsed from a config string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn parse(raw: &str) -> Option<Self> {
        let mut parts = raw.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }
}

/// Synthesizers probed for on PATH, in preference order. `say` ships with
/// macOS; the rest are common Linux packages. `spd-say` needs `-w` to block
/// until playback finishes.
const SYNTHESIZER_CANDIDATES: &[(&str, &[&str])] = &[
    ("say", &[]),
    ("espeak-ng", &[]),
    ("espeak", &[]),
    ("spd-say", &["-w"]),
];

/// Resolve the playback command once at startup: the configured override if
/// any, otherwise the first candidate present on PATH.
pub fn resolve_synthesizer(configured: Option<&str>) -> Option<CommandSpec> {
    if let Some(raw) = configured {
        return CommandSpec::parse(raw);
    }
    SYNTHESIZER_CANDIDATES
        .iter()
        .find(|(program, _)| find_on_path(program))
        .map(|(program, args)| CommandSpec {
            program: (*program).to_string(),
            args: args.iter().map(|a| (*a).to_string()).collect(),
        })
}

fn find_on_path(program: &str) -> bool {
    let Some(paths) = std::env::var_os("PATH") else {
        return false;
    };
    std::env::split_paths(&paths).any(|dir| dir.join(program).is_file())
}
