use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

/// Optional transcript log: each exchanged message appended to a file as
/// `Speaker: text`, with a blank line between messages.
pub struct TranscriptLog {
    path: Option<PathBuf>,
}

impl TranscriptLog {
    /// Enable logging to `path`, verifying the file is writable up front.
    pub fn new(path: PathBuf) -> Result<Self, std::io::Error> {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)?
            .flush()?;
        Ok(Self { path: Some(path) })
    }

    pub fn disabled() -> Self {
        Self { path: None }
    }

    pub fn is_active(&self) -> bool {
        self.path.is_some()
    }

    pub fn log_message(&self, speaker: &str, text: &str) -> Result<(), std::io::Error> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{speaker}: {text}")?;
        writeln!(file)?;
        file.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_log_accepts_messages_silently() {
        let log = TranscriptLog::disabled();
        assert!(!log.is_active());
        assert!(log.log_message("You", "anything").is_ok());
    }

    #[test]
    fn active_log_appends_speaker_prefixed_lines() {
        let path = std::env::temp_dir().join(format!(
            "astroguide-transcript-test-{}.log",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);

        let log = TranscriptLog::new(path.clone()).unwrap();
        log.log_message("You", "Plan a Mars trip").unwrap();
        log.log_message("Guide", "Pack light.").unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "You: Plan a Mars trip\n\nGuide: Pack light.\n\n");
        let _ = std::fs::remove_file(&path);
    }
}
