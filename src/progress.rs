//! Import progress reporting.
//!
//! Reports observable progress during `wps import` so users see how many
//! dump pairs have been read out of the expected total and which
//! post-load phase is running. Progress is emitted on **stderr** so stdout
//! remains parseable for scripts.

use std::io::Write;

/// A single progress event for an import.
#[derive(Clone, Debug)]
pub enum ImportProgressEvent {
    /// `n` dump pairs read out of an expected `total`.
    Reading { n: u64, total: u64 },
    /// Deleting redirects whose destination was never inserted.
    Pruning,
    /// Reclaiming storage space.
    Compacting,
}

/// Reports import progress. Implementations write to stderr (human or JSON).
pub trait ImportProgressReporter: Send + Sync {
    /// Emit a progress event. Called from the import pipeline.
    fn report(&self, event: ImportProgressEvent);
}

/// Human-friendly progress on stderr: "import  reading  12,000 / 1,097,153 pairs (1%)".
pub struct StderrProgress;

impl ImportProgressReporter for StderrProgress {
    fn report(&self, event: ImportProgressEvent) {
        let line = match &event {
            ImportProgressEvent::Reading { n, total } => {
                format!(
                    "import  reading  {} / {} pairs ({}%)\n",
                    format_number(*n),
                    format_number(*total),
                    percent(*n, *total)
                )
            }
            ImportProgressEvent::Pruning => "import  pruning dangling redirects...\n".to_string(),
            ImportProgressEvent::Compacting => "import  compacting database...\n".to_string(),
        };
        let _ = std::io::stderr().lock().write_all(line.as_bytes());
        let _ = std::io::stderr().lock().flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl ImportProgressReporter for JsonProgress {
    fn report(&self, event: ImportProgressEvent) {
        let obj = match &event {
            ImportProgressEvent::Reading { n, total } => serde_json::json!({
                "event": "progress",
                "phase": "reading",
                "n": n,
                "total": total
            }),
            ImportProgressEvent::Pruning => serde_json::json!({
                "event": "progress",
                "phase": "pruning"
            }),
            ImportProgressEvent::Compacting => serde_json::json!({
                "event": "progress",
                "phase": "compacting"
            }),
        };
        if let Ok(line) = serde_json::to_string(&obj) {
            let _ = writeln!(std::io::stderr().lock(), "{}", line);
            let _ = std::io::stderr().lock().flush();
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl ImportProgressReporter for NoProgress {
    fn report(&self, _event: ImportProgressEvent) {}
}

fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + (s.len() - 1) / 3);
    let chars: Vec<char> = s.chars().rev().collect();
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(*c);
    }
    result.chars().rev().collect()
}

/// Dumps can hold more pairs than expected; cap the display at 100%.
fn percent(n: u64, total: u64) -> u64 {
    if total == 0 {
        return 100;
    }
    (n.saturating_mul(100) / total).min(100)
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    /// Build a reporter for this mode. Caller can pass it to the importer.
    pub fn reporter(&self) -> Box<dyn ImportProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}
