//! Normalized TD events.

/// One decoded event. `time` is the feed timestamp passed through as text; it
/// only matters for the timestamped line format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Train description moved between berths. `None` means "no berth".
    BerthTransition {
        from: Option<String>,
        to: Option<String>,
        describer: Option<String>,
        time: Option<String>,
    },
    /// Raw byte for one signalling address, kept as the two hex characters
    /// received from the feed.
    SignalByte {
        address: u32,
        value: String,
        time: Option<String>,
    },
    /// A refresh cycle begins (refresh run starting at address 0).
    RefreshStarted,
    /// A refresh cycle ended.
    RefreshFinished,
}

impl Event {
    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::BerthTransition { .. } => "berth",
            Event::SignalByte { .. } => "signal",
            Event::RefreshStarted => "refresh_started",
            Event::RefreshFinished => "refresh_finished",
        }
    }
}
