use std::time::{Duration, Instant};

/// Characters of a status message that fit on screen.
pub const SCREEN_MESSAGE_LIMIT: usize = 20;

pub const DEFAULT_MESSAGE_DURATION: Duration = Duration::from_millis(3000);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ShowSpeed {
    #[default]
    Off,
    /// `"100%"`
    Percent,
    /// `"100%(2, 20 fps)"`: speed, frame-skip level and rendered frames.
    Detailed,
}

/// First [`SCREEN_MESSAGE_LIMIT`] characters of `text`.
pub fn truncate_message(text: &str) -> &str {
    match text.char_indices().nth(SCREEN_MESSAGE_LIMIT) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

pub fn speed_text(mode: ShowSpeed, speed: u32, frame_skip: u8, rendered: u32) -> Option<String> {
    match mode {
        ShowSpeed::Off => None,
        ShowSpeed::Percent => Some(format!("{speed}%")),
        ShowSpeed::Detailed => Some(format!("{speed:3}%({frame_skip}, {rendered} fps)")),
    }
}

/// Window title carrying the speed readout, e.g. `"gbahost - 100%"`.
pub fn title_text(app: &str, mode: ShowSpeed, speed: u32, frame_skip: u8, rendered: u32) -> String {
    match speed_text(mode, speed, frame_skip, rendered) {
        Some(readout) => format!("{app} - {readout}"),
        None => app.to_string(),
    }
}

/// The single transient message drawn over the picture.
#[derive(Clone, Debug)]
pub struct StatusBoard {
    text: String,
    posted_at: Option<Instant>,
    duration: Duration,
    enabled: bool,
}

impl StatusBoard {
    pub fn new(duration: Duration, enabled: bool) -> Self {
        Self {
            text: String::new(),
            posted_at: None,
            duration,
            enabled,
        }
    }

    /// Replace the current message. Only the on-screen copy is truncated.
    pub fn post(&mut self, text: &str, now: Instant) {
        self.text.clear();
        self.text.push_str(truncate_message(text));
        self.posted_at = Some(now);
    }

    /// Message to draw at `now`, if any. Expired messages are dropped.
    pub fn visible(&mut self, now: Instant) -> Option<&str> {
        let posted = self.posted_at?;
        if !self.enabled || now.saturating_duration_since(posted) >= self.duration {
            self.posted_at = None;
            return None;
        }
        Some(&self.text)
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }
}

impl Default for StatusBoard {
    fn default() -> Self {
        Self::new(DEFAULT_MESSAGE_DURATION, true)
    }
}
