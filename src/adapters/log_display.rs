//! Display adapter that mirrors the two-line panel to the log.

use log::info;

use crate::app::ports::DisplaySink;
use crate::display::Screen;

#[derive(Default)]
pub struct LogDisplay {
    last: Option<Screen>,
}

impl LogDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// The screen currently shown, if any.
    pub fn current(&self) -> Option<&Screen> {
        self.last.as_ref()
    }
}

impl DisplaySink for LogDisplay {
    fn show(&mut self, screen: &Screen) {
        // Countdown redraws repeat the same screen; log changes only.
        if self.last.as_ref() == Some(screen) {
            return;
        }
        info!("LCD | {:<16} | {:<16}", screen.top.as_str(), screen.bottom.as_str());
        self.last = Some(screen.clone());
    }
}
