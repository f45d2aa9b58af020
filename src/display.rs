//! Two-line, 16-column screen model and the message catalogue.
//!
//! The core never renders anything itself.  It builds a [`Screen`] and
//! pushes it through [`DisplaySink`](crate::app::ports::DisplaySink);
//! whatever sits behind the port (character LCD, serial log) decides how
//! to draw it.  Lines longer than the panel are truncated, never wrapped.

use core::fmt::{self, Write};

/// Characters per line on the target panel.
pub const LINE_WIDTH: usize = 16;

/// One display line.
pub type Line = heapless::String<LINE_WIDTH>;

/// Format into a [`Line`], dropping whatever does not fit.
pub fn line(args: fmt::Arguments<'_>) -> Line {
    let mut out = Line::new();
    // The truncating writer never reports an error.
    let _ = Truncate(&mut out).write_fmt(args);
    out
}

struct Truncate<'a>(&'a mut Line);

impl Write for Truncate<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for c in s.chars() {
            if self.0.push(c).is_err() {
                break;
            }
        }
        Ok(())
    }
}

/// Full contents of the panel.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Screen {
    pub top: Line,
    pub bottom: Line,
}

impl Screen {
    pub fn new(top: &str, bottom: &str) -> Self {
        Self {
            top: line(format_args!("{top}")),
            bottom: line(format_args!("{bottom}")),
        }
    }

    /// Idle prompt, shown whenever the loop re-arms scanning.
    pub fn scan_prompt() -> Self {
        Self::new("Scan your", "card")
    }

    pub fn enrolled() -> Self {
        Self::new("Card", "enrolled")
    }

    pub fn access_granted() -> Self {
        Self::new("Access granted", "")
    }

    pub fn access_denied() -> Self {
        Self::new("Access denied", "")
    }

    /// Presence countdown, `remaining_secs` left in the wait budget.
    pub fn place_hand(remaining_secs: u32) -> Self {
        Self {
            top: line(format_args!("Place your hand")),
            bottom: line(format_args!("Wait: {remaining_secs} sec")),
        }
    }

    /// Instantaneous flow, displayed in mL/s.
    pub fn flow_rate(rate_lps: f32) -> Self {
        Self {
            top: line(format_args!("Flow: {:.0} mL/s", rate_lps * 1000.0)),
            bottom: Line::new(),
        }
    }

    /// End-of-session total, displayed in mL.
    pub fn total(liters: f32) -> Self {
        Self {
            top: Line::new(),
            bottom: line(format_args!("Total: {:.0} mL", liters * 1000.0)),
        }
    }

    pub fn reader_fault() -> Self {
        Self::new("Reader error", "try again")
    }

    pub fn valve_fault() -> Self {
        Self::new("Valve error", "no water")
    }
}
