//! Minute-of-hour labels for work interval announcements
//!
//! Purely cosmetic: scheduling always uses elapsed seconds.

/// Start and end labels for a work interval
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkWindow {
    pub start: String,
    pub end: String,
    /// The interval ends in the following hour
    pub overflow: bool,
}

impl WorkWindow {
    /// Compute labels for an interval of `work_minutes` starting at `minute`
    pub fn new(minute: u32, work_minutes: u32) -> Self {
        let minute = minute % 60;
        let end_minute = (minute + work_minutes) % 60;
        let overflow = end_minute < minute;

        let end = if overflow {
            format!("{} of the next hour", minute_label(end_minute))
        } else {
            minute_label(end_minute)
        };

        Self {
            start: minute_label(minute),
            end,
            overflow,
        }
    }

    pub fn announcement(&self) -> String {
        format!("Pomodoro starts at {} and ends at {}.", self.start, self.end)
    }
}

/// ":07" style label, zero-padded below ten
pub fn minute_label(minute: u32) -> String {
    format!(":{minute:02}")
}
