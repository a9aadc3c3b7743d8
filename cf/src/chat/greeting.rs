//! Session-start greeting

use std::io::{self, Write};
use std::time::Duration;

use chrono::{Local, Timelike};
use rand::seq::IndexedRandom;
use tracing::debug;

/// Decorative markers, one picked per greeting
pub const MARKERS: [&str; 7] = [
    "\u{1F60A}", // 😊
    "\u{1F31F}", // 🌟
    "\u{1F680}", // 🚀
    "\u{1F389}", // 🎉
    "\u{1F604}", // 😄
    "\u{1F916}", // 🤖
    "\u{2728}",  // ✨
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayPeriod {
    Morning,
    Afternoon,
    Evening,
}

impl DayPeriod {
    /// Band for a 0-23 hour: before 12, before 18, the rest
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            0..12 => Self::Morning,
            12..18 => Self::Afternoon,
            _ => Self::Evening,
        }
    }

    pub fn salutation(self) -> &'static str {
        match self {
            Self::Morning => "Good morning",
            Self::Afternoon => "Good afternoon",
            Self::Evening => "Good evening",
        }
    }
}

/// Greeting text for a given hour and marker
pub fn greeting_for(hour: u32, user_name: &str, marker: &str) -> String {
    format!("{}, {}! {}", DayPeriod::from_hour(hour).salutation(), user_name, marker)
}

/// Greeting for the local time with a random marker
pub fn greeting(user_name: &str) -> String {
    let hour = Local::now().hour();
    let marker = MARKERS.choose(&mut rand::rng()).copied().unwrap_or_default();
    debug!(hour, %marker, "greeting: called");
    greeting_for(hour, user_name, marker)
}

/// Write `message` one character at a time, then a newline
pub async fn slow_print<W: Write>(out: &mut W, message: &str, delay: Duration) -> io::Result<()> {
    for ch in message.chars() {
        write!(out, "{}", ch)?;
        out.flush()?;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
    writeln!(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_period_bands() {
        assert_eq!(DayPeriod::from_hour(0), DayPeriod::Morning);
        assert_eq!(DayPeriod::from_hour(11), DayPeriod::Morning);
        assert_eq!(DayPeriod::from_hour(12), DayPeriod::Afternoon);
        assert_eq!(DayPeriod::from_hour(17), DayPeriod::Afternoon);
        assert_eq!(DayPeriod::from_hour(18), DayPeriod::Evening);
        assert_eq!(DayPeriod::from_hour(23), DayPeriod::Evening);
    }

    #[test]
    fn test_greeting_format() {
        assert_eq!(greeting_for(9, "Armaan", "\u{2728}"), "Good morning, Armaan! \u{2728}");
        assert_eq!(greeting_for(14, "Armaan", "x"), "Good afternoon, Armaan! x");
        assert_eq!(greeting_for(20, "friend", "x"), "Good evening, friend! x");
    }

    #[test]
    fn test_greeting_uses_known_marker() {
        let text = greeting("friend");
        assert!(text.contains(", friend! "));
        assert!(MARKERS.iter().any(|m| text.ends_with(m)));
    }

    #[tokio::test]
    async fn test_slow_print_writes_whole_message() {
        let mut out = Vec::new();
        slow_print(&mut out, "Hi \u{1F680}", Duration::ZERO).await.unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "Hi \u{1F680}\n");
    }
}
