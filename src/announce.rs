//! Hourly time announcements
//!
//! A background task queues "The time now is ..." at the top of each hour.
//! The session speaks queued lines between cycles so they never overlap other
//! speech.

use std::time::Duration;

use chrono::{Local, NaiveTime, Timelike};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Time left until the next full hour
#[must_use]
pub fn until_next_hour(now: NaiveTime) -> Duration {
    let elapsed = u64::from(now.minute()) * 60 + u64::from(now.second());
    let remaining = Duration::from_secs(3600 - elapsed);
    remaining.saturating_sub(Duration::from_nanos(u64::from(now.nanosecond() % 1_000_000_000)))
}

/// Announcement text for `now`
#[must_use]
pub fn announcement(now: NaiveTime) -> String {
    format!("The time now is {}", now.format("%I:%M %p"))
}

/// Queue an announcement every hour on the hour
///
/// The task ends when the receiving side is dropped.
pub fn spawn_announcer(tx: mpsc::Sender<String>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let wait = until_next_hour(Local::now().time());
            tokio::time::sleep(wait).await;

            let line = announcement(Local::now().time());
            tracing::debug!(%line, "hourly announcement");
            if tx.send(line).await.is_err() {
                tracing::debug!("announcement receiver gone, stopping");
                break;
            }
            // stay clear of the hour boundary we just announced
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(h: u32, m: u32, s: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, s).unwrap()
    }

    #[test]
    fn waits_for_the_top_of_the_hour() {
        assert_eq!(until_next_hour(at(9, 0, 0)), Duration::from_secs(3600));
        assert_eq!(until_next_hour(at(9, 59, 30)), Duration::from_secs(30));
        assert_eq!(until_next_hour(at(23, 15, 0)), Duration::from_secs(45 * 60));
    }

    #[test]
    fn announcement_uses_twelve_hour_clock() {
        assert_eq!(announcement(at(15, 0, 0)), "The time now is 03:00 PM");
        assert_eq!(announcement(at(9, 0, 2)), "The time now is 09:00 AM");
    }
}
