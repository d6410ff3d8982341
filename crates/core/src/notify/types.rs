//! Per-user, per-event delivery preferences.

use chrono::{DateTime, Duration, DurationRound, Utc};
use serde::{Deserialize, Serialize};

/// How often notifications for an event are delivered to a user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    /// Delivered as soon as the event fires.
    #[default]
    Immediate,
    /// Batched and delivered at the top of the next hour.
    Hourly,
    /// Batched and delivered at the next midnight (UTC).
    Daily,
    /// Batched and delivered at the start of the next ISO week.
    Weekly,
}

impl Frequency {
    /// Parses the stored lowercase form.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "immediate" => Some(Self::Immediate),
            "hourly" => Some(Self::Hourly),
            "daily" => Some(Self::Daily),
            "weekly" => Some(Self::Weekly),
            _ => None,
        }
    }

    /// The stored lowercase form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Immediate => "immediate",
            Self::Hourly => "hourly",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
        }
    }

    /// The next delivery boundary at or after `now`.
    ///
    /// Batched frequencies align to the next whole hour, midnight, or start
    /// of ISO week; `Immediate` returns `now` unchanged.
    #[must_use]
    pub fn next_delivery(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Self::Immediate => now,
            Self::Hourly => align_up(now, Duration::hours(1)),
            Self::Daily => align_up(now, Duration::days(1)),
            Self::Weekly => {
                // duration_trunc on weeks aligns to the Unix epoch, a
                // Thursday; walk day boundaries to the next Monday instead.
                let mut boundary = align_up(now, Duration::days(1));
                while boundary.format("%u").to_string() != "1" {
                    boundary += Duration::days(1);
                }
                boundary
            }
        }
    }

    /// Whether deliveries are held for a batch window.
    #[must_use]
    pub const fn is_batched(&self) -> bool {
        !matches!(self, Self::Immediate)
    }
}

fn align_up(now: DateTime<Utc>, unit: Duration) -> DateTime<Utc> {
    let floor = now.duration_trunc(unit).unwrap_or(now);
    if floor == now {
        now
    } else {
        floor + unit
    }
}

/// Which channels an event notifies a user on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channels {
    /// Persisted in-app notification row.
    pub in_app: bool,
    /// Outbound email.
    pub email: bool,
    /// Push. No transport exists yet; delivery falls back to the in-app
    /// inbox so a push-only setting is not silently muted.
    pub push: bool,
}

impl Default for Channels {
    fn default() -> Self {
        Self {
            in_app: true,
            email: false,
            push: false,
        }
    }
}

impl Channels {
    /// True when no channel is enabled; the event is dropped for this user.
    #[must_use]
    pub const fn is_muted(&self) -> bool {
        !self.in_app && !self.email && !self.push
    }

    /// True when delivery should write an inbox row. Push counts until it
    /// has a transport of its own.
    #[must_use]
    pub const fn wants_inbox(&self) -> bool {
        self.in_app || self.push
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[rstest]
    #[case("immediate", Frequency::Immediate)]
    #[case("hourly", Frequency::Hourly)]
    #[case("daily", Frequency::Daily)]
    #[case("weekly", Frequency::Weekly)]
    fn test_parse_round_trips(#[case] s: &str, #[case] freq: Frequency) {
        assert_eq!(Frequency::parse(s), Some(freq));
        assert_eq!(freq.as_str(), s);
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert_eq!(Frequency::parse("fortnightly"), None);
    }

    #[test]
    fn test_immediate_delivers_now() {
        let now = at(2025, 3, 14, 9, 26);
        assert_eq!(Frequency::Immediate.next_delivery(now), now);
    }

    #[test]
    fn test_hourly_aligns_to_next_hour() {
        let now = at(2025, 3, 14, 9, 26);
        assert_eq!(Frequency::Hourly.next_delivery(now), at(2025, 3, 14, 10, 0));
        // Already on the boundary: deliver now, not an hour later.
        let boundary = at(2025, 3, 14, 10, 0);
        assert_eq!(Frequency::Hourly.next_delivery(boundary), boundary);
    }

    #[test]
    fn test_daily_aligns_to_midnight() {
        let now = at(2025, 3, 14, 9, 26);
        assert_eq!(Frequency::Daily.next_delivery(now), at(2025, 3, 15, 0, 0));
    }

    #[test]
    fn test_weekly_aligns_to_monday() {
        // 2025-03-14 is a Friday; next Monday is the 17th.
        let now = at(2025, 3, 14, 9, 26);
        assert_eq!(Frequency::Weekly.next_delivery(now), at(2025, 3, 17, 0, 0));
    }

    #[test]
    fn test_channels_muted() {
        assert!(!Channels::default().is_muted());
        let muted = Channels {
            in_app: false,
            email: false,
            push: false,
        };
        assert!(muted.is_muted());
    }

    #[test]
    fn test_push_only_is_not_muted_and_uses_inbox() {
        let push_only = Channels {
            in_app: false,
            email: false,
            push: true,
        };
        assert!(!push_only.is_muted());
        assert!(push_only.wants_inbox());
    }

    #[test]
    fn test_email_only_skips_inbox() {
        let email_only = Channels {
            in_app: false,
            email: true,
            push: false,
        };
        assert!(!email_only.is_muted());
        assert!(!email_only.wants_inbox());
    }
}
