//! Text formatting shared by command replies.

use crate::audio::AudioTrack;
use std::time::Duration;

/// `mm:ss`, or `hh:mm:ss` from one hour up.
pub fn clock(duration: Duration) -> String {
    let total = duration.as_secs();
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    if h > 0 {
        format!("{h:02}:{m:02}:{s:02}")
    } else {
        format!("{m:02}:{s:02}")
    }
}

/// `**1**d **2**h **3**min **4**s`
pub fn uptime(duration: Duration) -> String {
    let total = duration.as_secs();
    format!(
        "**{}**d **{}**h **{}**min **{}**s",
        total / 86_400,
        (total % 86_400) / 3600,
        (total % 3600) / 60,
        total % 60
    )
}

/// Track title with its length; streams show `LIVE`.
pub fn track_line(track: &AudioTrack) -> String {
    let length = if track.info().is_stream {
        "LIVE".to_owned()
    } else {
        clock(track.length())
    };
    format!("**{}** ({})", track.title(), length)
}

/// Numbered list, one track per line, starting at 1.
pub fn numbered(tracks: &[AudioTrack]) -> String {
    tracks
        .iter()
        .enumerate()
        .map(|(i, t)| format!("{}. {}", i + 1, track_line(t)))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_switches_to_hours() {
        assert_eq!(clock(Duration::from_secs(0)), "00:00");
        assert_eq!(clock(Duration::from_secs(212)), "03:32");
        assert_eq!(clock(Duration::from_secs(3600 + 61)), "01:01:01");
    }

    #[test]
    fn uptime_breakdown() {
        assert_eq!(
            uptime(Duration::from_secs(86_400 + 2 * 3600 + 3 * 60 + 4)),
            "**1**d **2**h **3**min **4**s"
        );
    }
}
