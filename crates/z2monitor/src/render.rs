//! Dashboard Layout
//!
//! Builds styled text lines from a ranked event list. Painting them onto the
//! terminal is left to [`crate::terminal`].

use event_engine::{Event, Severity};

const TITLE: &str = "Z2monitor Dashboard";
const UPDATED: &str = "Last updated: ";
/// Width of the clock column in the header
const CLOCK_WIDTH: usize = 8;

/// How a piece of text is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Plain,
    Header,
    Severity(Severity),
    Acknowledged,
    Unacknowledged,
    Error,
}

/// A run of text drawn in one tone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub tone: Tone,
}

impl Segment {
    pub fn new(text: impl Into<String>, tone: Tone) -> Self {
        Self {
            text: text.into(),
            tone,
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, Tone::Plain)
    }
}

pub type Line = Vec<Segment>;

/// Text of a line without styling
pub fn line_text(line: &[Segment]) -> String {
    line.iter().map(|segment| segment.text.as_str()).collect()
}

/// Terminal geometry and labels for one frame
#[derive(Debug, Clone)]
pub struct Frame<'a> {
    /// Wall-clock time shown in the header, e.g. `14:03:59`
    pub clock: &'a str,
    pub width: u16,
    pub height: u16,
    /// Frontend address shown when nothing is active
    pub frontend_url: &'a str,
    pub refresh_secs: u64,
}

/// Header line spanning the terminal width
pub fn header(frame: &Frame<'_>) -> Line {
    let used = UPDATED.len() + CLOCK_WIDTH + TITLE.len();
    let padding = (frame.width as usize).saturating_sub(used);
    vec![Segment::new(
        format!(
            "{}{:>clock$}{:padding$}{}",
            UPDATED,
            frame.clock,
            "",
            TITLE,
            clock = CLOCK_WIDTH,
            padding = padding
        ),
        Tone::Header,
    )]
}

/// One event row: age, padded host, padded description, ack flag
fn event_line(event: &Event, host_width: usize, desc_width: usize) -> Line {
    let (flag, tone) = if event.acknowledged {
        ("Y", Tone::Acknowledged)
    } else {
        ("N", Tone::Unacknowledged)
    };
    vec![
        Segment::plain(format!(
            "{} {:<width$} ",
            event.age,
            event.hostname,
            width = host_width
        )),
        Segment::new(
            format!("{:<width$}", event.description, width = desc_width),
            Tone::Severity(event.severity),
        ),
        Segment::plain(" "),
        Segment::new(flag, tone),
    ]
}

fn event_lines(events: &[Event]) -> impl Iterator<Item = Line> + '_ {
    let host_width = events
        .iter()
        .map(|e| e.hostname.chars().count())
        .max()
        .unwrap_or(0);
    let desc_width = events
        .iter()
        .map(|e| e.description.chars().count())
        .max()
        .unwrap_or(0);
    events
        .iter()
        .map(move |event| event_line(event, host_width, desc_width))
}

/// Notice shown when the server reports no active triggers
pub fn empty_notice(frame: &Frame<'_>) -> Vec<Line> {
    [
        String::new(),
        "The API calls returned 0 results. Either your servers are very happy, or Z2monitor is not working correctly.".to_string(),
        String::new(),
        format!("Please check your dashboard at {} to verify activity.", frame.frontend_url),
        String::new(),
        format!(
            "Z2monitor will continue to refresh every {} seconds unless you interrupt it.",
            frame.refresh_secs
        ),
    ]
    .into_iter()
    .map(|text| vec![Segment::plain(text)])
    .collect()
}

/// Full dashboard frame, cut to the terminal height
///
/// One row is kept free so the cursor does not scroll the header away.
pub fn dashboard(events: &[Event], frame: &Frame<'_>) -> Vec<Line> {
    let max_lines = (frame.height as usize).saturating_sub(1).max(1);
    let mut lines = vec![header(frame)];

    if events.is_empty() {
        lines.extend(empty_notice(frame));
    } else {
        lines.extend(event_lines(events));
    }
    lines.truncate(max_lines);
    lines
}

/// Every event, no header and no height limit
pub fn full_list(events: &[Event]) -> Vec<Line> {
    event_lines(events).collect()
}

/// Frame shown after a failed poll cycle
pub fn failure(frame: &Frame<'_>, error: &str, attempt: u32, max_attempts: u32) -> Vec<Line> {
    vec![
        header(frame),
        Vec::new(),
        vec![Segment::new(
            format!("Update failed ({}/{}): {}", attempt, max_attempts, error),
            Tone::Error,
        )],
        vec![Segment::plain(format!(
            "Retrying in {} seconds.",
            frame.refresh_secs
        ))],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(id: u64, severity: u8, host: &str, description: &str, acknowledged: bool) -> Event {
        Event {
            id,
            occurred_at: 0,
            age: "  5m".to_string(),
            severity: Severity::new(severity),
            hostname: host.to_string(),
            description: description.to_string(),
            acknowledged,
            ack_event_id: None,
        }
    }

    fn frame(height: u16) -> Frame<'static> {
        Frame {
            clock: "14:03:59",
            width: 80,
            height,
            frontend_url: "https://zabbix.example.com",
            refresh_secs: 10,
        }
    }

    fn texts(lines: &[Line]) -> Vec<String> {
        lines.iter().map(|line| line_text(line)).collect()
    }

    #[test]
    fn test_header_spans_width() {
        let text = line_text(&header(&frame(24)));
        assert!(text.starts_with("Last updated: 14:03:59"));
        assert!(text.ends_with("Z2monitor Dashboard"));
        assert_eq!(text.len(), 80);
    }

    #[test]
    fn test_rows_are_aligned() {
        let events = vec![
            event(1, 5, "db01", "Disk full", false),
            event(2, 3, "webserver02", "Load high", true),
        ];
        let lines = texts(&full_list(&events));

        assert_eq!(lines[0], "  5m db01        Disk full N");
        assert_eq!(lines[1], "  5m webserver02 Load high Y");
    }

    #[test]
    fn test_severity_and_ack_tones() {
        let lines = full_list(&[event(1, 5, "db01", "Disk full", true)]);
        assert_eq!(lines[0][1].tone, Tone::Severity(Severity::DISASTER));
        assert_eq!(lines[0][3].tone, Tone::Acknowledged);
    }

    #[test]
    fn test_dashboard_fits_height() {
        let events: Vec<Event> = (0..50)
            .map(|i| event(i, 4, "host", "Problem", false))
            .collect();
        let lines = dashboard(&events, &frame(10));

        assert_eq!(lines.len(), 9);
        assert_eq!(lines[0][0].tone, Tone::Header);
    }

    #[test]
    fn test_full_list_is_not_cut() {
        let events: Vec<Event> = (0..50)
            .map(|i| event(i, 4, "host", "Problem", false))
            .collect();
        assert_eq!(full_list(&events).len(), 50);
    }

    #[test]
    fn test_empty_notice() {
        let lines = texts(&dashboard(&[], &frame(24)));
        assert!(lines[2].contains("0 results"));
        assert_eq!(
            lines[4],
            "Please check your dashboard at https://zabbix.example.com to verify activity."
        );
        assert!(lines[6].contains("every 10 seconds"));
    }

    #[test]
    fn test_failure_frame() {
        let lines = texts(&failure(&frame(24), "connection refused", 2, 3));
        assert_eq!(lines[2], "Update failed (2/3): connection refused");
    }
}
