//! Session State Machine
//!
//! `Created -> Filtered -> AwaitingSelection -> AwaitingMessage -> Committed`,
//! with `Aborted` reachable from every non-final state. Nothing is
//! acknowledged until both prompts have been answered and validated.

use regex::Regex;
use tracing::{debug, info, warn};
use zabbix_protocol::{AlertBackend, ApiError};

use event_engine::Event;

use crate::error::{AbortReason, SessionError};
use crate::port::LinePort;
use crate::selection::parse_selection;

const SELECTION_PROMPT: &str = " Sel > ";
const MESSAGE_PROMPT: &str = " Msg > ";

/// Where a session currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Created,
    Filtered,
    AwaitingSelection,
    AwaitingMessage,
    Committed,
    Aborted,
}

/// A matching unacknowledged event and the event id that acknowledges it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub event: Event,
    pub event_id: u64,
}

/// Result of acknowledging one selected event
#[derive(Debug, Clone, PartialEq)]
pub struct AckItem {
    /// 1-based position in the presented list
    pub index: usize,
    pub trigger_id: u64,
    pub event_id: u64,
    pub description: String,
    pub hostname: String,
    /// Event ids the backend confirmed, or the failure for this item
    pub result: Result<Vec<u64>, ApiError>,
}

/// Item-by-item results of a committed session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AckReport {
    pub items: Vec<AckItem>,
    /// Message sent, `None` when the backend default was used
    pub message: Option<String>,
}

impl AckReport {
    pub fn succeeded(&self) -> usize {
        self.items.iter().filter(|item| item.result.is_ok()).count()
    }

    pub fn failed(&self) -> impl Iterator<Item = &AckItem> {
        self.items.iter().filter(|item| item.result.is_err())
    }

    /// Every selected event was acknowledged
    pub fn is_complete(&self) -> bool {
        self.items.iter().all(|item| item.result.is_ok())
    }
}

/// How a session ended
#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome {
    Committed(AckReport),
    Aborted(AbortReason),
}

/// Single-use interactive acknowledgment of events matching a pattern
pub struct AckSession {
    pattern: String,
    state: SessionState,
    /// Matching unacknowledged events in ranked order
    candidates: Vec<Candidate>,
}

impl AckSession {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            state: SessionState::Created,
            candidates: Vec::new(),
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Events presented for selection
    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    /// Drive the session to a final state
    ///
    /// `events` must already be ranked. Errors leave the session `Aborted`.
    pub async fn run<B, P>(
        &mut self,
        events: &[Event],
        backend: &B,
        port: &mut P,
    ) -> Result<SessionOutcome, SessionError>
    where
        B: AlertBackend + ?Sized,
        P: LinePort + ?Sized,
    {
        if self.state != SessionState::Created {
            return Err(SessionError::AlreadyFinished);
        }

        let result = self.drive(events, backend, port).await;
        self.state = match result {
            Ok(SessionOutcome::Committed(_)) => SessionState::Committed,
            _ => SessionState::Aborted,
        };

        match &result {
            Ok(SessionOutcome::Aborted(reason)) => {
                info!("Acknowledgment session aborted: {}", reason)
            }
            Ok(SessionOutcome::Committed(report)) => info!(
                "Acknowledgment session committed: {}/{} acknowledged",
                report.succeeded(),
                report.items.len()
            ),
            Err(e) => warn!("Acknowledgment session failed: {}", e),
        }
        result
    }

    async fn drive<B, P>(
        &mut self,
        events: &[Event],
        backend: &B,
        port: &mut P,
    ) -> Result<SessionOutcome, SessionError>
    where
        B: AlertBackend + ?Sized,
        P: LinePort + ?Sized,
    {
        port.write_line(&format!(
            "Retrieving list of active unacknowledged triggers that match: {}",
            self.pattern
        ))?;
        port.write_line("")?;

        self.filter(events, backend).await?;
        if self.candidates.is_empty() {
            return Ok(SessionOutcome::Aborted(AbortReason::NoMatches(
                self.pattern.clone(),
            )));
        }
        self.state = SessionState::Filtered;

        for (i, Candidate { event, .. }) in self.candidates.iter().enumerate() {
            port.write_line(&format!(
                "{:>4} > {} - {} ({})",
                i + 1,
                event.age,
                event.description,
                event.hostname
            ))?;
        }
        self.state = SessionState::AwaitingSelection;

        port.write_line("")?;
        port.write_line(
            "       Selection - enter \"all\", or a set of numbers listed above separated by spaces.",
        )?;
        let input = match port.read_line(SELECTION_PROMPT)? {
            Some(input) => input,
            None => return Ok(SessionOutcome::Aborted(AbortReason::InputClosed)),
        };
        let selected = match parse_selection(&input, self.candidates.len()) {
            Ok(selected) => selected,
            Err(reason) => return Ok(SessionOutcome::Aborted(reason)),
        };
        debug!("Selected indices: {:?}", selected);
        self.state = SessionState::AwaitingMessage;

        port.write_line("")?;
        port.write_line(
            "       Message   - enter an acknowledgement message below, or leave blank for the default.",
        )?;
        let message = match port.read_line(MESSAGE_PROMPT)? {
            Some(message) => message,
            None => return Ok(SessionOutcome::Aborted(AbortReason::InputClosed)),
        };
        let message = Some(message).filter(|m| !m.is_empty());
        port.write_line("")?;

        let report = self.commit(&selected, message, backend, port).await;
        Ok(SessionOutcome::Committed(report))
    }

    /// Keep events matching the pattern whose latest event is unacknowledged
    async fn filter<B>(&mut self, events: &[Event], backend: &B) -> Result<(), SessionError>
    where
        B: AlertBackend + ?Sized,
    {
        let regex = Regex::new(&self.pattern).map_err(|e| SessionError::InvalidPattern {
            pattern: self.pattern.clone(),
            reason: e.to_string(),
        })?;

        for event in events
            .iter()
            .filter(|e| regex.is_match(&e.hostname) || regex.is_match(&e.description))
        {
            match backend.resolve_ack_event(event.id).await? {
                Some(record) if !record.acknowledged => {
                    let mut event = event.clone();
                    event.acknowledged = false;
                    event.ack_event_id = Some(record.event_id);
                    self.candidates.push(Candidate {
                        event,
                        event_id: record.event_id,
                    });
                }
                Some(record) => {
                    debug!(
                        "Trigger {} already acknowledged by event {}",
                        event.id, record.event_id
                    );
                }
                None => warn!("Trigger {} has no event to acknowledge, skipping", event.id),
            }
        }

        debug!(
            "Pattern '{}' kept {} of {} events",
            self.pattern,
            self.candidates.len(),
            events.len()
        );
        Ok(())
    }

    /// Acknowledge every selected candidate, recording each result
    ///
    /// Output failures are logged and ignored here: once the first call has
    /// been issued the report must reach the caller.
    async fn commit<B, P>(
        &self,
        selected: &[usize],
        message: Option<String>,
        backend: &B,
        port: &mut P,
    ) -> AckReport
    where
        B: AlertBackend + ?Sized,
        P: LinePort + ?Sized,
    {
        let mut report = AckReport {
            items: Vec::with_capacity(selected.len()),
            message,
        };

        for &index in selected {
            let Candidate { event, event_id } = &self.candidates[index - 1];
            let event_id = *event_id;

            if let Err(e) = port.write_line(&format!(
                "Acknowledging: {} ({})",
                event.description, event.hostname
            )) {
                warn!("Cannot print acknowledgment progress: {}", e);
            }
            let result = backend
                .acknowledge_event(event_id, report.message.as_deref())
                .await;
            if let Err(e) = &result {
                warn!("Failed to acknowledge event {}: {}", event_id, e);
            }

            report.items.push(AckItem {
                index,
                trigger_id: event.id,
                event_id,
                description: event.description.clone(),
                hostname: event.hostname.clone(),
                result,
            });
        }
        report
    }
}
