//! Alert webhook parsing.
//!
//! A webhook text is a subject line followed by a body of `Label: value`
//! lines. The subject decides what kind of request it is; the body layout
//! is fixed per phase and read strictly by position.

use std::fmt;

use crate::diagnostics::DiagnosticKind;
use crate::error::RelayError;

/// Lifecycle phase of a monitored problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertPhase {
    /// A problem was raised
    New,
    /// Someone acted on an open problem
    Updated,
    /// The problem recovered
    Recovered,
}

impl AlertPhase {
    /// Get display name for this phase.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Updated => "updated",
            Self::Recovered => "recovered",
        }
    }

    /// Number of body lines this phase's layout needs.
    #[must_use]
    pub const fn field_count(&self) -> usize {
        match self {
            Self::New => 7,
            Self::Updated => 9,
            Self::Recovered => 6,
        }
    }
}

impl fmt::Display for AlertPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a webhook subject asks the relay to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubjectKind {
    /// A problem notification in one of its phases
    Alert(AlertPhase),
    /// A network diagnostic request
    Diagnostic(DiagnosticKind),
    /// Nothing the relay recognises
    Unknown,
}

/// Classify a subject line by case-insensitive keyword.
///
/// Alert keywords are tested in the order `problem`, `update`, `recovery`,
/// so a subject naming more than one (e.g. "Updated problem: ...") is a new
/// problem. Diagnostic keywords are only consulted when no alert keyword
/// matches.
#[must_use]
pub fn classify(subject: &str) -> SubjectKind {
    let subject = subject.to_lowercase();

    if subject.contains("problem") {
        SubjectKind::Alert(AlertPhase::New)
    } else if subject.contains("update") {
        SubjectKind::Alert(AlertPhase::Updated)
    } else if subject.contains("recovery") {
        SubjectKind::Alert(AlertPhase::Recovered)
    } else if subject.contains("traceroute") {
        SubjectKind::Diagnostic(DiagnosticKind::Traceroute)
    } else if subject.contains("ping") {
        SubjectKind::Diagnostic(DiagnosticKind::Ping)
    } else {
        SubjectKind::Unknown
    }
}

/// Split webhook text into its subject line and trimmed body.
pub fn split_envelope(text: &str) -> Result<(&str, &str), RelayError> {
    let Some((subject, body)) = text.split_once('\n') else {
        return Err(RelayError::InvalidFormat(
            "expected a subject line followed by a body".to_string(),
        ));
    };

    Ok((subject.trim(), body.trim()))
}

/// A parsed alert, one variant per phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlertEvent {
    /// A new problem
    Problem {
        trigger: String,
        host_name: String,
        host_address: String,
        severity: String,
        time: String,
        value: String,
        event_id: String,
    },

    /// An operator update on an open problem
    Update {
        actor: String,
        action: String,
        message: String,
        host_address: String,
        severity: String,
        time: String,
        value: String,
        age: String,
        event_id: String,
    },

    /// A recovered problem
    Recovery {
        trigger: String,
        host_name: String,
        host_address: String,
        recovery_time: String,
        age: String,
        event_id: String,
    },
}

impl AlertEvent {
    /// Parse an alert body using the layout of `phase`.
    pub fn parse(body: &str, phase: AlertPhase) -> Result<Self, RelayError> {
        let event = match phase {
            AlertPhase::New => {
                let [trigger, host_name, host_address, severity, time, value, event_id] =
                    positional_fields::<7>(body)?;
                Self::Problem {
                    trigger,
                    host_name,
                    host_address,
                    severity,
                    time,
                    value,
                    event_id,
                }
            }
            AlertPhase::Updated => {
                let [actor, action, message, host_address, severity, time, value, age, event_id] =
                    positional_fields::<9>(body)?;
                Self::Update {
                    actor,
                    action,
                    message,
                    host_address,
                    severity,
                    time,
                    value,
                    age,
                    event_id,
                }
            }
            AlertPhase::Recovered => {
                let [trigger, host_name, host_address, recovery_time, age, event_id] =
                    positional_fields::<6>(body)?;
                Self::Recovery {
                    trigger,
                    host_name,
                    host_address,
                    recovery_time,
                    age,
                    event_id,
                }
            }
        };

        if event.event_id().is_empty() {
            return Err(RelayError::MalformedBody {
                line: phase.field_count(),
                reason: "event id is empty".to_string(),
            });
        }

        Ok(event)
    }

    /// The monitoring system's event id.
    #[must_use]
    pub fn event_id(&self) -> &str {
        match self {
            Self::Problem { event_id, .. }
            | Self::Update { event_id, .. }
            | Self::Recovery { event_id, .. } => event_id,
        }
    }

    /// Get the phase this alert belongs to.
    #[must_use]
    pub const fn phase(&self) -> AlertPhase {
        match self {
            Self::Problem { .. } => AlertPhase::New,
            Self::Update { .. } => AlertPhase::Updated,
            Self::Recovery { .. } => AlertPhase::Recovered,
        }
    }
}

/// Read the value after the first `": "` of each of the first `N` lines.
fn positional_fields<const N: usize>(body: &str) -> Result<[String; N], RelayError> {
    let lines: Vec<&str> = body.lines().collect();
    if lines.len() < N {
        return Err(RelayError::MalformedBody {
            line: lines.len() + 1,
            reason: format!("expected {N} lines, found {}", lines.len()),
        });
    }

    let mut values = Vec::with_capacity(N);
    for (index, line) in lines.iter().take(N).enumerate() {
        let (_, value) = line
            .split_once(": ")
            .ok_or_else(|| RelayError::MalformedBody {
                line: index + 1,
                reason: format!("missing \": \" separator in {line:?}"),
            })?;
        values.push(value.trim().to_string());
    }

    values
        .try_into()
        .map_err(|values: Vec<String>| RelayError::MalformedBody {
            line: values.len(),
            reason: format!("expected {N} fields, parsed {}", values.len()),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROBLEM_BODY: &str = "Trigger: High CPU load\r\n\
        Host: db-1\r\n\
        IP: 10.0.0.5\r\n\
        Severity: High\r\n\
        Time: 2024.05.01 12:00:00\r\n\
        Value: 97 %\r\n\
        Event ID: 4242";

    #[test]
    fn test_classify_phases() {
        assert_eq!(
            classify("Problem: High CPU load"),
            SubjectKind::Alert(AlertPhase::New)
        );
        assert_eq!(
            classify("UPDATE: High CPU load"),
            SubjectKind::Alert(AlertPhase::Updated)
        );
        assert_eq!(
            classify("Recovery: High CPU load"),
            SubjectKind::Alert(AlertPhase::Recovered)
        );
        assert_eq!(
            classify("Ping host"),
            SubjectKind::Diagnostic(DiagnosticKind::Ping)
        );
        assert_eq!(
            classify("traceroute please"),
            SubjectKind::Diagnostic(DiagnosticKind::Traceroute)
        );
        assert_eq!(classify("Hello there"), SubjectKind::Unknown);
    }

    #[test]
    fn test_problem_keyword_wins_over_other_phases() {
        assert_eq!(
            classify("Updated problem: Disk full"),
            SubjectKind::Alert(AlertPhase::New)
        );
        assert_eq!(
            classify("Problem recovery: Disk full"),
            SubjectKind::Alert(AlertPhase::New)
        );
        assert_eq!(
            classify("Update after recovery: Disk full"),
            SubjectKind::Alert(AlertPhase::Updated)
        );
        assert_eq!(
            classify("Ping problem on db-1"),
            SubjectKind::Alert(AlertPhase::New)
        );
    }

    #[test]
    fn test_split_envelope_requires_two_lines() {
        assert!(matches!(
            split_envelope("Problem: only a subject"),
            Err(RelayError::InvalidFormat(_))
        ));
        assert!(matches!(split_envelope(""), Err(RelayError::InvalidFormat(_))));

        let (subject, body) = split_envelope(" Problem: x \nA: 1\nB: 2\n\n").unwrap();
        assert_eq!(subject, "Problem: x");
        assert_eq!(body, "A: 1\nB: 2");
    }

    #[test]
    fn test_parse_problem_fields_in_order() {
        let event = AlertEvent::parse(PROBLEM_BODY, AlertPhase::New).unwrap();
        assert_eq!(
            event,
            AlertEvent::Problem {
                trigger: "High CPU load".to_string(),
                host_name: "db-1".to_string(),
                host_address: "10.0.0.5".to_string(),
                severity: "High".to_string(),
                time: "2024.05.01 12:00:00".to_string(),
                value: "97 %".to_string(),
                event_id: "4242".to_string(),
            }
        );
        assert_eq!(event.phase(), AlertPhase::New);
        assert_eq!(event.event_id(), "4242");
    }

    #[test]
    fn test_parse_update_fields_in_order() {
        let body = "User: alice\nAction: acknowledged\nMessage: looking into it\n\
                    IP: 10.0.0.5\nSeverity: High\nTime: 12:05\nValue: 95 %\nAge: 5m\nEvent ID: 4242";
        let event = AlertEvent::parse(body, AlertPhase::Updated).unwrap();
        let AlertEvent::Update {
            actor,
            action,
            message,
            age,
            event_id,
            ..
        } = event
        else {
            panic!("expected an update");
        };
        assert_eq!(actor, "alice");
        assert_eq!(action, "acknowledged");
        assert_eq!(message, "looking into it");
        assert_eq!(age, "5m");
        assert_eq!(event_id, "4242");
    }

    #[test]
    fn test_parse_recovery_uses_six_field_layout() {
        let body = "Trigger: High CPU load\nHost: db-1\nIP: 10.0.0.5\n\
                    Recovery time: 12:30\nAge: 30m\nEvent ID: 4242";
        let event = AlertEvent::parse(body, AlertPhase::Recovered).unwrap();
        assert_eq!(event.phase(), AlertPhase::Recovered);
        assert_eq!(event.event_id(), "4242");
        let AlertEvent::Recovery { recovery_time, .. } = event else {
            panic!("expected a recovery");
        };
        assert_eq!(recovery_time, "12:30");
    }

    #[test]
    fn test_value_keeps_text_after_first_separator() {
        let body = "Trigger: Disk: /var full\nHost: a\nIP: b\nSeverity: c\nTime: d\nValue: e\nEvent ID: 1";
        let AlertEvent::Problem { trigger, .. } = AlertEvent::parse(body, AlertPhase::New).unwrap()
        else {
            panic!("expected a problem");
        };
        assert_eq!(trigger, "Disk: /var full");
    }

    #[test]
    fn test_too_few_lines_is_malformed() {
        let body = "Trigger: x\nHost: y";
        let err = AlertEvent::parse(body, AlertPhase::New).unwrap_err();
        assert!(matches!(err, RelayError::MalformedBody { line: 3, .. }));

        // A recovery body is one line short of the problem layout.
        let recovery = "Trigger: a\nHost: b\nIP: c\nRecovery time: d\nAge: e\nEvent ID: 1";
        assert!(AlertEvent::parse(recovery, AlertPhase::New).is_err());
    }

    #[test]
    fn test_missing_separator_is_malformed() {
        let body = PROBLEM_BODY.replace("Severity: High", "Severity High");
        let err = AlertEvent::parse(&body, AlertPhase::New).unwrap_err();
        assert!(matches!(err, RelayError::MalformedBody { line: 4, .. }));
    }

    #[test]
    fn test_empty_event_id_is_malformed() {
        let body = PROBLEM_BODY.replace("Event ID: 4242", "Event ID: ");
        assert!(AlertEvent::parse(&body, AlertPhase::New).is_err());
    }
}
