//! Chat message rendering (Telegram HTML).

use std::net::Ipv4Addr;

use crate::alert::AlertEvent;
use crate::diagnostics::DiagnosticKind;

/// Longest command output relayed, in characters. Telegram caps a message
/// at 4096 characters after entity parsing.
const MAX_OUTPUT_CHARS: usize = 3500;

/// Render an alert as a chat message.
#[must_use]
pub fn render(event: &AlertEvent) -> String {
    match event {
        AlertEvent::Problem {
            trigger,
            host_name,
            host_address,
            severity,
            time,
            value,
            event_id,
        } => format!(
            "🚨 <b>PROBLEM</b>: {} <b>ON</b> {} 🚨\n\n\
             Host: {}\n\
             Severity: {}\n\
             Date/Time: {}\n\
             Current value: {}\n\n\
             📍 <b>Problem ID</b>: {}",
            escape_html(trigger),
            escape_html(host_name),
            escape_html(host_address),
            escape_html(severity),
            escape_html(time),
            escape_html(value),
            escape_html(event_id),
        ),

        AlertEvent::Update {
            actor,
            action,
            message,
            host_address,
            severity,
            time,
            value,
            age,
            event_id,
        } => format!(
            "🔄 <b>UPDATE</b>: User <b>{}</b> performed <b>{}</b>\n\n\
             Message: {}\n\
             Host: {}\n\
             Severity: {}\n\
             Date/Time: {}\n\
             Current value: {}\n\
             Duration: {}\n\n\
             📍 <b>Problem ID</b>: {}",
            escape_html(actor),
            escape_html(action),
            escape_html(message),
            escape_html(host_address),
            escape_html(severity),
            escape_html(time),
            escape_html(value),
            escape_html(age),
            escape_html(event_id),
        ),

        AlertEvent::Recovery {
            trigger,
            host_name,
            host_address,
            recovery_time,
            age,
            event_id,
        } => format!(
            "✅ <b>RESOLVED</b>: {} <b>ON</b> {} ✅\n\n\
             Host: {}\n\
             Recovery time: {}\n\
             Duration: {}\n\n\
             📍 <b>Problem ID</b>: {}\n\n\
             👍 Problem resolved.",
            escape_html(trigger),
            escape_html(host_name),
            escape_html(host_address),
            escape_html(recovery_time),
            escape_html(age),
            escape_html(event_id),
        ),
    }
}

/// Render diagnostic command output as a chat message.
#[must_use]
pub fn render_diagnostic(kind: DiagnosticKind, target: Ipv4Addr, output: &str) -> String {
    let output = output.trim_end();
    let shown: String = output.chars().take(MAX_OUTPUT_CHARS).collect();
    let truncated = if shown.len() < output.len() {
        "\n…"
    } else {
        ""
    };

    format!(
        "🛰 <b>{}</b> {target}\n\n<pre>{}{truncated}</pre>",
        kind.as_str(),
        escape_html(&shown),
    )
}

/// Escape text for Telegram's HTML parse mode.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
