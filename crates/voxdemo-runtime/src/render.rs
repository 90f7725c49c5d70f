//! Terminal rendering of a live session.
//!
//! [`TranscriptPrinter`] diffs successive snapshots and emits only what is
//! new: status changes, appended messages, and tool-call progress.

use std::io::Write;

use tokio::sync::watch;
use voxdemo_core::{DemoStatus, Message, Role, Session, ToolCall, ToolCallStatus};

use crate::host::Snapshot;
use crate::playback::agent_name;

pub fn status_line(session: &Session) -> String {
    let mut line = format!("[{}] mode={}", session.status, session.mode);
    if let Some(agent) = session.agent_type {
        line.push_str(&format!(" agent={agent}"));
    }
    if let Some(err) = &session.error {
        line.push_str(&format!(" error=\"{err}\""));
    }
    line
}

pub fn message_line(session: &Session, msg: &Message) -> String {
    let speaker = match msg.role {
        Role::Assistant => session.agent_type.map_or("Assistant", agent_name),
        Role::User => "Caller",
        Role::System => "System",
    };
    format!(
        "{} {speaker}: {}",
        msg.timestamp.format("%H:%M:%S"),
        msg.content
    )
}

pub fn tool_line(call: &ToolCall) -> String {
    let marker = match call.status {
        ToolCallStatus::Pending => "…",
        ToolCallStatus::Executing => "⟳",
        ToolCallStatus::Complete => "✓",
        ToolCallStatus::Failed => "✗",
    };
    let params = serde_json::to_string(&call.params).unwrap_or_default();
    let mut line = format!("  {marker} {}({params}) {}", call.name, call.status);
    if let Some(result) = &call.result {
        line.push_str(&format!(" -> {result}"));
    }
    line
}

/// Remembers what has been printed so far.
#[derive(Debug, Default)]
pub struct TranscriptPrinter {
    printed: usize,
    /// Id of the first printed message; a different first message means the
    /// transcript was cleared and refilled between two snapshots.
    first_id: Option<String>,
    last_status: Option<DemoStatus>,
    last_tool: Option<(String, ToolCallStatus)>,
    last_revision: Option<u64>,
}

impl TranscriptPrinter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines to print for `snap`, given everything printed before.
    pub fn lines(&mut self, snap: &Snapshot) -> Vec<String> {
        let session = &snap.session;
        let mut out = Vec::new();

        if self.last_status != Some(session.status) {
            self.last_status = Some(session.status);
            out.push(status_line(session));
        }

        // RESET and START_SIMULATED clear the transcript.
        let first_id = session.messages.first().map(|m| m.id.as_str());
        if session.messages.len() < self.printed || first_id != self.first_id.as_deref() {
            self.printed = 0;
        }
        self.first_id = first_id.map(str::to_string);

        if let Some(call) = &session.current_tool_call {
            let key = (call.id.clone(), call.status);
            if self.last_tool.as_ref() != Some(&key) {
                out.push(tool_line(call));
                self.last_tool = Some(key);
            }
        } else {
            self.last_tool = None;
        }

        for msg in &session.messages[self.printed..] {
            out.push(message_line(session, msg));
        }
        self.printed = session.messages.len();

        out
    }

    /// Print every snapshot until `stop` holds or the host shuts down.
    pub async fn follow(
        &mut self,
        rx: &mut watch::Receiver<Snapshot>,
        json: bool,
        stop: impl Fn(&Snapshot) -> bool,
    ) -> std::io::Result<Option<Snapshot>> {
        loop {
            let snap = rx.borrow_and_update().clone();
            tracing::trace!(revision = snap.revision, event = ?snap.last_event, "snapshot");
            self.emit(&snap, json)?;
            if stop(&snap) {
                return Ok(Some(snap));
            }
            if rx.changed().await.is_err() {
                return Ok(None);
            }
        }
    }

    /// JSON object for `snap`, or `None` if this revision was already printed.
    ///
    /// Snapshots come from a `watch` channel, so revisions published in quick
    /// succession may be skipped; only observed snapshots are printed.
    pub fn json_line(&mut self, snap: &Snapshot) -> serde_json::Result<Option<String>> {
        if self.last_revision == Some(snap.revision) {
            return Ok(None);
        }
        self.last_revision = Some(snap.revision);
        serde_json::to_string(&snap.session).map(Some)
    }

    fn emit(&mut self, snap: &Snapshot, json: bool) -> std::io::Result<()> {
        let mut stdout = std::io::stdout().lock();
        if json {
            if let Some(line) = self.json_line(snap)? {
                writeln!(stdout, "{line}")?;
            }
            return Ok(());
        }
        for line in self.lines(snap) {
            writeln!(stdout, "{line}")?;
        }
        Ok(())
    }
}
