//! `voxdemo replay`: feed a recorded event log through a fresh session.

use std::path::Path;

use anyhow::Context;
use voxdemo_core::{DemoStore, Env, FixedEnv, RawEvent, SystemEnv, invariants};

use crate::render;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReplaySummary {
    pub applied: usize,
    pub ignored: usize,
    pub rejected: usize,
}

/// Parse an event log: either one JSON array, or one event object per line.
/// Blank lines and `#` comments are skipped in the line form.
pub fn parse_log(content: &str) -> anyhow::Result<Vec<RawEvent>> {
    if content.trim_start().starts_with('[') {
        return serde_json::from_str(content).context("invalid event array");
    }
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(i, line)| {
            serde_json::from_str(line).with_context(|| format!("invalid event on line {}", i + 1))
        })
        .collect()
}

/// Apply `events` in order. Undecodable events are reported and skipped.
pub fn replay<E: Env>(
    store: &mut DemoStore<E>,
    events: Vec<RawEvent>,
    mut out: impl FnMut(String),
) -> ReplaySummary {
    let mut summary = ReplaySummary::default();
    for (i, raw) in events.into_iter().enumerate() {
        let tag = raw.tag.clone();
        match store.send_raw(raw) {
            Ok(step) if step.applied => {
                summary.applied += 1;
                out(format!("{:>3} {tag:<18} {} -> {}", i + 1, step.from, step.to));
            }
            Ok(step) => {
                summary.ignored += 1;
                out(format!("{:>3} {tag:<18} ignored in {}", i + 1, step.from));
            }
            Err(e) => {
                summary.rejected += 1;
                tracing::warn!(index = i + 1, error = %e, "event rejected");
                out(format!("{:>3} {tag:<18} rejected: {e}", i + 1));
            }
        }
    }
    summary
}

/// Entry point for `voxdemo replay`.
pub fn cmd_replay(path: &Path, deterministic: bool, json: bool) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let events = parse_log(&content).with_context(|| format!("failed to parse {}", path.display()))?;
    tracing::info!(events = events.len(), path = %path.display(), "replaying");

    if deterministic {
        run(DemoStore::with_env(FixedEnv::epoch()), events, json)
    } else {
        run(DemoStore::with_env(SystemEnv::new()), events, json)
    }
}

fn run<E: Env>(mut store: DemoStore<E>, events: Vec<RawEvent>, json: bool) -> anyhow::Result<()> {
    let summary = replay(&mut store, events, |line| {
        if !json {
            println!("{line}");
        }
    });

    let session = store.context();
    if json {
        println!("{}", serde_json::to_string_pretty(session)?);
    } else {
        println!();
        println!("{}", render::status_line(session));
        for msg in &session.messages {
            println!("{}", render::message_line(session, msg));
        }
        if let Some(call) = &session.current_tool_call {
            println!("{}", render::tool_line(call));
        }
        println!(
            "applied={} ignored={} rejected={}",
            summary.applied, summary.ignored, summary.rejected
        );
    }

    invariants::check(session).context("replayed session is inconsistent")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use voxdemo_core::DemoStatus;

    #[test]
    fn parses_json_lines_with_comments() {
        let log = r#"
# warm up
{"type": "START_SIMULATED"}

{"type": "ADD_MESSAGE", "payload": {"role": "user", "content": "hi"}}
"#;
        let events = parse_log(log).expect("parse");
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].tag, "ADD_MESSAGE");
    }

    #[test]
    fn parses_json_array() {
        let log = r#"[{"type": "START_SIMULATED"}, {"type": "TRY_INTERACTIVE"}]"#;
        assert_eq!(parse_log(log).expect("parse").len(), 2);
    }

    #[test]
    fn bad_line_reports_its_number() {
        let err = parse_log("{\"type\": \"RESET\"}\nnot json\n").expect_err("bad");
        assert!(format!("{err:#}").contains("line 2"));
    }

    #[test]
    fn replay_counts_applied_ignored_and_rejected() {
        let events = parse_log(
            r#"[
                {"type": "START_SIMULATED"},
                {"type": "CONNECTED"},
                {"type": "TELEPORT"},
                {"type": "TRY_INTERACTIVE"},
                {"type": "CONNECTION_FAILED", "payload": {"error": "no mic"}}
            ]"#,
        )
        .expect("parse");

        let mut store = DemoStore::with_env(FixedEnv::epoch());
        let mut lines = Vec::new();
        let summary = replay(&mut store, events, |l| lines.push(l));

        assert_eq!(
            summary,
            ReplaySummary {
                applied: 3,
                ignored: 1,
                rejected: 1
            }
        );
        assert_eq!(lines.len(), 5);
        assert!(lines[1].contains("ignored in simulated"));
        assert!(lines[2].contains("rejected"));
        assert_eq!(store.status(), DemoStatus::Fallback);
        assert_eq!(
            store.context().error.as_ref().map(|e| e.message.as_str()),
            Some("no mic")
        );
    }

    #[test]
    fn sample_log_completes_one_turn() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../fixtures/logs/interactive_turn.jsonl");
        let content = std::fs::read_to_string(&path).expect("sample log");
        let events = parse_log(&content).expect("parse");

        let mut store = DemoStore::with_env(FixedEnv::epoch());
        let summary = replay(&mut store, events, |_| {});
        // the doubled STOP_LISTENING is ignored
        assert_eq!(summary.ignored, 1);
        assert_eq!(summary.rejected, 0);

        let s = store.context();
        assert_eq!(s.status, DemoStatus::Complete);
        assert_eq!(s.messages.len(), 2);
        assert!(s.current_tool_call.is_none());
        assert_eq!(invariants::check(s), Ok(()));
    }

    #[test]
    fn cmd_replay_reads_file() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(file, "{{\"type\": \"START_SIMULATED\"}}").expect("write");
        writeln!(file, "{{\"type\": \"RESPONSE_COMPLETE\"}}").expect("write");
        cmd_replay(file.path(), true, true).expect("replay");
    }

    #[test]
    fn cmd_replay_missing_file_fails() {
        assert!(cmd_replay(Path::new("/nonexistent/log.jsonl"), true, false).is_err());
    }
}
