//! Patch loop: feeds newline-delimited desired-property documents to a
//! reconciler and writes one reported-state line per document.

use serde_json::{json, Map, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use endpoint_supervisor_core::error::value_kind;
use endpoint_supervisor_core::EndpointReconciler;

/// Parse one input line into a patch. Blank lines and non-object documents
/// yield `None`; the latter are logged.
pub fn parse_patch(line: &str) -> Option<Map<String, Value>> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match serde_json::from_str::<Value>(line) {
        Ok(Value::Object(map)) => Some(map),
        Ok(other) => {
            let kind = value_kind(&other);
            tracing::warn!(kind, "skipping non-object patch");
            None
        }
        Err(e) => {
            tracing::warn!(error = %e, "skipping malformed patch");
            None
        }
    }
}

/// Apply every patch read from `input` until EOF. Returns how many patches
/// were applied.
pub async fn run<R, W>(
    reconciler: &mut EndpointReconciler,
    input: R,
    output: &mut W,
) -> std::io::Result<usize>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    let mut applied = 0;

    while let Some(line) = lines.next_line().await? {
        let Some(patch) = parse_patch(&line) else {
            continue;
        };
        let report = reconciler.apply_patch(&patch).await;
        applied += 1;
        if !report.pass.is_clean() {
            tracing::warn!(
                failed = report.pass.failed.len(),
                skipped = report.pass.skipped.len(),
                "reconciliation pass incomplete"
            );
        }

        let out = json!({
            "reported": reconciler.reported_properties(),
            "report": report,
        });
        output.write_all(out.to_string().as_bytes()).await?;
        output.write_all(b"\n").await?;
        output.flush().await?;
    }

    Ok(applied)
}
