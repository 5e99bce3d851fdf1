//! Line-delimited JSON transport: one request per input line, one response
//! per output line, in order.

use std::io::{self, BufRead, Write};

use tracing::{info, warn};
use uuid::Uuid;

use switchboard_dispatch::protocol::ErrorBody;
use switchboard_dispatch::{Dispatcher, ErrorKind, Request, Response};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ServeStats {
    pub requests: u64,
    pub failures: u64,
}

/// Serve until `input` is exhausted. Blank lines are skipped.
pub fn serve<R: BufRead, W: Write>(dispatcher: &Dispatcher, input: R, mut output: W) -> io::Result<ServeStats> {
    let mut stats = ServeStats::default();

    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<Request>(&line) {
            Ok(request) => dispatcher.handle(request),
            Err(e) => malformed(&e),
        };

        stats.requests += 1;
        if !response.is_success() {
            stats.failures += 1;
        }

        serde_json::to_writer(&mut output, &response)?;
        output.write_all(b"\n")?;
        output.flush()?;
    }

    info!(requests = stats.requests, failures = stats.failures, "input exhausted");
    Ok(stats)
}

fn malformed(err: &serde_json::Error) -> Response {
    warn!(error = %err, "malformed request");
    Response {
        id: Uuid::now_v7().to_string(),
        result: None,
        error: Some(ErrorBody {
            message: format!("malformed request: {err}"),
            kind: ErrorKind::ProtocolMismatch,
            trace: Vec::new(),
        }),
    }
}
