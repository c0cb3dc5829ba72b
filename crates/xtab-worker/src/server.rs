use std::io::{self, BufRead, Write};

use serde_json::{json, Value};
use tracing::{debug, error};

use crate::methods;
use crate::protocol::{JsonRpcMessage, JsonRpcResponse};

const WORKER_NAME: &str = "xtab";
const WORKER_VERSION: &str = env!("CARGO_PKG_VERSION");
const PROTOCOL_VERSION: &str = "2024-11-05";

/// Static information returned from `initialize`.
#[derive(Debug, Clone, Default)]
pub struct WorkerInfo {
    /// Free text appended to the initialize response.
    pub instructions: Option<String>,
}

/// Run the worker on stdio. Blocks until stdin is closed.
pub fn run_server(info: &WorkerInfo) -> anyhow::Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    serve(stdin.lock(), &mut stdout, info)
}

/// Answer one JSON-RPC request per input line until EOF.
pub fn serve<R: BufRead, W: Write>(reader: R, writer: &mut W, info: &WorkerInfo) -> anyhow::Result<()> {
    for line in reader.lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                error!("stdin read error: {e}");
                break;
            }
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(response) = handle_message(line, info) {
            write_response(writer, &response)?;
        }
    }

    Ok(())
}

/// Handle a single request line. Notifications (no id) yield `None`.
pub fn handle_message(line: &str, info: &WorkerInfo) -> Option<JsonRpcResponse> {
    let msg: JsonRpcMessage = match serde_json::from_str(line) {
        Ok(m) => m,
        Err(e) => {
            error!("invalid JSON-RPC: {e}");
            return Some(JsonRpcResponse::parse_error(e));
        }
    };

    let method = msg.method.as_deref().unwrap_or("");
    debug!("worker request: {method}");

    let id = msg.id?;

    let response = match method {
        "initialize" => handle_initialize(id, info),
        "ping" => JsonRpcResponse::ok(id, json!({})),
        "methods/list" => JsonRpcResponse::ok(id, methods::method_definitions()),
        methods::ANALYZE => JsonRpcResponse::from_handler(id, methods::analyze(msg.params.as_ref())),
        methods::TABLE => JsonRpcResponse::from_handler(id, methods::table(msg.params.as_ref())),
        other => JsonRpcResponse::method_not_found(id, other),
    };
    Some(response)
}

fn write_response<W: Write>(writer: &mut W, resp: &JsonRpcResponse) -> anyhow::Result<()> {
    let json = serde_json::to_string(resp)?;
    writeln!(writer, "{json}")?;
    writer.flush()?;
    Ok(())
}

fn handle_initialize(id: Value, info: &WorkerInfo) -> JsonRpcResponse {
    let mut result = json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": {
            "methods": [methods::ANALYZE, methods::TABLE]
        },
        "serverInfo": {
            "name": WORKER_NAME,
            "version": WORKER_VERSION
        }
    });
    if let Some(text) = &info.instructions {
        result["instructions"] = json!(text);
    }
    JsonRpcResponse::ok(id, result)
}
