//! `famfin-fn invoke`: one platform event in, one result out.

use std::io::Read;
use std::path::Path;

use anyhow::Context;
use famfin_core::InvocationResult;
use famfin_trigger::{Bridge, BridgeError, Envelope};

pub fn run(bridge: &Bridge, event: Option<&Path>) -> anyhow::Result<()> {
    let raw = read_event(event)?;
    let result = invoke_raw(bridge, &raw);
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

/// Read the event from `path`, or stdin when absent or `-`.
pub fn read_event(path: Option<&Path>) -> anyhow::Result<Vec<u8>> {
    match path {
        Some(path) if path != Path::new("-") => std::fs::read(path)
            .with_context(|| format!("failed to read event {}", path.display())),
        _ => {
            let mut raw = Vec::new();
            std::io::stdin()
                .read_to_end(&mut raw)
                .context("failed to read event from stdin")?;
            Ok(raw)
        }
    }
}

/// Parse and invoke. An unparseable event is answered like any other bad
/// envelope.
pub fn invoke_raw(bridge: &Bridge, raw: &[u8]) -> InvocationResult {
    match Envelope::from_event_json(raw) {
        Ok(envelope) => bridge.handle_blocking(envelope),
        Err(e) => BridgeError::from(e).into_result(),
    }
}
