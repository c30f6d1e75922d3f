//! Response assembly.

use std::collections::BTreeMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use famfin_async::ChannelState;
use famfin_core::InvocationResult;

pub const DEFAULT_STATUS: u16 = 200;

/// Turn the accumulated channel state into the platform result.
///
/// Header names are lower-cased and a later duplicate overwrites an earlier
/// one. A body that is not UTF-8 is carried as base64.
pub fn assemble(state: ChannelState) -> InvocationResult {
    let (status, raw_headers, body) = state.into_parts();

    let mut headers = BTreeMap::new();
    for (name, value) in raw_headers {
        headers.insert(
            String::from_utf8_lossy(&name).to_ascii_lowercase(),
            String::from_utf8_lossy(&value).into_owned(),
        );
    }

    let (body, is_base64_encoded) = match String::from_utf8(body.to_vec()) {
        Ok(text) => (text, false),
        Err(_) => (STANDARD.encode(&body), true),
    };

    InvocationResult {
        status_code: status.unwrap_or(DEFAULT_STATUS),
        headers,
        body,
        is_base64_encoded,
    }
}
