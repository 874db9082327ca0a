//! Platform abstraction layer
//!
//! Where string payloads (cycle summaries, game totals) leave the process:
//! - Native: the log
//! - Web: a page-level JavaScript hook

use crate::session::{MessageSink, SinkError};

/// Forwards payloads to the log (native)
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMessageSink;

impl MessageSink for LogMessageSink {
    fn send(&mut self, payload: &str) -> Result<(), SinkError> {
        log::info!("Session payload: {payload}");
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
mod bridge {
    use wasm_bindgen::prelude::*;

    // The page decides what to do with the payload (e.g. post it to a survey)
    #[wasm_bindgen(inline_js = "
        export function forward_session_payload(payload) {
            if (typeof window.receiveSessionPayload === 'function') {
                window.receiveSessionPayload(payload);
                return true;
            }
            return false;
        }
    ")]
    extern "C" {
        pub fn forward_session_payload(payload: &str) -> bool;
    }
}

/// Forwards payloads to `window.receiveSessionPayload` (WASM)
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Copy, Default)]
pub struct BridgeMessageSink;

#[cfg(target_arch = "wasm32")]
impl MessageSink for BridgeMessageSink {
    fn send(&mut self, payload: &str) -> Result<(), SinkError> {
        if bridge::forward_session_payload(payload) {
            Ok(())
        } else {
            Err(SinkError::Storage("receiveSessionPayload is not defined".to_string()))
        }
    }
}

/// Message sink for the current platform
pub fn default_message_sink() -> Box<dyn MessageSink> {
    #[cfg(target_arch = "wasm32")]
    {
        Box::new(BridgeMessageSink)
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        Box::new(LogMessageSink)
    }
}
