//! HTTP bridge channels.
//!
//! Uses `embassy-sync` bounded MPMC channels to hand requests from the
//! ESP-IDF HTTP server task to the synchronous control loop, which is the
//! only context allowed to touch the motion engine.  Both sides share
//! these static channels without locking the service.
//!
//! ```text
//! ┌──────────────┐  HttpRequest   ┌──────────────┐
//! │  httpd task  │──────────────▶│ Control Loop  │
//! │  (blocking)  │◀──────────────│  (sync)       │
//! └──────────────┘  HttpResponse  └──────────────┘
//! ```
//!
//! The server runs one handler at a time, so replies pair with requests
//! in FIFO order.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use heapless::String;
use log::warn;

use crate::app::ports::{EventSink, StepperPort, TimePort};
use crate::app::service::FocuserService;
use crate::error::CommsError;

use super::http::{CONTENT_TEXT, HttpBinding, HttpResponse};

/// Longest request URI forwarded to the control loop.
pub const MAX_URI: usize = 128;

/// Inbound request, delivered to the control loop.
pub struct HttpRequest {
    pub uri: String<MAX_URI>,
}

/// Channel depth in either direction.
const DEPTH: usize = 2;

pub type RequestChannel = Channel<CriticalSectionRawMutex, HttpRequest, DEPTH>;
pub type ResponseChannel = Channel<CriticalSectionRawMutex, HttpResponse, DEPTH>;

/// Inbound request channel: httpd task → control loop.
pub static HTTP_REQUESTS: RequestChannel = Channel::new();

/// Outbound response channel: control loop → httpd task.
pub static HTTP_RESPONSES: ResponseChannel = Channel::new();

/// Server side: queue `uri` for the control loop and block until it answers.
pub fn forward(
    requests: &RequestChannel,
    responses: &ResponseChannel,
    uri: &str,
) -> Result<HttpResponse, CommsError> {
    let mut bounded = String::new();
    if bounded.push_str(uri).is_err() {
        return Ok(HttpResponse {
            status: 414,
            content_type: CONTENT_TEXT,
            body: "URI too long".into(),
        });
    }

    requests
        .try_send(HttpRequest { uri: bounded })
        .map_err(|_| CommsError::HttpBridgeBusy)?;
    Ok(futures_lite::future::block_on(responses.receive()))
}

/// Control-loop side: answer at most one pending request.
///
/// Returns `true` if a request was served.
pub fn serve_pending(
    requests: &RequestChannel,
    responses: &ResponseChannel,
    binding: &HttpBinding,
    service: &mut FocuserService,
    hw: &mut impl StepperPort,
    clock: &impl TimePort,
    sink: &mut impl EventSink,
) -> bool {
    let Ok(request) = requests.try_receive() else {
        return false;
    };
    let response = binding.handle(&request.uri, service, hw, clock, sink);
    if responses.try_send(response).is_err() {
        warn!("HTTP: response queue full, dropping reply for {}", request.uri);
    }
    true
}
