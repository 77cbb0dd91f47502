//! HTTP/JSON binding.
//!
//! | Route                      | Reply                                               |
//! |----------------------------|-----------------------------------------------------|
//! | `GET /move?steps=M<int>`   | 200 `{"status":"success","message":"Moved to position: <int>"}` after arrival |
//! | `GET /stop`                | 200 `{"status":"success","message":"Stopped"}`      |
//! | `GET /position`            | 200 `{"status":"success","message":"<int>"}`        |
//! | `GET /isrunning`           | 200 `{"status":"success","message":"0"\|"1"}`       |
//! | `GET /`                    | 200 `text/html` welcome banner                      |
//! | anything else              | 404 `text/plain` `Not found: <path>`                |
//!
//! `message` stays a string even when it carries a number, which is what
//! existing ASCOM/Alpaca clients of the focuser parse.
//!
//! The binding is transport-free: the ESP-IDF server forwards the request
//! URI to the control loop (see [`channels`](super::channels)) and this
//! module turns it into an [`HttpResponse`].

use log::{info, warn};
use serde::Serialize;

use crate::app::commands::{Command, ParseError, ParseMode, parse_step_value};
use crate::app::ports::{EventSink, StepperPort, TimePort};
use crate::app::service::{FocuserService, MoveCompletion, Reply};

pub const CONTENT_JSON: &str = "application/json";
pub const CONTENT_HTML: &str = "text/html";
pub const CONTENT_TEXT: &str = "text/plain";

pub const WELCOME_BANNER: &str = "Welcome to the REST Web Server";
pub const INVALID_COMMAND: &str = "Invalid command";

/// Paths the server registers handlers for.
pub const ROUTE_PATHS: [&str; 5] = ["/", "/move", "/stop", "/position", "/isrunning"];

/// Decoded request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Welcome,
    Move,
    Stop,
    Position,
    IsRunning,
    NotFound,
}

/// Classify a request URI (query string allowed).
pub fn route(uri: &str) -> Route {
    match split_uri(uri).0 {
        "/" => Route::Welcome,
        "/move" => Route::Move,
        "/stop" => Route::Stop,
        "/position" => Route::Position,
        "/isrunning" => Route::IsRunning,
        _ => Route::NotFound,
    }
}

/// Status, content type and body of one reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl HttpResponse {
    fn json(message: &str) -> Self {
        let body = serde_json::to_string(&StatusMessage {
            status: "success",
            message,
        })
        .unwrap_or_default();
        Self {
            status: 200,
            content_type: CONTENT_JSON,
            body,
        }
    }

    fn plain(status: u16, content_type: &'static str, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type,
            body: body.into(),
        }
    }

    pub fn not_found(path: &str) -> Self {
        Self::plain(404, CONTENT_TEXT, format!("Not found: {}", path))
    }
}

/// Wire shape of every JSON body.
#[derive(Serialize)]
struct StatusMessage<'a> {
    status: &'a str,
    message: &'a str,
}

/// HTTP front-end for the focuser service.
pub struct HttpBinding {
    mode: ParseMode,
}

impl HttpBinding {
    pub fn new(mode: ParseMode) -> Self {
        Self { mode }
    }

    /// Answer one GET request.  A move blocks until the axis has arrived.
    pub fn handle(
        &self,
        uri: &str,
        service: &mut FocuserService,
        hw: &mut impl StepperPort,
        clock: &impl TimePort,
        sink: &mut impl EventSink,
    ) -> HttpResponse {
        let (path, query) = split_uri(uri);
        match route(uri) {
            Route::Welcome => HttpResponse::plain(200, CONTENT_HTML, WELCOME_BANNER),
            Route::NotFound => {
                warn!("HTTP: no route for {}", path);
                HttpResponse::not_found(path)
            }
            Route::Move => {
                let steps = query_param(query, "steps");
                let target = match parse_step_value(steps.as_deref().unwrap_or(""), self.mode) {
                    Ok(target) => target,
                    Err(e) => {
                        service.reject(e, sink);
                        warn!("HTTP: bad move {:?} ({})", steps, e);
                        return e.into();
                    }
                };
                match service.handle(Command::Move(target), MoveCompletion::WaitForArrival, hw, clock, sink) {
                    Reply::Moved(p) => HttpResponse::json(&format!("Moved to position: {}", p)),
                    other => unexpected(other),
                }
            }
            Route::Stop => {
                service.handle(Command::Stop, MoveCompletion::Immediate, hw, clock, sink);
                HttpResponse::json("Stopped")
            }
            Route::Position => {
                match service.handle(Command::Position, MoveCompletion::Immediate, hw, clock, sink) {
                    Reply::Position(p) => {
                        info!("Position:{}", p);
                        HttpResponse::json(&p.to_string())
                    }
                    other => unexpected(other),
                }
            }
            Route::IsRunning => {
                match service.handle(Command::IsRunning, MoveCompletion::Immediate, hw, clock, sink) {
                    Reply::Running(r) => {
                        info!("Running:{}", u8::from(r));
                        HttpResponse::json(if r { "1" } else { "0" })
                    }
                    other => unexpected(other),
                }
            }
        }
    }
}

fn unexpected(reply: Reply) -> HttpResponse {
    warn!("HTTP: unexpected service reply {:?}", reply);
    HttpResponse::plain(500, CONTENT_TEXT, "Internal error")
}

fn split_uri(uri: &str) -> (&str, &str) {
    uri.split_once('?').unwrap_or((uri, ""))
}

/// First value of `key` in a form-encoded query string, percent-decoded.
pub fn query_param(query: &str, key: &str) -> Option<String> {
    query
        .split('&')
        .filter_map(|pair| {
            let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
            (percent_decode(k).as_deref() == Some(key)).then(|| percent_decode(v))
        })
        .next()
        .flatten()
}

/// Decode `+` and `%XX` escapes.  `None` on a malformed escape or
/// non-UTF-8 result.
fn percent_decode(s: &str) -> Option<String> {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => out.push(b' '),
            b'%' => {
                let hex = bytes.get(i + 1..i + 3)?;
                let hex = core::str::from_utf8(hex).ok()?;
                out.push(u8::from_str_radix(hex, 16).ok()?);
                i += 2;
            }
            b => out.push(b),
        }
        i += 1;
    }
    String::from_utf8(out).ok()
}

impl From<ParseError> for HttpResponse {
    fn from(_: ParseError) -> Self {
        Self::plain(400, CONTENT_TEXT, INVALID_COMMAND)
    }
}
