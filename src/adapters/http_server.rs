//! ESP-IDF HTTP server adapter.
//!
//! Registers a GET handler for every path in
//! [`ROUTE_PATHS`](crate::bindings::http::ROUTE_PATHS) plus a wildcard
//! fallback.  Handlers run on the httpd task and never touch the motor:
//! each one forwards the request URI over the bridge channels and writes
//! whatever the control loop answers.
//!
//! ```text
//!  GET /move?steps=M500 ──▶ forward() ──▶ HTTP_REQUESTS ──▶ control loop
//!  200 {"status":…}     ◀── response  ◀── HTTP_RESPONSES ◀──┘
//! ```

use log::warn;

use crate::bindings::channels::{RequestChannel, ResponseChannel, forward};
use crate::bindings::http::{CONTENT_TEXT, HttpResponse};

/// Reply used when the control loop already has a request queued.
pub const BUSY_BODY: &str = "Busy";

/// Forward one request and map bridge failures to an HTTP reply.
pub fn bridge_response(
    requests: &RequestChannel,
    responses: &ResponseChannel,
    uri: &str,
) -> HttpResponse {
    match forward(requests, responses, uri) {
        Ok(response) => response,
        Err(e) => {
            warn!("HTTP: {} ({})", e, uri);
            HttpResponse {
                status: 503,
                content_type: CONTENT_TEXT,
                body: BUSY_BODY.into(),
            }
        }
    }
}

#[cfg(target_os = "espidf")]
pub use server::start;

#[cfg(target_os = "espidf")]
mod server {
    use esp_idf_svc::http::Method;
    use esp_idf_svc::http::server::{Configuration, EspHttpServer};
    use esp_idf_svc::io::Write;
    use esp_idf_svc::sys::EspError;
    use log::info;

    use super::bridge_response;
    use crate::bindings::channels::{HTTP_REQUESTS, HTTP_RESPONSES};
    use crate::bindings::http::{HttpResponse, ROUTE_PATHS};

    /// Start the server on `port`.  The returned handle must be kept alive.
    pub fn start(port: u16) -> Result<EspHttpServer<'static>, EspError> {
        let mut server = EspHttpServer::new(&Configuration {
            http_port: port,
            uri_match_wildcard: true,
            ..Default::default()
        })?;

        for path in ROUTE_PATHS {
            server.fn_handler(path, Method::Get, |req| -> anyhow::Result<()> {
                let response = bridge_response(&HTTP_REQUESTS, &HTTP_RESPONSES, req.uri());
                req.into_response(
                    response.status,
                    None,
                    &[("Content-Type", response.content_type)],
                )?
                .write_all(response.body.as_bytes())?;
                Ok(())
            })?;
        }

        // Registered last so the exact routes win.
        for method in [Method::Get, Method::Post, Method::Put, Method::Delete] {
            server.fn_handler("/*", method, |req| -> anyhow::Result<()> {
                let path = req.uri().split('?').next().unwrap_or_default();
                let response = HttpResponse::not_found(path);
                req.into_response(
                    response.status,
                    None,
                    &[("Content-Type", response.content_type)],
                )?
                .write_all(response.body.as_bytes())?;
                Ok(())
            })?;
        }

        info!("HTTP: listening on port {}", port);
        Ok(server)
    }
}
