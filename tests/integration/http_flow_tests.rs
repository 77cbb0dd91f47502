//! HTTP/JSON binding, end to end.
//!
//! Requests are answered by `HttpBinding` directly, and once through the
//! bridge channels with the server side on its own thread, the way the
//! ESP-IDF httpd task talks to the control loop.

use focuser::adapters::http_server::bridge_response;
use focuser::app::commands::{ParseError, ParseMode};
use focuser::app::events::AppEvent;
use focuser::app::service::FocuserService;
use focuser::bindings::channels::{RequestChannel, ResponseChannel, serve_pending};
use focuser::bindings::http::{
    CONTENT_HTML, CONTENT_JSON, CONTENT_TEXT, HttpBinding, HttpResponse, INVALID_COMMAND,
    WELCOME_BANNER,
};
use focuser::config::FocuserConfig;

use super::mock_hw::{MockMotor, RecordingSink, SimClock};

struct Rig {
    service: FocuserService,
    binding: HttpBinding,
    hw: MockMotor,
    clock: SimClock,
    sink: RecordingSink,
}

impl Rig {
    fn new(mode: ParseMode) -> Self {
        let config = FocuserConfig {
            parse_mode: mode,
            ..FocuserConfig::wifi()
        };
        let mut sink = RecordingSink::new();
        let mut service = FocuserService::new(&config).unwrap();
        service.start(&mut sink);
        Self {
            service,
            binding: HttpBinding::new(config.parse_mode),
            hw: MockMotor::new(),
            clock: SimClock::default(),
            sink,
        }
    }

    fn get(&mut self, uri: &str) -> HttpResponse {
        self.binding
            .handle(uri, &mut self.service, &mut self.hw, &self.clock, &mut self.sink)
    }
}

fn message(r: &HttpResponse) -> String {
    let v: serde_json::Value = serde_json::from_str(&r.body).unwrap();
    assert_eq!(v["status"], "success");
    v["message"].as_str().unwrap().to_owned()
}

// ── Routes ────────────────────────────────────────────────────

#[test]
fn move_blocks_until_arrival() {
    let mut rig = Rig::new(ParseMode::Lenient);

    let r = rig.get("/move?steps=M150");
    assert_eq!(r.status, 200);
    assert_eq!(r.content_type, CONTENT_JSON);
    assert_eq!(message(&r), "Moved to position: 150");

    assert_eq!(rig.service.position(), 150);
    assert!(!rig.service.is_running());
    assert_eq!(rig.hw.steps(), 150);
    assert_eq!(rig.sink.arrivals(), vec![150]);
    assert!(rig.hw.released());
}

#[test]
fn position_and_running_are_string_messages() {
    let mut rig = Rig::new(ParseMode::Lenient);
    rig.get("/move?steps=M-30");

    assert_eq!(message(&rig.get("/position")), "-30");
    assert_eq!(message(&rig.get("/isrunning")), "0");
}

#[test]
fn stop_at_rest_reports_stopped() {
    let mut rig = Rig::new(ParseMode::Lenient);
    let r = rig.get("/stop");
    assert_eq!(message(&r), "Stopped");
    assert_eq!(rig.service.position(), 0);
}

#[test]
fn root_serves_welcome_banner() {
    let mut rig = Rig::new(ParseMode::Lenient);
    let r = rig.get("/");
    assert_eq!(r.status, 200);
    assert_eq!(r.content_type, CONTENT_HTML);
    assert_eq!(r.body, WELCOME_BANNER);
}

#[test]
fn unknown_path_is_404() {
    let mut rig = Rig::new(ParseMode::Lenient);
    let r = rig.get("/focus?steps=M1");
    assert_eq!(r.status, 404);
    assert_eq!(r.content_type, CONTENT_TEXT);
    assert_eq!(r.body, "Not found: /focus");
}

// ── Malformed moves ───────────────────────────────────────────

#[test]
fn move_without_m_prefix_is_rejected_and_state_unchanged() {
    let mut rig = Rig::new(ParseMode::Lenient);
    rig.get("/move?steps=M20");
    let before = rig.service.state();

    let r = rig.get("/move?steps=X100");
    assert_eq!(r.status, 400);
    assert_eq!(r.content_type, CONTENT_TEXT);
    assert_eq!(r.body, INVALID_COMMAND);

    assert_eq!(rig.service.state(), before);
    assert!(
        rig.sink
            .events
            .contains(&AppEvent::CommandRejected(ParseError::MissingPrefix))
    );
}

#[test]
fn missing_steps_parameter_is_rejected() {
    let mut rig = Rig::new(ParseMode::Lenient);
    assert_eq!(rig.get("/move").status, 400);
    assert_eq!(rig.get("/move?speed=M5").status, 400);
    assert_eq!(rig.hw.steps(), 0);
}

#[test]
fn trailing_garbage_depends_on_parse_mode() {
    let mut lenient = Rig::new(ParseMode::Lenient);
    assert_eq!(message(&lenient.get("/move?steps=M12abc")), "Moved to position: 12");
    assert_eq!(lenient.service.position(), 12);

    let mut strict = Rig::new(ParseMode::Strict);
    assert_eq!(strict.get("/move?steps=M12abc").status, 400);
    assert_eq!(strict.service.position(), 0);
}

#[test]
fn percent_encoded_sign_is_decoded() {
    let mut rig = Rig::new(ParseMode::Strict);
    assert_eq!(message(&rig.get("/move?steps=M%2D7")), "Moved to position: -7");
}

// ── Bridge ────────────────────────────────────────────────────

#[test]
fn bridge_carries_request_and_reply_across_threads() {
    let requests = RequestChannel::new();
    let responses = ResponseChannel::new();
    let mut rig = Rig::new(ParseMode::Lenient);

    let reply = std::thread::scope(|s| {
        let server = s.spawn(|| bridge_response(&requests, &responses, "/move?steps=M40"));

        let mut served = false;
        for _ in 0..1_000_000 {
            if serve_pending(
                &requests,
                &responses,
                &rig.binding,
                &mut rig.service,
                &mut rig.hw,
                &rig.clock,
                &mut rig.sink,
            ) {
                served = true;
                break;
            }
            std::thread::yield_now();
        }
        assert!(served, "request never reached the control loop");
        server.join().unwrap()
    });

    assert_eq!(reply.status, 200);
    assert_eq!(message(&reply), "Moved to position: 40");
    assert_eq!(rig.service.position(), 40);
}

#[test]
fn nothing_pending_serves_nothing() {
    let requests = RequestChannel::new();
    let responses = ResponseChannel::new();
    let mut rig = Rig::new(ParseMode::Lenient);
    assert!(!serve_pending(
        &requests,
        &responses,
        &rig.binding,
        &mut rig.service,
        &mut rig.hw,
        &rig.clock,
        &mut rig.sink,
    ));
}
