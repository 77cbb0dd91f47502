//! LNA Focuser Firmware: Main Entry Point
//!
//! Hexagonal architecture around a single-axis stepper motion engine.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter   LogEventSink   Esp32Time      UartTransport │
//! │  (StepperPort)     (EventSink)    (TimePort)     (Transport)   │
//! │  WifiAdapter       MdnsAdapter    http_server                  │
//! │  (Connectivity)    (_http._tcp)   (httpd task → channels)      │
//! │                                                                │
//! │  ─────────────── Binding / Port Trait Boundary ──────────      │
//! │                                                                │
//! │  SerialBinding (M/P/R/S/D lines)   HttpBinding (GET routes)    │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │           FocuserService → MotionEngine                │    │
//! │  │           (trapezoidal profile, one step per tick)     │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The control loop owns the service and is the only caller of `tick()`.
//! It never sleeps while the axis is moving; step timing is bounded by
//! how fast the loop comes round.
#![deny(unused_must_use)]

mod esp_link_shims;

// ── Imports ───────────────────────────────────────────────────
use anyhow::Result;
use esp_idf_hal::delay::{Ets, FreeRtos};
use esp_idf_hal::gpio::{AnyIOPin, AnyOutputPin, Output, PinDriver};
use esp_idf_hal::modem::Modem;
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::uart::{self, UART1, UartDriver};
use esp_idf_hal::units::Hertz;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::sys::EspError;
use log::{info, warn};

use focuser::adapters::hardware::HardwareAdapter;
use focuser::adapters::http_server;
use focuser::adapters::log_sink::LogEventSink;
use focuser::adapters::mdns::MdnsAdapter;
use focuser::adapters::time::Esp32TimeAdapter;
use focuser::adapters::uart::UartTransport;
use focuser::adapters::wifi::{ConnectivityPort, WifiAdapter, build_station};
use focuser::app::service::FocuserService;
use focuser::bindings::channels::{HTTP_REQUESTS, HTTP_RESPONSES, serve_pending};
use focuser::bindings::http::HttpBinding;
use focuser::bindings::serial::SerialBinding;
use focuser::config::{FocuserConfig, MotorInterface, TransportKind};
use focuser::diagnostics::LoopStats;
use focuser::drivers::stepper::{FourWireDriver, StepDirDriver, StepperDriver};
use focuser::error::Error;
use focuser::pins;

/// Radio and UART peripherals the transports need.
struct Comms {
    uart: UART1,
    modem: Modem,
}

fn main() -> Result<()> {
    // ── 1. Platform bootstrap ─────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║   LNA Focuser Firmware v{}        ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Configuration ──────────────────────────────────────
    let config = FocuserConfig::from_build_env();
    config.validate().map_err(Error::from)?;
    info!("Config: {}", config.to_log_json());

    // ── 3. Peripherals ────────────────────────────────────────
    let peripherals = Peripherals::take()?;
    let comms = Comms {
        uart: peripherals.uart1,
        modem: peripherals.modem,
    };

    // ── 4. Motor driver ───────────────────────────────────────
    match config.motor_interface {
        MotorInterface::FourWire => {
            let [a, b, c, d] = pins::COIL_SEQUENCE_GPIOS;
            let coils = [output_pin(a)?, output_pin(b)?, output_pin(c)?, output_pin(d)?];
            info!("Motor: four-wire on GPIO {:?}", pins::COIL_SEQUENCE_GPIOS);
            run(&config, FourWireDriver::new(coils), comms)
        }
        MotorInterface::StepDir => {
            let step = output_pin(pins::STEP_GPIO)?;
            let dir = output_pin(pins::DIR_GPIO)?;
            info!("Motor: step/dir on GPIO {}/{}", pins::STEP_GPIO, pins::DIR_GPIO);
            run(&config, StepDirDriver::new(step, dir, Ets), comms)
        }
    }
}

fn output_pin(gpio: i32) -> Result<PinDriver<'static, AnyOutputPin, Output>, EspError> {
    // SAFETY: every GPIO in `pins` is claimed exactly once, here, at boot.
    PinDriver::output(unsafe { AnyOutputPin::new(gpio) })
}

fn run<M: StepperDriver>(config: &FocuserConfig, motor: M, comms: Comms) -> Result<()> {
    // ── 5. Construct adapters and service ─────────────────────
    let mut hw = HardwareAdapter::new(motor);
    let clock = Esp32TimeAdapter::new();
    let mut sink = LogEventSink::new();

    let mut service = FocuserService::new(config)?;
    service.start(&mut sink);

    match config.transport {
        TransportKind::Serial => serve_serial(config, comms.uart, service, hw, clock, sink),
        TransportKind::Http => serve_http(config, comms.modem, service, hw, clock, sink),
    }
}

// ── 6a. Serial control loop ───────────────────────────────────
fn serve_serial<M: StepperDriver>(
    config: &FocuserConfig,
    uart1: UART1,
    mut service: FocuserService,
    mut hw: HardwareAdapter<M>,
    clock: Esp32TimeAdapter,
    mut sink: LogEventSink,
) -> Result<()> {
    // SAFETY: the UART GPIOs are claimed only here.
    let (tx, rx) = unsafe {
        (
            AnyIOPin::new(pins::UART_TX_GPIO),
            AnyIOPin::new(pins::UART_RX_GPIO),
        )
    };
    let driver = UartDriver::new(
        uart1,
        tx,
        rx,
        Option::<AnyIOPin>::None,
        Option::<AnyIOPin>::None,
        &uart::config::Config::new()
            .baudrate(Hertz(config.serial_baud))
            .rx_fifo_size(pins::UART_RX_BUFFER)
            .tx_fifo_size(pins::UART_TX_BUFFER),
    )?;
    let mut port = UartTransport::new(driver);
    let mut binding = SerialBinding::new(config.parse_mode, config.duration_command);
    let mut stats = LoopStats::new(clock.uptime_us());

    info!("Serial: {} baud, entering control loop", config.serial_baud);

    loop {
        let handled = binding.poll(&mut port, &mut service, &mut hw, &clock, &mut sink);
        let moving = service.tick(&mut hw, &clock, &mut sink);

        let now = clock.uptime_us();
        stats.record_tick(now);
        stats.record_commands(handled);
        stats.record_faults(hw.faults(), binding.write_errors());
        stats.maybe_report(now, config.stats_interval_secs);

        if !moving && handled == 0 {
            FreeRtos::delay_ms(1);
        }
    }
}

// ── 6b. HTTP control loop ─────────────────────────────────────
fn serve_http<M: StepperDriver>(
    config: &FocuserConfig,
    modem: Modem,
    mut service: FocuserService,
    mut hw: HardwareAdapter<M>,
    clock: Esp32TimeAdapter,
    mut sink: LogEventSink,
) -> Result<()> {
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;
    let station = build_station(modem, sysloop, Some(nvs), config.static_ip.as_ref())?;

    let mut wifi = WifiAdapter::new(station);
    wifi.set_credentials(&config.wifi_ssid, &config.wifi_password)
        .map_err(|e| anyhow::anyhow!("WiFi: {}", e))?;
    if let Err(e) = wifi.connect() {
        warn!("WiFi: initial connect failed ({}), will retry", e);
    }
    if let Some(ip) = wifi.ip_addr() {
        info!("WiFi: address {}", ip);
    }

    let mut mdns = MdnsAdapter::new(&config.hostname, config.http_port).map_err(Error::from)?;
    sync_mdns(&wifi, &mut mdns);

    let _server = http_server::start(config.http_port)?;
    let binding = HttpBinding::new(config.parse_mode);
    let mut stats = LoopStats::new(clock.uptime_us());
    let mut last_wifi_poll_secs = clock.uptime_secs();

    info!("HTTP: entering control loop");

    loop {
        let served = serve_pending(
            &HTTP_REQUESTS,
            &HTTP_RESPONSES,
            &binding,
            &mut service,
            &mut hw,
            &clock,
            &mut sink,
        );
        let moving = service.tick(&mut hw, &clock, &mut sink);

        let now = clock.uptime_us();
        stats.record_tick(now);
        stats.record_commands(usize::from(served));
        stats.record_faults(hw.faults(), 0);
        stats.maybe_report(now, config.stats_interval_secs);

        if moving {
            continue;
        }

        // Reconnects block for the association time; only at rest.
        let now_secs = now / 1_000_000;
        if now_secs != last_wifi_poll_secs {
            last_wifi_poll_secs = now_secs;
            wifi.poll(now_secs);
            sync_mdns(&wifi, &mut mdns);
        }

        if !served {
            FreeRtos::delay_ms(1);
        }
    }
}

fn sync_mdns(wifi: &WifiAdapter, mdns: &mut MdnsAdapter) {
    match (wifi.is_connected(), mdns.is_active()) {
        (true, false) => {
            if let Err(e) = mdns.start() {
                warn!("mDNS: {}", e);
            }
        }
        (false, true) => mdns.stop(),
        _ => {}
    }
}
