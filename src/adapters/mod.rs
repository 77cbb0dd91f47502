//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter       | Implements        | Connects to                  |
//! |---------------|-------------------|------------------------------|
//! | `hardware`    | StepperPort       | `StepperDriver` over GPIO    |
//! | `log_sink`    | EventSink         | Serial log output            |
//! | `time`        | TimePort          | ESP32 high-resolution timer  |
//! | `uart`        | Transport         | UART1 command port           |
//! | `http_server` | (bridge)          | ESP-IDF httpd                |
//! | `wifi`        | ConnectivityPort  | ESP-IDF WiFi STA             |
//! | `mdns`        |                   | ESP-IDF mDNS responder       |

pub mod hardware;
pub mod http_server;
pub mod log_sink;
pub mod mdns;
pub mod time;
pub mod uart;
pub(super) mod utils;
pub mod wifi;
