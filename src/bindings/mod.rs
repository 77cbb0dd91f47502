//! Transport bindings.
//!
//! Each binding turns one kind of external input into [`Command`]s for
//! the [`FocuserService`] and renders its [`Reply`] back out.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                    Command bindings                        │
//! │                                                            │
//! │  ┌───────────┐   ┌─────────────┐   ┌───────────────────┐  │
//! │  │ Transport │──▶│ LineDecoder │──▶│  SerialBinding    │──┼─▶ FocuserService
//! │  │  (UART)   │   │  (\n lines) │   │  M / P / R / S / D│  │
//! │  └───────────┘   └─────────────┘   └───────────────────┘  │
//! │                                                            │
//! │  ┌───────────┐   ┌─────────────┐   ┌───────────────────┐  │
//! │  │  httpd    │──▶│  channels   │──▶│  HttpBinding      │──┼─▶ FocuserService
//! │  │  task     │   │  (bridge)   │   │  /move /stop ...  │  │
//! │  └───────────┘   └─────────────┘   └───────────────────┘  │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! [`Command`]: crate::app::commands::Command
//! [`FocuserService`]: crate::app::service::FocuserService
//! [`Reply`]: crate::app::service::Reply

pub mod channels;
pub mod http;
pub mod line;
pub mod serial;
pub mod transport;
