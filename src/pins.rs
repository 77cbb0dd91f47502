//! GPIO / peripheral pin assignments for the focuser main board.
//!
//! Single source of truth: `main` takes every output from here rather than
//! hard-coding pin numbers.
//!
//! Only one motor interface is populated on a given board, so the four-wire
//! and step/dir outputs are allowed to be fitted side by side.

// ---------------------------------------------------------------------------
// Four-wire stepper (ULN2003 darlington array, 28BYJ-48 class motor)
// ---------------------------------------------------------------------------

pub const COIL_IN1_GPIO: i32 = 5;
pub const COIL_IN2_GPIO: i32 = 4;
pub const COIL_IN3_GPIO: i32 = 14;
pub const COIL_IN4_GPIO: i32 = 12;

/// Coil outputs in energising order.  The ULN2003 board numbers its inputs
/// so that the full-step sequence runs IN1, IN3, IN2, IN4.
pub const COIL_SEQUENCE_GPIOS: [i32; 4] =
    [COIL_IN1_GPIO, COIL_IN3_GPIO, COIL_IN2_GPIO, COIL_IN4_GPIO];

// ---------------------------------------------------------------------------
// Step / direction driver (A4988, DRV8825)
// ---------------------------------------------------------------------------

/// Rising edge advances one step.
pub const STEP_GPIO: i32 = 9;
/// HIGH = forward (increasing position), LOW = reverse.
pub const DIR_GPIO: i32 = 8;

// ---------------------------------------------------------------------------
// UART command port (host PC / ASCOM driver)
// ---------------------------------------------------------------------------

pub const UART_TX_GPIO: i32 = 17;
pub const UART_RX_GPIO: i32 = 18;

/// RX ring buffer handed to the UART driver.
pub const UART_RX_BUFFER: usize = 256;

/// TX ring buffer.  With no ring every write waits for the wire; ESP-IDF
/// only accepts rings larger than the 128-byte hardware FIFO.
pub const UART_TX_BUFFER: usize = 256;
const _: () = assert!(UART_TX_BUFFER > 128);
