//! Polled serial port abstraction
//!
//! Both payload links speak over an unframed byte pipe that is polled
//! from a cooperative service loop: the driver drains whatever has
//! arrived since the last tick and writes complete commands only when
//! the transmit side can take them whole.

/// A non-blocking byte source/sink.
///
/// All methods must return immediately. Reads and writes never block;
/// `write` reports how many bytes were actually accepted so callers can
/// detect a short write (the drivers check [`tx_space`](Self::tx_space)
/// first and never attempt partial commands).
pub trait SerialPort {
    /// Error type for transport-level faults
    type Error;

    /// Number of bytes waiting to be read.
    ///
    /// An `Err` is the transport-fault signal (the underlying driver
    /// reported a negative count or lost the port); the caller must
    /// abandon the current service pass without corrupting its state.
    fn available(&mut self) -> Result<usize, Self::Error>;

    /// Read one byte, or `None` if nothing is waiting.
    fn read_byte(&mut self) -> Option<u8>;

    /// Number of bytes the transmit side can accept right now.
    fn tx_space(&mut self) -> usize;

    /// Write bytes, returning how many were accepted.
    fn write(&mut self, data: &[u8]) -> usize;
}
