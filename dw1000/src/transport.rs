// The byte-transfer contract the driver needs from an SPI link.
//
// The driver does not care whether the bus is local or tunneled over a
// network; it needs a full-duplex transfer, control of the chip's reset
// line, and visibility of the IRQ line. A tunneled implementation may
// lose a datagram: after its internal retries are exhausted it returns an
// empty response, which register reads decode as zero and the ranging
// layer treats as a missed frame.

use crate::error::TransportError;

pub trait Transport {
  /// Full-duplex transfer: clock out `tx`, return what the device clocked
  /// back. The response has the same length as `tx`, or is empty when a
  /// tunneled link timed out after its retries.
  fn transfer(&mut self, tx: &[u8]) -> Result<Vec<u8>, TransportError>;

  /// Assert or release the chip's hardware reset line.
  fn reset(&mut self, assert: bool) -> Result<(), TransportError>;

  /// True if the radio has raised IRQ since the flag was last cleared.
  /// Implementations may poll their notification source here.
  fn interrupt_pending(&mut self) -> bool;

  /// Acknowledge the interrupt at the transport level. The latched event
  /// bits in the radio itself are cleared separately via SYS_STATUS.
  fn clear_interrupt(&mut self);

  /// Short tag naming this link in diagnostics.
  fn id(&self) -> &str;
}
