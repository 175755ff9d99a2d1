// Wire protocol for the tunneled SPI link.
//
// Every SPI command travels over UDP framed as [seq, len, cmd_bytes...].
// The board-side server replies with [seq, len, response_bytes...] where the
// first SPI response byte of a read has been rewritten to ANS_VAL. A
// unilateral IRQ notification is the 3-byte datagram [0, 1, IRQ_VAL].
//
// Both the host transport and the tunnel server use these definitions, so
// the framing cannot drift between the two ends.

/// Bytes of framing (sequence number + block length) ahead of each command.
pub const SEQ_LEN: usize = 2;

/// First response byte of a tunneled register read.
pub const ANS_VAL: u8 = 0xAA;

/// Payload of an interrupt notification datagram.
pub const IRQ_VAL: u8 = 0xFE;

/// Single-byte command asserting the radio's hardware reset line.
/// Any other single-byte command releases it.
pub const RESET_VAL: u8 = 0xFF;

/// Upper bound on a tunnel datagram.
pub const MAX_DATAGRAM: usize = 2048;

/// Resend attempts before a transfer is reported as lost.
pub const RETRIES: u32 = 3;

/// The interrupt notification datagram, sent by the server when the radio
/// raises its IRQ line.
pub const fn irq_notification() -> [u8; 3] {
  [0, 1, IRQ_VAL]
}

/// True if a received datagram is an IRQ notification rather than a reply.
pub fn is_irq_notification(data: &[u8]) -> bool {
  data.len() == SEQ_LEN + 1 && data[SEQ_LEN] == IRQ_VAL
}

/// Render bytes as space-separated uppercase hex, for traffic logging.
pub fn hex_bytes(data: &[u8]) -> String {
  let mut s = String::with_capacity(data.len() * 3);
  for (n, b) in data.iter().enumerate() {
    if n > 0 {
      s.push(' ');
    }
    s.push_str(&format!("{b:02X}"));
  }
  s
}
