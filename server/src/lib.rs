// Tunnel-server protocol state machine.
//
// The board next to the radio runs this logic against the real SPI bus and
// GPIO pins. A request datagram is [seq, len, cmd...], in general a
// sequence of length-prefixed command blocks after the sequence byte. The
// reply is [seq, len, response...] with one length-prefixed response per
// block. A repeated sequence number means the previous reply was lost in
// flight: the cached reply is resent and no SPI transaction is re-issued,
// so retries cannot double-execute a command.
//
// Single-byte blocks drive the reset line (RESET_VAL asserts, anything
// else releases). For register reads the first SPI response byte is
// rewritten to ANS_VAL so the host can tell a reply from line noise.

use common::{ANS_VAL, RESET_VAL, SEQ_LEN, irq_notification};
use log::debug;

/// The board-side SPI bus and reset pin, as the protocol needs them.
/// Implemented over spidev/GPIO on the real board and mocked in tests.
pub trait RadioPort {
  /// Full-duplex SPI transfer; returns one byte per byte sent.
  fn transfer(&mut self, data: &[u8]) -> Vec<u8>;

  /// Drive the radio's hardware reset line.
  fn set_reset(&mut self, assert: bool);
}

pub struct TunnelServer<P> {
  port: P,
  /// Last reply sent, kept for retransmission. First byte is its seq.
  reply: Vec<u8>,
}

impl<P: RadioPort> TunnelServer<P> {
  pub fn new(port: P) -> Self {
    TunnelServer { port, reply: Vec::new() }
  }

  /// The datagram announcing a rising IRQ edge to the host.
  pub fn irq_datagram(&self) -> [u8; 3] {
    irq_notification()
  }

  /// Process one request datagram; returns the reply to send, if any.
  pub fn handle(&mut self, data: &[u8]) -> Option<Vec<u8>> {
    if data.len() <= SEQ_LEN {
      return None;
    }

    // Duplicate of the last request: the host never saw our reply.
    if !self.reply.is_empty() && data[0] == self.reply[0] {
      debug!("resend seq {}", data[0]);
      return Some(self.reply.clone());
    }

    let mut out = vec![data[0]];
    let mut rest = &data[1..];
    while rest.len() > 1 && rest.len() > rest[0] as usize {
      let n = rest[0] as usize;
      let block = &rest[1..1 + n];
      rest = &rest[1 + n..];

      let resp = if n == 1 {
        self.port.set_reset(block[0] == RESET_VAL);
        vec![block[0]]
      } else {
        let mut resp = self.port.transfer(block);
        // Mark read replies so the host can validate them.
        if block[0] & 0x80 == 0 && !resp.is_empty() {
          resp[0] = ANS_VAL;
        }
        resp
      };
      out.push(resp.len() as u8);
      out.extend(resp);
    }

    if out.len() > 1 {
      self.reply = out.clone();
      Some(out)
    } else {
      None
    }
  }
}
