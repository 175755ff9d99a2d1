// UDP-tunneled SPI transport.
//
// Wraps each SPI command in the [seq, len, cmd...] framing from `common`
// and pairs it with the matching reply. Datagrams can be lost in either
// direction: the command is resent until a reply with the right sequence
// number arrives or the retry budget runs out, in which case the transfer
// reports an empty response and the ranging layer counts a missed frame.
// The server deduplicates by sequence number, so a resend never
// double-executes a command.
//
// IRQ notifications arrive on the same socket at any time; whichever recv
// happens to see one latches it into the interrupt flag.

use std::io::ErrorKind;
use std::net::UdpSocket;
use std::time::Duration;

use common::{ANS_VAL, MAX_DATAGRAM, RETRIES, SEQ_LEN, hex_bytes, is_irq_notification};
use dw1000::error::TransportError;
use dw1000::transport::Transport;
use log::{debug, warn};

/// Socket read timeout; also how long one interrupt poll may block.
const SOCK_TIMEOUT: Duration = Duration::from_millis(50);

pub struct UdpTunnel {
  sock: UdpSocket,
  id: String,
  seq: u8,
  interrupt: bool,
}

impl UdpTunnel {
  /// Bind an ephemeral local port and aim it at a tunnel server.
  pub fn connect(addr: &str, id: &str) -> std::io::Result<Self> {
    let sock = UdpSocket::bind(("0.0.0.0", 0))?;
    sock.connect(addr)?;
    sock.set_read_timeout(Some(SOCK_TIMEOUT))?;
    debug!("{id} connected to {addr}");
    Ok(UdpTunnel { sock, id: id.to_string(), seq: 0, interrupt: false })
  }

  /// Sequence numbers cycle 1..=255 after the initial 0; 0 is reserved
  /// for the server's unsolicited notifications.
  fn next_seq(&mut self) -> u8 {
    let seq = self.seq;
    self.seq = (self.seq % 255) + 1;
    seq
  }

  /// One bounded receive. `None` on timeout.
  fn recv(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
    let mut buf = [0u8; MAX_DATAGRAM];
    match self.sock.recv(&mut buf) {
      Ok(n) => Ok(Some(buf[..n].to_vec())),
      Err(e) if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::TimedOut => Ok(None),
      Err(e) => Err(e.into()),
    }
  }

  /// Receive until a reply or timeout, absorbing IRQ notifications into
  /// the interrupt flag along the way.
  fn recv_reply(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
    loop {
      match self.recv()? {
        None => return Ok(None),
        Some(data) if is_irq_notification(&data) => {
          debug!("{} irq", self.id);
          self.interrupt = true;
        }
        Some(data) => return Ok(Some(data)),
      }
    }
  }
}

impl Transport for UdpTunnel {
  fn transfer(&mut self, tx: &[u8]) -> Result<Vec<u8>, TransportError> {
    let seq = self.next_seq();
    let mut frame = Vec::with_capacity(SEQ_LEN + tx.len());
    frame.push(seq);
    frame.push(tx.len() as u8);
    frame.extend_from_slice(tx);

    debug!("{} tx {}", self.id, hex_bytes(&frame));
    self.sock.send(&frame)?;

    let mut retries = RETRIES;
    loop {
      match self.recv_reply()? {
        Some(reply) if reply.len() > SEQ_LEN => {
          if reply[0] != seq {
            // Stale reply from an earlier retry; keep waiting.
            continue;
          }
          debug!("{} rx {}", self.id, hex_bytes(&reply));
          if reply[SEQ_LEN] != ANS_VAL {
            // Reset acknowledgements and the like carry no payload.
            return Ok(Vec::new());
          }
          return Ok(reply[SEQ_LEN..].to_vec());
        }
        _ => {
          if retries == 0 {
            warn!("{} no reply for seq {seq}", self.id);
            return Ok(Vec::new());
          }
          retries -= 1;
          self.sock.send(&frame)?;
        }
      }
    }
  }

  fn reset(&mut self, assert: bool) -> Result<(), TransportError> {
    let cmd = if assert { common::RESET_VAL } else { 0x00 };
    // The acknowledgement carries no payload; losing it is harmless
    // because the next transfer resynchronises.
    self.transfer(&[cmd])?;
    Ok(())
  }

  fn interrupt_pending(&mut self) -> bool {
    if !self.interrupt {
      // Give a pending notification one socket timeout to arrive.
      if let Ok(Some(data)) = self.recv() {
        if is_irq_notification(&data) {
          self.interrupt = true;
        }
      }
    }
    self.interrupt
  }

  fn clear_interrupt(&mut self) {
    self.interrupt = false;
  }

  fn id(&self) -> &str {
    &self.id
  }
}
