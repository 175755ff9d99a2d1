// A scriptable in-memory radio for tests: backs every register file with
// flat byte storage, decodes address headers like the real chip, and
// reacts to the control writes the driver issues (TX start, RX enable,
// GPIO output) so timestamp and interrupt flows can be exercised without
// hardware.

use std::collections::{HashMap, VecDeque};

use crate::error::TransportError;
use crate::ll::{self, DecodedHeader};
use crate::registers::{self, RegisterDef};
use crate::transport::Transport;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct WriteRecord {
  pub file_id: u8,
  pub sub: u16,
  pub len: usize,
}

pub struct MockRadio {
  id: String,
  mem: HashMap<u8, Vec<u8>>,
  writes: Vec<WriteRecord>,
  interrupt: bool,
  /// Report an interrupt on every poll, as if the IRQ line were latched.
  pub auto_irq: bool,
  drop_replies: bool,
  /// Values latched into TX_TIME1 when a TXSTRT write arrives.
  pub tx_stamps: VecDeque<u64>,
  /// Values latched into RX_TIME1 when an RXENAB write arrives.
  pub rx_stamps: VecDeque<u64>,
  pub resets: u32,
}

impl MockRadio {
  pub fn new(id: &str) -> Self {
    let mut radio = MockRadio {
      id: id.to_string(),
      mem: HashMap::new(),
      writes: Vec::new(),
      interrupt: false,
      auto_irq: false,
      drop_replies: false,
      tx_stamps: VecDeque::new(),
      rx_stamps: VecDeque::new(),
      resets: 0,
    };
    radio.seed(&registers::DEV_ID, 0xDECA_0130);
    radio
  }

  /// Simulate a dead link: every transfer returns an empty response.
  pub fn drop_replies(&mut self, on: bool) {
    self.drop_replies = on;
  }

  /// Store a packed value at a register's location.
  pub fn seed(&mut self, reg: &RegisterDef, value: u64) {
    let bytes: Vec<u8> = (0..reg.len.min(8)).map(|n| (value >> (n * 8)) as u8).collect();
    self.store(reg.file_id, reg.sub.unwrap_or(0), &bytes);
  }

  /// Store raw bytes at a register's location (for buffers).
  pub fn seed_bytes(&mut self, reg: &RegisterDef, bytes: &[u8]) {
    self.store(reg.file_id, reg.sub.unwrap_or(0), bytes);
  }

  /// Current packed contents at a register's location.
  pub fn current(&self, reg: &RegisterDef) -> u64 {
    let sub = reg.sub.unwrap_or(0) as usize;
    let mut value = 0u64;
    if let Some(file) = self.mem.get(&reg.file_id) {
      for n in 0..reg.len.min(8) {
        let b = file.get(sub + n).copied().unwrap_or(0);
        value |= (b as u64) << (n * 8);
      }
    }
    value
  }

  /// Raw bytes at a register's location, for buffer registers whose
  /// declared length is only the address width.
  pub fn bytes(&self, reg: &RegisterDef, nbytes: usize) -> Vec<u8> {
    self.load(reg.file_id, reg.sub.unwrap_or(0), nbytes)
  }

  /// Number of writes that landed on a register's location.
  pub fn write_count(&self, reg: &RegisterDef) -> usize {
    let sub = reg.sub.unwrap_or(0);
    self
      .writes
      .iter()
      .filter(|w| w.file_id == reg.file_id && w.sub == sub)
      .count()
  }

  fn store(&mut self, file_id: u8, sub: u16, bytes: &[u8]) {
    let sub = sub as usize;
    let file = self.mem.entry(file_id).or_default();
    if file.len() < sub + bytes.len() {
      file.resize(sub + bytes.len(), 0);
    }
    file[sub..sub + bytes.len()].copy_from_slice(bytes);
  }

  fn load(&self, file_id: u8, sub: u16, nbytes: usize) -> Vec<u8> {
    let sub = sub as usize;
    (0..nbytes)
      .map(|n| {
        self
          .mem
          .get(&file_id)
          .and_then(|f| f.get(sub + n))
          .copied()
          .unwrap_or(0)
      })
      .collect()
  }

  fn on_write(&mut self, hdr: DecodedHeader, payload: &[u8]) {
    // SYS_CTRL: latch the next scripted timestamp on TX start / RX enable.
    if hdr.file_id == registers::SYS_CTRL.file_id && hdr.sub == 0 {
      if payload.first().copied().unwrap_or(0) & 0x02 != 0 {
        if let Some(stamp) = self.tx_stamps.pop_front() {
          let bytes: Vec<u8> = (0..5).map(|n| (stamp >> (n * 8)) as u8).collect();
          self.store(registers::TX_TIME1.file_id, 0, &bytes);
        }
      }
      if payload.get(1).copied().unwrap_or(0) & 0x01 != 0 {
        if let Some(stamp) = self.rx_stamps.pop_front() {
          let bytes: Vec<u8> = (0..5).map(|n| (stamp >> (n * 8)) as u8).collect();
          self.store(registers::RX_TIME1.file_id, 0, &bytes);
        }
      }
    }
    // GPIO_DOUT with GOP8 high: the IRQ pin is looped back.
    if hdr.file_id == registers::GPIO_DOUT.file_id
      && Some(hdr.sub) == registers::GPIO_DOUT.sub
      && payload.get(2).copied().unwrap_or(0) & 0x01 != 0
    {
      self.interrupt = true;
    }
  }
}

impl Transport for MockRadio {
  fn transfer(&mut self, tx: &[u8]) -> Result<Vec<u8>, TransportError> {
    if self.drop_replies {
      return Ok(Vec::new());
    }
    let Some(hdr) = ll::decode_header(tx) else {
      return Ok(vec![0; tx.len()]);
    };
    let payload_len = tx.len() - hdr.len;
    if hdr.write {
      let payload = &tx[hdr.len..];
      self.store(hdr.file_id, hdr.sub, payload);
      self.writes.push(WriteRecord {
        file_id: hdr.file_id,
        sub: hdr.sub,
        len: payload_len,
      });
      self.on_write(hdr, payload);
      Ok(vec![0; tx.len()])
    } else {
      let mut resp = vec![0; hdr.len];
      resp.extend(self.load(hdr.file_id, hdr.sub, payload_len));
      Ok(resp)
    }
  }

  fn reset(&mut self, assert: bool) -> Result<(), TransportError> {
    if assert {
      self.resets += 1;
    }
    Ok(())
  }

  fn interrupt_pending(&mut self) -> bool {
    self.auto_irq || self.interrupt
  }

  fn clear_interrupt(&mut self) {
    self.interrupt = false;
  }

  fn id(&self) -> &str {
    &self.id
  }
}
