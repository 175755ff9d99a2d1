// Low-level register access for the DW1000.
//
// Implements the DW1000 SPI transaction format:
//   byte 0: [W/R][SUB][ID5:0]           — write flag, sub-index flag, file ID
//   byte 1: [EXT][SUB6:0]               — only when a sub-index is present
//   byte 2: [SUB14:7]                   — only when the sub-index is >= 0x80
//
// A read clocks out zeros for the payload; a write follows the header with
// the little-endian payload bytes.
//
// Reference: DW1000 User Manual, Section 2 — The SPI Interface.

use log::trace;

use crate::error::{Error, TransportError};
use crate::registers::RegisterDef;
use crate::transport::Transport;

/// Build the 1–3 byte address header for a register access.
pub fn addr_header(reg: &RegisterDef, write: bool) -> Vec<u8> {
  let rw = if write { 0x80 } else { 0x00 };
  match reg.sub {
    None => vec![rw | reg.file_id],
    Some(sub) if sub < 0x80 => vec![rw | 0x40 | reg.file_id, sub as u8],
    Some(sub) => vec![
      rw | 0x40 | reg.file_id,
      0x80 | (sub & 0x7F) as u8,
      (sub >> 7) as u8,
    ],
  }
}

/// A decoded address header, as seen by the far end of the link.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct DecodedHeader {
  pub write: bool,
  pub file_id: u8,
  pub sub: u16,
  pub len: usize,
}

/// Decode the header at the front of an SPI command. Returns `None` for a
/// command too short to carry its own header.
pub fn decode_header(data: &[u8]) -> Option<DecodedHeader> {
  let b0 = *data.first()?;
  let write = b0 & 0x80 != 0;
  let file_id = b0 & 0x3F;
  if b0 & 0x40 == 0 {
    return Some(DecodedHeader { write, file_id, sub: 0, len: 1 });
  }
  let b1 = *data.get(1)?;
  if b1 & 0x80 == 0 {
    return Some(DecodedHeader { write, file_id, sub: b1 as u16, len: 2 });
  }
  let b2 = *data.get(2)?;
  Some(DecodedHeader {
    write,
    file_id,
    sub: (b1 & 0x7F) as u16 | ((b2 as u16) << 7),
    len: 3,
  })
}

fn field_mask(width: u32) -> u64 {
  u64::MAX >> (64 - width.min(64))
}

fn xfer<T: Transport>(t: &mut T, tx: &[u8]) -> Result<Vec<u8>, Error> {
  t.transfer(tx).map_err(|source| wrap_transport(t, source))
}

pub(crate) fn wrap_transport<T: Transport>(t: &T, source: TransportError) -> Error {
  Error::Transport { id: t.id().to_string(), source }
}

/// A register value bound to its descriptor: a cached 64-bit packed word
/// with named field access, and read/write against a transport.
///
/// Reading then writing back without touching any field is an identity,
/// which is how latched status registers are cleared. Reserved (`X`)
/// fields ride along unchanged through read-modify-write.
#[derive(Clone, Debug)]
pub struct RegisterValue {
  def: &'static RegisterDef,
  value: u64,
}

impl RegisterValue {
  pub fn new(def: &'static RegisterDef) -> Self {
    RegisterValue { def, value: 0 }
  }

  /// Start from a known packed value instead of zero.
  pub fn with_value(def: &'static RegisterDef, value: u64) -> Self {
    RegisterValue { def, value }
  }

  pub fn def(&self) -> &'static RegisterDef {
    self.def
  }

  /// The packed register word. Registers longer than 8 bytes cache only
  /// their first 64 bits.
  pub fn value(&self) -> u64 {
    self.value
  }

  /// Get a named field out of the cached word.
  pub fn field(&self, name: &'static str) -> Result<u64, Error> {
    let (offset, width) = self
      .def
      .field_span(name)
      .ok_or(Error::UnknownField { register: self.def.name, field: name })?;
    Ok((self.value >> offset) & field_mask(width))
  }

  /// Set a named field in the cached word. Chainable; fails if the field
  /// is unknown or the value does not fit its width.
  pub fn set(&mut self, name: &'static str, value: u64) -> Result<&mut Self, Error> {
    let (offset, width) = self
      .def
      .field_span(name)
      .ok_or(Error::UnknownField { register: self.def.name, field: name })?;
    let mask = field_mask(width);
    if value & !mask != 0 {
      return Err(Error::FieldOverflow {
        register: self.def.name,
        field: name,
        width,
        value,
      });
    }
    self.value = (self.value & !(mask << offset)) | (value << offset);
    Ok(self)
  }

  /// Convenience for one-bit flags.
  pub fn set_flag(&mut self, name: &'static str, on: bool) -> Result<&mut Self, Error> {
    self.set(name, on as u64)
  }

  /// Read the register, replacing the cached word. The response payload
  /// (bytes after the header) is packed little-endian; a short or empty
  /// response packs as zero.
  pub fn read<T: Transport>(&mut self, t: &mut T) -> Result<&mut Self, Error> {
    let len = self.def.len;
    self.read_n(t, len)
  }

  /// Read with an explicit byte count.
  pub fn read_n<T: Transport>(&mut self, t: &mut T, nbytes: usize) -> Result<&mut Self, Error> {
    let mut tx = addr_header(self.def, false);
    let hdr_len = tx.len();
    tx.resize(hdr_len + nbytes, 0);
    let resp = xfer(t, &tx)?;
    self.value = 0;
    let payload = resp.get(hdr_len..).unwrap_or(&[]);
    for (n, b) in payload.iter().take(8).enumerate() {
      self.value |= (*b as u64) << (n * 8);
    }
    Ok(self)
  }

  /// Write the cached word to the register.
  pub fn write<T: Transport>(&self, t: &mut T) -> Result<(), Error> {
    self.write_n(t, self.def.len)
  }

  /// Write with an explicit byte count.
  pub fn write_n<T: Transport>(&self, t: &mut T, nbytes: usize) -> Result<(), Error> {
    let mut tx = addr_header(self.def, true);
    for n in 0..nbytes {
      let b = if n < 8 { (self.value >> (n * 8)) as u8 } else { 0 };
      tx.push(b);
    }
    xfer(t, &tx)?;
    trace!("{} wr {} = {:#x}", t.id(), self.def.name, self.value);
    Ok(())
  }

  /// Render named fields as `NAME:hexval` pairs for diagnostics. Reserved
  /// fields are suppressed; zero-valued fields only appear when
  /// `show_zeros` is set.
  pub fn field_values(&self, show_zeros: bool) -> String {
    let mut out = String::new();
    let mut offset = 0;
    for f in self.def.fields {
      let val = (self.value >> offset) & field_mask(f.width);
      offset += f.width;
      if f.is_reserved() || (val == 0 && !show_zeros) {
        continue;
      }
      if !out.is_empty() {
        out.push(' ');
      }
      out.push_str(&format!("{}:{:x}", f.name, val));
    }
    out
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::mock::MockRadio;
  use crate::registers;

  #[test]
  fn header_without_sub_index() {
    assert_eq!(addr_header(&registers::DEV_ID, false), [0x00]);
    assert_eq!(addr_header(&registers::DEV_ID, true), [0x80]);
  }

  #[test]
  fn header_with_short_sub_index() {
    // File 0x26, sub 0x28.
    assert_eq!(addr_header(&registers::GPIO_RAW, false), [0x66, 0x28]);
    assert_eq!(addr_header(&registers::GPIO_RAW, true), [0xE6, 0x28]);
  }

  #[test]
  fn header_with_extended_sub_index() {
    // File 0x2E, sub 0x1806.
    assert_eq!(addr_header(&registers::LDE_CFG2, false), [0x6E, 0x86, 0x30]);
    assert_eq!(addr_header(&registers::LDE_CFG2, true), [0xEE, 0x86, 0x30]);
  }

  #[test]
  fn header_decode_round_trip() {
    for reg in registers::ALL {
      for write in [false, true] {
        let hdr = addr_header(reg, write);
        let dec = decode_header(&hdr).unwrap();
        assert_eq!(dec.write, write);
        assert_eq!(dec.file_id, reg.file_id);
        assert_eq!(dec.sub, reg.sub.unwrap_or(0));
        assert_eq!(dec.len, hdr.len());
      }
    }
  }

  #[test]
  fn sys_cfg_field_packing() {
    let mut r = RegisterValue::new(&registers::SYS_CFG);
    r.set("DIS_STXP", 1)
      .unwrap()
      .set("PHR_MODE", 3)
      .unwrap()
      .set("HIRQ_POL", 1)
      .unwrap()
      .set("RXM110K", 1)
      .unwrap();
    assert_eq!(r.value(), 0x0047_0200);
  }

  #[test]
  fn field_get_matches_set() {
    let mut r = RegisterValue::new(&registers::TX_FCTRL);
    r.set("TFLEN", 12).unwrap().set("TXBOFFS", 0x2AB).unwrap();
    assert_eq!(r.field("TFLEN").unwrap(), 12);
    assert_eq!(r.field("TXBOFFS").unwrap(), 0x2AB);
    assert_eq!(r.field("TFLE").unwrap(), 0);
  }

  #[test]
  fn pack_unpack_identity() {
    let v = 0xDECA_0130;
    let r = RegisterValue::with_value(&registers::DEV_ID, v);
    assert_eq!(r.field("REV").unwrap(), 0x0);
    assert_eq!(r.field("VER").unwrap(), 0x3);
    assert_eq!(r.field("MODEL").unwrap(), 0x01);
    assert_eq!(r.field("RIDTAG").unwrap(), 0xDECA);
    // Re-packing the fields reproduces the word.
    let mut s = RegisterValue::new(&registers::DEV_ID);
    for name in ["REV", "VER", "MODEL", "RIDTAG"] {
      s.set(name, r.field(name).unwrap()).unwrap();
    }
    assert_eq!(s.value(), v);
  }

  #[test]
  fn set_rejects_unknown_field() {
    let mut r = RegisterValue::new(&registers::SYS_CFG);
    assert!(matches!(
      r.set("NO_SUCH_FIELD", 1),
      Err(Error::UnknownField { .. })
    ));
  }

  #[test]
  fn set_rejects_oversized_value() {
    let mut r = RegisterValue::new(&registers::SYS_CFG);
    assert!(matches!(
      r.set("PHR_MODE", 4),
      Err(Error::FieldOverflow { width: 2, .. })
    ));
  }

  #[test]
  fn forty_bit_field_round_trip() {
    let mut r = RegisterValue::new(&registers::TX_TIME1);
    r.set("TX_STAMP", 0xFF_FFFF_FFFF).unwrap();
    assert_eq!(r.field("TX_STAMP").unwrap(), 0xFF_FFFF_FFFF);
    assert!(r.set("TX_STAMP", 1 << 40).is_err());
  }

  #[test]
  fn read_write_identity_preserves_reserved_bits() {
    let mut radio = MockRadio::new("t");
    // Seed SYS_CFG with reserved bits set (X1 spans bits 19..22).
    radio.seed(&registers::SYS_CFG, 0x0038_0000);

    let mut r = RegisterValue::new(&registers::SYS_CFG);
    r.read(&mut radio).unwrap();
    assert_eq!(r.value(), 0x0038_0000);

    r.set("HIRQ_POL", 1).unwrap();
    r.write(&mut radio).unwrap();

    let mut back = RegisterValue::new(&registers::SYS_CFG);
    back.read(&mut radio).unwrap();
    assert_eq!(back.value(), 0x0038_0200);
    // Reserved fields never show in the dump.
    assert_eq!(back.field_values(false), "HIRQ_POL:1");
  }

  #[test]
  fn empty_response_packs_as_zero() {
    let mut radio = MockRadio::new("t");
    radio.drop_replies(true);
    let mut r = RegisterValue::with_value(&registers::DEV_ID, 0x1234);
    r.read(&mut radio).unwrap();
    assert_eq!(r.value(), 0);
  }

  #[test]
  fn field_dump_formatting() {
    let mut r = RegisterValue::new(&registers::SYS_STATUS);
    r.set("RXDFR", 1).unwrap().set("RXFCG", 1).unwrap();
    assert_eq!(r.field_values(false), "RXDFR:1 RXFCG:1");
  }
}
