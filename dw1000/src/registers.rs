// DW1000 register catalog.
//
// Each register file is identified by a 6-bit ID (0x00–0x3F), optionally
// with a 15-bit sub-address selecting an offset within the file. Lengths
// are in bytes. Bitfields are listed in little-endian packing order
// starting at bit 0; names beginning with `X` are reserved gaps that must
// be preserved across read-modify-write but are hidden from field dumps.
//
// Reference: DW1000 User Manual v2.11, Section 7 — Register File Set.

/// A named bitfield within a register, `width` bits wide.
#[derive(Clone, Copy, Debug)]
pub struct FieldDef {
  pub name: &'static str,
  pub width: u32,
}

impl FieldDef {
  /// Reserved gaps carry an `X` prefix and are excluded from field dumps.
  pub fn is_reserved(&self) -> bool {
    self.name.starts_with('X')
  }
}

/// A register descriptor: file ID, optional sub-address, byte length, and
/// the ordered bitfield layout.
#[derive(Clone, Copy, Debug)]
pub struct RegisterDef {
  pub name: &'static str,
  pub file_id: u8,
  pub sub: Option<u16>,
  pub len: usize,
  pub fields: &'static [FieldDef],
}

impl RegisterDef {
  /// Bit offset and width of the named field, walking the layout in
  /// definition order.
  pub fn field_span(&self, name: &str) -> Option<(u32, u32)> {
    let mut offset = 0;
    for f in self.fields {
      if f.name == name {
        return Some((offset, f.width));
      }
      offset += f.width;
    }
    None
  }
}

macro_rules! registers {
  ($( $(#[$meta:meta])* $name:ident = ($id:expr, $sub:expr, $len:expr) { $( $f:ident : $w:expr ),* $(,)? } )*) => {
    $(
      $(#[$meta])*
      pub const $name: RegisterDef = RegisterDef {
        name: stringify!($name),
        file_id: $id,
        sub: $sub,
        len: $len,
        fields: &[ $( FieldDef { name: stringify!($f), width: $w } ),* ],
      };
    )*

    /// Every register in the catalog, for diagnostics and consistency tests.
    pub const ALL: &[&RegisterDef] = &[ $( &$name ),* ];
  };
}

registers! {
  // ── Device identity and addressing ─────────────────────────────────────

  /// Device identifier (read-only); RIDTAG reads 0xDECA on a live chip.
  DEV_ID = (0x00, None, 4) { REV: 4, VER: 4, MODEL: 8, RIDTAG: 16 }
  /// Extended unique identifier (EUI-64).
  EUI = (0x01, None, 8) {}
  /// PAN identifier and 16-bit short address.
  PANADR = (0x03, None, 4) { SHORT_ADDR: 16, PAN_ID: 16 }

  // ── System configuration and control ───────────────────────────────────

  SYS_CFG = (0x04, None, 4) {
    FFEN: 1, FFBC: 1, FFAB: 1, FFAD: 1, FFAA: 1, FFAM: 1, FFAR: 1,
    FFA4: 1, FFA5: 1, HIRQ_POL: 1, SPI_EDGE: 1, DIS_FCE: 1, DIS_DRXB: 1,
    DIS_PHE: 1, DIS_RSDE: 1, FCS_INIT2F: 1, PHR_MODE: 2, DIS_STXP: 1,
    X1: 3, RXM110K: 1, X2: 5, RXWTOE: 1, RXAUTR: 1, AUTOACK: 1,
    AACKPEND: 1,
  }
  /// Free-running 40-bit system time counter.
  SYS_TIME = (0x06, None, 5) {}
  /// Transmit frame control: payload length, data rate, PRF, preamble.
  TX_FCTRL = (0x08, None, 5) {
    TFLEN: 7, TFLE: 3, R: 3, TXBR: 2, TR: 1, TXPRF: 2, TXPSR: 2, PE: 2,
    TXBOFFS: 10, IFSDELAY: 8,
  }
  /// Transmit data buffer (write-only).
  TX_BUFFER = (0x09, None, 1) {}
  /// Delayed send/receive trigger time.
  DX_TIME = (0x0A, None, 5) {}
  /// Receive frame wait timeout.
  RX_FWTO = (0x0C, None, 5) {}
  SYS_CTRL = (0x0D, None, 4) {
    SFCST: 1, TXSTRT: 1, TXDLYS: 1, CANSFCS: 1, X1: 2, TRXOFF: 1,
    WAIT4RESP: 1, RXENAB: 1, RXDLYE: 1, X2: 14, HRBPT: 1, X3: 7,
  }
  /// Interrupt enable mask, one bit per SYS_STATUS event.
  SYS_MASK = (0x0E, None, 4) {
    X1: 1, MCPLOCK: 1, MESYNCR: 1, MAAT: 1, MTXFRB: 1, MTXPRS: 1,
    MTXPHS: 1, MTXFRS: 1, MRXPRD: 1, MRXSFDD: 1, MLDEDON: 1, MRXPHD: 1,
    MRXPHE: 1, MRXDFR: 1, MRXFCG: 1, MRXFCE: 1, MRXRFSL: 1, MRXRFTO: 1,
    MLDEERR: 1, X2: 1, MRXOVRR: 1, MRXPTO: 1, MGPIOIRQ: 1, MSLP2INIT: 1,
    MRFPLLLL: 1, MCPLLLL: 1, MRXSFDTO: 1, MHPDWAR: 1, MTXBERR: 1,
    MAFFREJ: 1, X3: 2,
  }
  /// Latched event status; cleared by writing back the read value.
  SYS_STATUS = (0x0F, None, 5) {
    IRQS: 1, CPLOCK: 1, ESYNCR: 1, AAT: 1, TXFRB: 1, TXPRS: 1, TXPHS: 1,
    TXFRS: 1, RXPRD: 1, RXSFDD: 1, LDEDONE: 1, RXPHD: 1, RXPHE: 1,
    RXDFR: 1, RXFCG: 1, RXFCE: 1, RXRFSL: 1, RXRFTO: 1, LDEERR: 1,
    X1: 1, RXOVRR: 1, RXPTO: 1, GPIOIRQ: 1, SLP2INIT: 1, RFPLL_LL: 1,
    CLKPLL_LL: 1, RXSFDTO: 1, HPDWARN: 1, TXBERR: 1, AFFREJ: 1, HSRBP: 1,
    ICRBP: 1, RXRSCS: 1, RXPREJ: 1, TXPUTE: 1, X2: 5,
  }

  // ── Receive frame information and data ─────────────────────────────────

  RX_FINFO = (0x10, None, 4) {
    RXFLEN: 7, RXFLE: 3, X1: 1, RXNSPL: 2, RXBR: 2, RNG: 1, RXPRFR: 2,
    RXPSR: 2, RXPACC: 12,
  }
  /// Receive data buffer (read-only).
  RX_BUFFER = (0x11, None, 1) {}
  RX_FQUAL = (0x12, None, 8) {
    STD_NOISE: 16, FP_AMPL2: 16, PP_AMPL3: 16, CIR_PWR: 16,
  }
  RX_TTCKI = (0x13, None, 4) {}
  RX_TTCKO = (0x14, None, 5) {
    RXTOFS: 19, X1: 5, RSMPDEL: 8, RCPHASE: 7, X2: 1,
  }
  /// Adjusted receive timestamp (40 bits) and first-path index.
  RX_TIME1 = (0x15, Some(0x00), 7) { RX_STAMP: 40, FP_INDEX: 16 }
  /// First-path amplitude and raw receive timestamp.
  RX_TIME2 = (0x15, Some(0x07), 7) { FP_AMPL1: 16, RX_RAWST: 40 }

  // ── Transmit timestamps and antenna delay ──────────────────────────────

  /// Adjusted transmit timestamp (40 bits).
  TX_TIME1 = (0x17, Some(0x00), 5) { TX_STAMP: 40 }
  TX_TIME2 = (0x17, Some(0x05), 5) { TX_RAWST: 40 }
  /// Transmit antenna delay, added to the raw TX timestamp in hardware.
  TX_ANTD = (0x18, None, 2) {}

  // ── MAC-layer timing and power ─────────────────────────────────────────

  ACK_RESP_T = (0x1A, None, 4) { W4R_TIM: 20, X1: 4, ACK_TIM: 8 }
  RX_SNIFF = (0x1D, None, 4) { SNIFF_ONT: 4, X1: 4, SNIFF_OFFT: 8, X2: 16 }
  /// Transmit power control, one octet per frame-duration band.
  TX_POWER = (0x1E, None, 4) {
    BOOSTNORM: 8, BOOSTP500: 8, BOOSTP250: 8, BOOSTP125: 8,
  }
  /// Channel, PRF and preamble code selection for both directions.
  CHAN_CTRL = (0x1F, None, 4) {
    TX_CHAN: 4, RX_CHAN: 4, X1: 9, DWSFD: 1, RXPRF: 2, TNSSFD: 1,
    RNSSFD: 1, TX_PCODE: 5, RX_PCODE: 5,
  }
  SFD_LENGTH = (0x21, Some(0x00), 2) {}

  // ── Automatic gain control ─────────────────────────────────────────────

  AGC_CTRL1 = (0x23, Some(0x02), 2) { DIS_AM: 1, X1: 15 }
  AGC_TUNE1 = (0x23, Some(0x04), 2) {}
  AGC_TUNE2 = (0x23, Some(0x0C), 4) {}
  AGC_TUNE3 = (0x23, Some(0x12), 2) {}
  AGC_STAT1 = (0x23, Some(0x1E), 3) { X1: 6, EDG1: 5, EDV2: 9, X2: 4 }

  // ── External synchronisation ───────────────────────────────────────────

  EC_CTRL = (0x24, Some(0x00), 4) {
    OSTSM: 1, OSRSM: 1, PLLLDT: 1, WAIT: 8, OSTRM: 1, X1: 20,
  }
  EC_RXTC = (0x24, Some(0x04), 4) { RX_TS_EST: 32 }
  EC_GOLP = (0x24, Some(0x08), 4) { OFFSET_EXT: 6, X1: 26 }

  /// Channel impulse response accumulator memory.
  ACC_MEM = (0x25, None, 4064) {}

  // ── GPIO ───────────────────────────────────────────────────────────────

  GPIO_MODE = (0x26, Some(0x00), 4) {
    X1: 6, MSGP0: 2, MSGP1: 2, MSGP2: 2, MSGP3: 2, MSGP4: 2, MSGP5: 2,
    MSGP6: 2, MSGP7: 2, MSGP8: 2, X2: 8,
  }
  GPIO_DIR = (0x26, Some(0x08), 4) {
    GDP0: 1, GDP1: 1, GDP2: 1, GDP3: 1, GDM0: 1, GDM1: 1, GDM2: 1,
    GDM3: 1, GDP4: 1, GDP5: 1, GDP6: 1, GDP7: 1, GDM4: 1, GDM5: 1,
    GDM6: 1, GDM7: 1, GDP8: 1, X1: 3, GDM8: 1, X2: 11,
  }
  GPIO_DOUT = (0x26, Some(0x0C), 4) {
    GOP0: 1, GOP1: 1, GOP2: 1, GOP3: 1, GOM0: 1, GOM1: 1, GOM2: 1,
    GOM3: 1, GOP4: 1, GOP5: 1, GOP6: 1, GOP7: 1, GOM4: 1, GOM5: 1,
    GOM6: 1, GOM7: 1, GOP8: 1, X1: 3, GOM8: 1, X2: 11,
  }
  GPIO_IRQE = (0x26, Some(0x10), 4) {
    GIRQE0: 1, GIRQE1: 1, GIRQE2: 1, GIRQE3: 1, GIRQE4: 1, GIRQE5: 1,
    GIRQE6: 1, GIRQE7: 1, GIRQE8: 1, X1: 23,
  }
  GPIO_ISEN = (0x26, Some(0x14), 4) {
    GISEN0: 1, GISEN1: 1, GISEN2: 1, GISEN3: 1, GISEN4: 1, GISEN5: 1,
    GISEN6: 1, GISEN7: 1, GISEN8: 1, X1: 23,
  }
  GPIO_IMODE = (0x26, Some(0x18), 4) {
    GIMOD0: 1, GIMOD1: 1, GIMOD2: 1, GIMOD3: 1, GIMOD4: 1, GIMOD5: 1,
    GIMOD6: 1, GIMOD7: 1, GIMOD8: 1, X1: 23,
  }
  GPIO_IBES = (0x26, Some(0x1C), 4) {
    GIBES0: 1, GIBES1: 1, GIBES2: 1, GIBES3: 1, GIBES4: 1, GIBES5: 1,
    GIBES6: 1, GIBES7: 1, GIBES8: 1, X1: 23,
  }
  GPIO_ICLR = (0x26, Some(0x20), 4) {
    GICLR0: 1, GICLR1: 1, GICLR2: 1, GICLR3: 1, GICLR4: 1, GICLR5: 1,
    GICLR6: 1, GICLR7: 1, GICLR8: 1, X1: 23,
  }
  GPIO_IDBE = (0x26, Some(0x24), 4) {
    GIDBE0: 1, GIDBE1: 1, GIDBE2: 1, GIDBE3: 1, GIDBE4: 1, GIDBE5: 1,
    GIDBE6: 1, GIDBE7: 1, GIDBE8: 1, X1: 23,
  }
  GPIO_RAW = (0x26, Some(0x28), 4) {
    GRAWP0: 1, GRAWP1: 1, GRAWP2: 1, GRAWP3: 1, GRAWP4: 1, GRAWP5: 1,
    GRAWP6: 1, GRAWP7: 1, GRAWP8: 1, X1: 23,
  }

  // ── Digital receiver tuning ────────────────────────────────────────────

  DRX_TUNE0B = (0x27, Some(0x02), 2) {}
  DRX_TUNE1A = (0x27, Some(0x04), 2) {}
  DRX_TUNE1B = (0x27, Some(0x06), 2) {}
  DRX_TUNE2 = (0x27, Some(0x08), 4) {}
  DRX_SFDTOC = (0x27, Some(0x20), 2) {}
  DRX_PRETOC = (0x27, Some(0x24), 2) {}
  DRX_TUNE4H = (0x27, Some(0x26), 2) {}
  DRX_CAR_INT = (0x27, Some(0x28), 2) {}
  RXPACC_NOSAT = (0x27, Some(0x2C), 2) {}

  // ── Analog RF ──────────────────────────────────────────────────────────

  RF_CONF = (0x28, Some(0x00), 4) {
    X1: 8, TXFEN: 5, PLLFEN: 3, LDOFEN: 5, TXRXSW: 2, X2: 9,
  }
  RF_RXCTRLH = (0x28, Some(0x0B), 1) {}
  RF_TXCTRL = (0x28, Some(0x0C), 3) {}
  RF_STATUS = (0x28, Some(0x2C), 4) {
    CPLLLOCK: 1, CPLLLOW: 1, CPLLHIGH: 1, RFPLLLOCK: 1, X1: 28,
  }
  LDOTUNE = (0x28, Some(0x30), 5) {}

  // ── Transmitter calibration ────────────────────────────────────────────

  TC_SARC = (0x2A, Some(0x00), 2) { SAR_CTRL: 1, X1: 15 }
  TC_SARL = (0x2A, Some(0x03), 3) { SAR_LVBAT: 8, SAR_LTEMP: 8, X1: 8 }
  TC_SARW = (0x2A, Some(0x06), 2) { SAR_WBAT: 8, SAR_WTEMP: 8 }
  TC_PG_CTRL = (0x2A, Some(0x08), 4) { PG_START: 1, X1: 1, PG_TMEAS: 3, X2: 27 }
  TC_PG_STATUS = (0x2A, Some(0x09), 4) { PG_DELAY_CNT: 12, X1: 20 }
  TC_PGDELAY = (0x2A, Some(0x0B), 1) {}
  TC_PGTEST = (0x2A, Some(0x0C), 1) {}

  // ── Frequency synthesiser ──────────────────────────────────────────────

  FS_PLLCFG = (0x2B, Some(0x07), 4) {}
  FS_PLLTUNE = (0x2B, Some(0x0B), 1) {}
  FS_XTALT = (0x2B, Some(0x0E), 1) {}

  // ── Always-on memory ───────────────────────────────────────────────────

  AON_WCFG = (0x2C, Some(0x00), 2) {
    ONV_RAD: 1, ONW_RX: 1, X1: 1, ONW_LEUI: 1, X2: 2, ONW_LDC: 1,
    ONW_L64: 1, PRES_SLEE: 1, X3: 2, ONW_LLDE: 1, ONW_LLD: 1, X4: 3,
  }
  AON_CTRL = (0x2C, Some(0x02), 1) {
    RESTORE: 1, SAVE: 1, UPL_CFG: 1, DCA_READ: 1, X1: 3, DCA_ENAB: 1,
  }
  AON_RDAT = (0x2C, Some(0x03), 1) {}
  AON_ADDR = (0x2C, Some(0x04), 1) {}
  AON_CFG0 = (0x2C, Some(0x06), 4) {
    SLEEP_EN: 1, WAKE_PIN: 1, WAKE_SPI: 1, WAKE_CNT: 1, LPDIV_EN: 1,
    LPCLKDIVA: 11, SLEEP_TIM: 16,
  }
  AON_CFG1 = (0x2C, Some(0x0A), 2) { SLEEP_CE: 1, SMXX: 1, LPOSC_C: 1, X1: 13 }

  // ── One-time programmable memory ───────────────────────────────────────

  OTP_WDAT = (0x2D, Some(0x00), 4) {}
  OTP_ADDR = (0x2D, Some(0x04), 2) { OTP_ADDR: 11, X1: 5 }
  OTP_CTRL = (0x2D, Some(0x06), 2) {
    OTPRDEN: 1, OTPREAD: 1, X1: 1, OTPMRWR: 1, X2: 2, OTPPROG: 1,
    OTPMR: 4, X3: 4, LDELOAD: 1,
  }
  OTP_STATUS = (0x2D, Some(0x08), 2) { OTPPRGD: 1, OTPVPOK: 1, X1: 14 }
  OTP_RDAT = (0x2D, Some(0x0A), 4) {}
  OTP_SRDAT = (0x2D, Some(0x0E), 4) {}
  OTP_SF = (0x2D, Some(0x12), 1) {
    OPS_KICK: 1, LDO_KICK: 1, X1: 3, OPS_SEL: 2, X2: 1,
  }

  // ── Leading-edge detection ─────────────────────────────────────────────
  //
  // The LDE file uses extended (two-byte) sub-addresses.

  LDE_CFG1 = (0x2E, Some(0x0806), 1) { NTM: 5, PMULT: 3 }
  LDE_PPINDX = (0x2E, Some(0x1000), 2) {}
  LDE_PPAMPL = (0x2E, Some(0x1002), 2) {}
  /// Receive antenna delay, subtracted from the raw RX timestamp by LDE.
  LDE_RXANTD = (0x2E, Some(0x1804), 2) {}
  LDE_CFG2 = (0x2E, Some(0x1806), 2) {}
  LDE_REPC = (0x2E, Some(0x2804), 2) {}

  // ── Event counters ─────────────────────────────────────────────────────

  EVC_CTRL = (0x2F, Some(0x00), 4) { EVC_EN: 1, EVC_CLR: 1, X1: 30 }
  EVC_PHE = (0x2F, Some(0x04), 2) { EVC_PHE: 12, X1: 4 }
  EVC_RSE = (0x2F, Some(0x06), 2) { EVC_RSE: 12, X1: 4 }
  EVC_FCG = (0x2F, Some(0x08), 2) { EVC_FCG: 12, X1: 4 }
  EVC_FCE = (0x2F, Some(0x0A), 2) { EVC_FCE: 12, X1: 4 }
  EVC_FFR = (0x2F, Some(0x0C), 2) { EVC_FFR: 12, X1: 4 }
  EVC_OVR = (0x2F, Some(0x0E), 2) { EVC_OVR: 12, X1: 4 }
  EVC_STO = (0x2F, Some(0x10), 2) { EVC_STO: 12, X1: 4 }
  EVC_PTO = (0x2F, Some(0x12), 2) { EVC_PTO: 12, X1: 4 }
  EVC_FWTO = (0x2F, Some(0x14), 2) { EVC_FWTO: 12, X1: 4 }
  EVC_TXFS = (0x2F, Some(0x16), 2) { EVC_TXFS: 12, X1: 4 }
  EVC_HPW = (0x2F, Some(0x18), 2) { EVC_HPW: 12, X1: 4 }
  EVC_TPW = (0x2F, Some(0x1A), 2) { EVC_TPW: 12, X1: 4 }
  DIAG_TMC = (0x2F, Some(0x24), 2) { X1: 4, TX_PSTM: 1, X2: 11 }

  // ── Power management and system control ────────────────────────────────

  PMSC_CTRL0 = (0x36, Some(0x00), 4) {
    SYSCLKS: 2, RXCLKS: 2, TXCLKS: 2, FACE: 1, X1: 3, ADCCE: 1, X2: 4,
    AMCE: 1, GPCE: 1, GPRN: 1, GPDCE: 1, GPDRN: 1, X3: 3, KHZCLKEN: 1,
    X4: 4, SOFTRESET: 4,
  }
  PMSC_CTRL1 = (0x36, Some(0x04), 4) {
    X1: 1, ARX2INIT: 1, X2: 1, PKTSEQ: 8, ATXSLP: 1, ARXSLP: 1, SNOZE: 1,
    SNOZR: 1, PLLSYN: 1, X3: 1, LDERUNE: 1, X4: 8, KHZCLKDIV: 6,
  }
  PMSC_SNOZT = (0x36, Some(0x0C), 1) {}
  PMSC_TXFSEQ = (0x36, Some(0x26), 2) {}
  PMSC_LEDC = (0x36, Some(0x28), 4) {
    BLINK_TIM: 8, BLINKEN: 1, X1: 7, BLNKNOW: 4, X2: 12,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn field_widths_fit_register_length() {
    for reg in ALL {
      let bits: u32 = reg.fields.iter().map(|f| f.width).sum();
      assert!(
        bits as usize <= reg.len * 8,
        "{}: {} field bits exceed {} bytes",
        reg.name,
        bits,
        reg.len
      );
      // Registers with a full field layout cover the register exactly.
      if !reg.fields.is_empty() {
        assert_eq!(bits as usize, reg.len * 8, "{}: partial layout", reg.name);
      }
    }
  }

  #[test]
  fn field_names_unique_per_register() {
    for reg in ALL {
      for (n, f) in reg.fields.iter().enumerate() {
        assert!(
          !reg.fields[n + 1..].iter().any(|g| g.name == f.name),
          "{}: duplicate field {}",
          reg.name,
          f.name
        );
      }
    }
  }

  #[test]
  fn file_ids_within_address_space() {
    for reg in ALL {
      assert!(reg.file_id < 0x40, "{}: file id out of range", reg.name);
      if let Some(sub) = reg.sub {
        assert!(sub < 0x8000, "{}: sub-index out of range", reg.name);
      }
    }
  }

  #[test]
  fn status_register_spans_forty_bits() {
    assert_eq!(SYS_STATUS.len, 5);
    assert_eq!(SYS_STATUS.field_span("IRQS"), Some((0, 1)));
    assert_eq!(SYS_STATUS.field_span("RXDFR"), Some((13, 1)));
    assert_eq!(SYS_STATUS.field_span("RXFCG"), Some((14, 1)));
    assert_eq!(SYS_STATUS.field_span("TXPUTE"), Some((34, 1)));
  }
}
