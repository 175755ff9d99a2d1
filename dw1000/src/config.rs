// Radio configuration profile and the physical-layer tuning tables.
//
// The tables map channel / data rate / PRF / preamble length onto the
// register values the DW1000 needs for that operating point. The values
// are calibration data taken from the DW1000 User Manual (tables 38, 40,
// 44 and the DRX/LDE tuning sections) and must not be altered.

/// UWB channel. Channel 6 does not exist on the DW1000.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Channel {
  Ch1,
  #[default]
  Ch2,
  Ch3,
  Ch4,
  Ch5,
  Ch7,
}

/// Data rate in kbps.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum BitRate {
  #[default]
  Kbps110,
  Kbps850,
  Kbps6800,
}

/// Pulse repetition frequency in MHz.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum PulseFreq {
  Mhz16,
  #[default]
  Mhz64,
}

/// PHY preamble length in symbols.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum PreambleLength {
  P64,
  P128,
  P256,
  P512,
  #[default]
  P1024,
  P1536,
  P2048,
  P4096,
}

impl Channel {
  /// Channel number as written to CHAN_CTRL.TX_CHAN / RX_CHAN.
  pub fn number(self) -> u64 {
    match self {
      Channel::Ch1 => 1,
      Channel::Ch2 => 2,
      Channel::Ch3 => 3,
      Channel::Ch4 => 4,
      Channel::Ch5 => 5,
      Channel::Ch7 => 7,
    }
  }

  /// RF_TXCTRL analog transmit control (user manual table 38).
  pub fn rf_txctrl(self) -> u64 {
    match self {
      Channel::Ch1 => 0x5C40,
      Channel::Ch2 => 0x45CA0,
      Channel::Ch3 => 0x86CC0,
      Channel::Ch4 => 0x45C80,
      Channel::Ch5 => 0x1E3FE0,
      Channel::Ch7 => 0x1E7DE0,
    }
  }

  /// TC_PGDELAY pulse generator delay (table 40).
  pub fn tc_pgdelay(self) -> u64 {
    match self {
      Channel::Ch1 => 0xC9,
      Channel::Ch2 => 0xC2,
      Channel::Ch3 => 0xC5,
      Channel::Ch4 => 0x95,
      Channel::Ch5 => 0xC0,
      Channel::Ch7 => 0x93,
    }
  }

  /// FS_PLLTUNE synthesiser tuning (table 44).
  pub fn fs_plltune(self) -> u64 {
    match self {
      Channel::Ch1 => 0x1E,
      Channel::Ch2 | Channel::Ch4 => 0x26,
      Channel::Ch3 => 0x56,
      Channel::Ch5 | Channel::Ch7 => 0xBE,
    }
  }

  /// FS_PLLCFG synthesiser configuration.
  pub fn fs_pllcfg(self) -> u64 {
    match self {
      Channel::Ch1 => 0x0900_0407,
      Channel::Ch2 | Channel::Ch4 => 0x0840_0508,
      Channel::Ch3 => 0x0840_1009,
      Channel::Ch5 | Channel::Ch7 => 0x0800_041D,
    }
  }

  /// RF_RXCTRLH: wideband front-end for channels 4 and 7, narrowband
  /// otherwise.
  pub fn rf_rxctrlh(self) -> u64 {
    match self {
      Channel::Ch4 | Channel::Ch7 => 0xBC,
      _ => 0xD8,
    }
  }

  /// Standard preamble code for this channel at the given PRF.
  pub fn preamble_code(self, prf: PulseFreq) -> u64 {
    match (self, prf) {
      (Channel::Ch1, PulseFreq::Mhz16) => 1,
      (Channel::Ch2 | Channel::Ch5, PulseFreq::Mhz16) => 3,
      (Channel::Ch3, PulseFreq::Mhz16) => 5,
      (Channel::Ch4 | Channel::Ch7, PulseFreq::Mhz16) => 7,
      (Channel::Ch1 | Channel::Ch2 | Channel::Ch3 | Channel::Ch5, PulseFreq::Mhz64) => 9,
      (Channel::Ch4 | Channel::Ch7, PulseFreq::Mhz64) => 17,
    }
  }

  /// TX_POWER octets for this channel and PRF. The manual's "smart" table
  /// boosts short frames; the flat table repeats one setting.
  pub fn tx_power(self, prf: PulseFreq, smart: bool) -> u64 {
    use PulseFreq::*;
    match (smart, self, prf) {
      (true, Channel::Ch1 | Channel::Ch2, Mhz16) => 0x1535_5575,
      (true, Channel::Ch1 | Channel::Ch2, Mhz64) => 0x0727_4767,
      (true, Channel::Ch3, Mhz16) => 0x0F2F_4F6F,
      (true, Channel::Ch3, Mhz64) => 0x2B4B_6B8B,
      (true, Channel::Ch4, Mhz16) => 0x1F1F_3F5F,
      (true, Channel::Ch4, Mhz64) => 0x3A5A_7A9A,
      (true, Channel::Ch5, Mhz16) => 0x0E08_2848,
      (true, Channel::Ch5, Mhz64) => 0x2545_6585,
      (true, Channel::Ch7, Mhz16) => 0x3252_7292,
      (true, Channel::Ch7, Mhz64) => 0x5171_B1D1,
      (false, Channel::Ch1 | Channel::Ch2, Mhz16) => 0x7575_7575,
      (false, Channel::Ch1 | Channel::Ch2, Mhz64) => 0x6767_6767,
      (false, Channel::Ch3, Mhz16) => 0x6F6F_6F6F,
      (false, Channel::Ch3, Mhz64) => 0x8B8B_8B8B,
      (false, Channel::Ch4, Mhz16) => 0x5F5F_5F5F,
      (false, Channel::Ch4, Mhz64) => 0x9A9A_9A9A,
      (false, Channel::Ch5, Mhz16) => 0x4848_4848,
      (false, Channel::Ch5, Mhz64) => 0x8585_8585,
      (false, Channel::Ch7, Mhz16) => 0x9292_9292,
      (false, Channel::Ch7, Mhz64) => 0xD1D1_D1D1,
    }
  }
}

impl BitRate {
  /// TX_FCTRL.TXBR encoding.
  pub fn txbr(self) -> u64 {
    match self {
      BitRate::Kbps110 => 0,
      BitRate::Kbps850 => 1,
      BitRate::Kbps6800 => 2,
    }
  }

  /// DRX_TUNE0B symbol-rate tuning.
  pub fn drx_tune0b(self) -> u64 {
    match self {
      BitRate::Kbps110 => 0x16,
      BitRate::Kbps850 => 6,
      BitRate::Kbps6800 => 1,
    }
  }
}

impl PulseFreq {
  /// Two-bit PRF encoding shared by TX_FCTRL.TXPRF and CHAN_CTRL.RXPRF.
  pub fn encoding(self) -> u64 {
    match self {
      PulseFreq::Mhz16 => 1,
      PulseFreq::Mhz64 => 2,
    }
  }

  /// DRX_TUNE1A PRF tuning.
  pub fn drx_tune1a(self) -> u64 {
    match self {
      PulseFreq::Mhz16 => 0x87,
      PulseFreq::Mhz64 => 0x8D,
    }
  }

  /// AGC_TUNE1 PRF tuning.
  pub fn agc_tune1(self) -> u64 {
    match self {
      PulseFreq::Mhz16 => 0x8870,
      PulseFreq::Mhz64 => 0x889B,
    }
  }

  /// LDE_CFG2 leading-edge algorithm tuning.
  pub fn lde_cfg2(self) -> u64 {
    match self {
      PulseFreq::Mhz16 => 0x1607,
      PulseFreq::Mhz64 => 0x0607,
    }
  }
}

impl PreambleLength {
  /// Length in symbols.
  pub fn symbols(self) -> u32 {
    match self {
      PreambleLength::P64 => 64,
      PreambleLength::P128 => 128,
      PreambleLength::P256 => 256,
      PreambleLength::P512 => 512,
      PreambleLength::P1024 => 1024,
      PreambleLength::P1536 => 1536,
      PreambleLength::P2048 => 2048,
      PreambleLength::P4096 => 4096,
    }
  }

  /// TX_FCTRL.PE preamble extension bits.
  pub fn pe(self) -> u64 {
    match self {
      PreambleLength::P64 | PreambleLength::P1024 | PreambleLength::P4096 => 0,
      PreambleLength::P128 | PreambleLength::P1536 => 1,
      PreambleLength::P256 | PreambleLength::P2048 => 2,
      PreambleLength::P512 => 3,
    }
  }

  /// TX_FCTRL.TXPSR preamble symbol repetitions bits.
  pub fn txpsr(self) -> u64 {
    match self {
      PreambleLength::P64 | PreambleLength::P128 | PreambleLength::P256 | PreambleLength::P512 => 1,
      PreambleLength::P1024 | PreambleLength::P1536 | PreambleLength::P2048 => 2,
      PreambleLength::P4096 => 3,
    }
  }

  /// Recommended preamble acquisition chunk size in symbols.
  pub fn pac_size(self) -> u32 {
    match self {
      PreambleLength::P64 | PreambleLength::P128 => 8,
      PreambleLength::P256 | PreambleLength::P512 => 16,
      PreambleLength::P1024 => 32,
      PreambleLength::P1536 | PreambleLength::P2048 | PreambleLength::P4096 => 64,
    }
  }

  /// DRX_TUNE2 value keyed by PAC size and PRF.
  pub fn drx_tune2(self, prf: PulseFreq) -> u64 {
    match (self.pac_size(), prf) {
      (8, PulseFreq::Mhz16) => 0x311A_002D,
      (8, PulseFreq::Mhz64) => 0x313B_006B,
      (16, PulseFreq::Mhz16) => 0x331A_0052,
      (16, PulseFreq::Mhz64) => 0x333B_00BE,
      (32, PulseFreq::Mhz16) => 0x351A_009A,
      (32, PulseFreq::Mhz64) => 0x353B_015E,
      (_, PulseFreq::Mhz16) => 0x371A_011D,
      (_, PulseFreq::Mhz64) => 0x373B_0296,
    }
  }
}

/// LDE_REPC replica coefficient for a preamble code (1..=24). At 110 kbps
/// the coefficient is scaled down by 8 (right shift 3) by the caller.
pub fn lde_repc(pcode: u64) -> u64 {
  match pcode {
    1 | 2 => 0x5998,
    3 => 0x51EA,
    4 => 0x428E,
    5 => 0x451E,
    6 => 0x2E14,
    7 => 0x8000,
    8 => 0x51EA,
    9 => 0x28F4,
    10 => 0x3332,
    11 => 0x3AE0,
    12 => 0x3D70,
    13 => 0x3AE0,
    14 => 0x35C2,
    15 => 0x2B84,
    16 => 0x35C2,
    17 => 0x3332,
    18 | 19 => 0x35C2,
    20 => 0x47AE,
    21 => 0x3AE0,
    22 => 0x3850,
    23 => 0x30A2,
    24 => 0x3850,
    _ => 0,
  }
}

/// Operating profile for one radio. The defaults mirror the reference
/// deployment: channel 2, 110 kbps, 64 MHz PRF, 1024-symbol preamble,
/// all optional MAC behaviors off.
#[derive(Clone, Copy, Debug)]
pub struct RadioConfig {
  pub channel: Channel,
  pub bit_rate: BitRate,
  pub pulse_freq: PulseFreq,
  pub preamble_len: PreambleLength,
  /// Smart TX power boosts short frames; off selects the flat power table.
  pub smart_tx_power: bool,
  pub rx_double_buffer: bool,
  /// 1023-byte frames instead of the standard 127.
  pub long_frames: bool,
  /// Re-enable the receiver automatically after each frame.
  pub rx_auto_enable: bool,
  pub auto_ack: bool,
}

impl Default for RadioConfig {
  fn default() -> Self {
    RadioConfig {
      channel: Channel::default(),
      bit_rate: BitRate::default(),
      pulse_freq: PulseFreq::default(),
      preamble_len: PreambleLength::default(),
      smart_tx_power: false,
      rx_double_buffer: false,
      long_frames: false,
      rx_auto_enable: false,
      auto_ack: false,
    }
  }
}

/// Default PAN ID.
pub const DEF_PAN: u64 = 10;
/// Default short address within the PAN.
pub const DEF_ADDR: u64 = 1;
