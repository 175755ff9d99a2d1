// High-level driver for the DW1000 UWB transceiver.
//
// Uses a type-state pattern so the compiler enforces the lifecycle:
//
//   Uninitialized --reset()--> Ready --initialise()--> configured Ready
//
// `reset()` probes DEV_ID over the transport, so a dead link or wrong chip
// is caught before any configuration is attempted. All transmit/receive
// operations live on the Ready state and are serialized by the caller;
// `soft_reset()` + `initialise()` recover a configured chip in place.
//
// The initialisation sequence follows the DW1000 User Manual: the order of
// the register writes matters, in particular the SYSCLKS transitions that
// bracket the LDE microcode load. Reordering mistunes the radio silently.

use std::thread;
use std::time::Duration;

use log::debug;

use crate::config::{BitRate, PreambleLength, RadioConfig};
use crate::error::Error;
use crate::ll::{self, RegisterValue};
use crate::registers;
use crate::time::Timestamp;
use crate::transport::Transport;

/// SYS_MASK enabling RXPHE, RXFCG, RXFCE, RXRFSL, RXRFTO, RXSFDTO, AFFREJ.
const SYS_MASK_VAL: u64 = 0x2403_D000;

/// RIDTAG of every Decawave part.
const RIDTAG_DECA: u64 = 0xDECA;

/// Block for `ms` milliseconds between register writes that need settling
/// time (reset release, clock transitions).
pub fn msdelay(ms: u64) {
  thread::sleep(Duration::from_millis(ms));
}

/// System clock selection for PMSC_CTRL0.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ClockSource {
  /// Let the chip sequence its own clocks.
  Auto,
  /// Force the 19.2 MHz crystal (required around OTP access).
  Xti,
  /// Force the 125 MHz PLL.
  Pll,
}

// ── Type-state markers (zero-size) ──────────────────────────────────────────

pub struct Uninitialized;
pub struct Ready;

// ── Driver struct ───────────────────────────────────────────────────────────

/// DW1000 driver, generic over the SPI transport (local bus or network
/// tunnel) and the compile-time lifecycle state.
pub struct Dw1000<T, STATE> {
  transport: T,
  cfg: RadioConfig,
  _state: STATE,
}

impl<T, STATE> Dw1000<T, STATE> {
  fn into_state<S>(self, state: S) -> Dw1000<T, S> {
    Dw1000 { transport: self.transport, cfg: self.cfg, _state: state }
  }
}

impl<T: Transport, STATE> Dw1000<T, STATE> {
  /// Diagnostic tag of the underlying transport.
  pub fn id(&self) -> &str {
    self.transport.id()
  }

  /// The underlying transport, for diagnostics.
  pub fn transport(&self) -> &T {
    &self.transport
  }

  pub fn transport_mut(&mut self) -> &mut T {
    &mut self.transport
  }
}

// ── Uninitialized ───────────────────────────────────────────────────────────

impl<T: Transport> Dw1000<T, Uninitialized> {
  /// Wrap a transport. The chip is assumed powered but in an unknown state.
  pub fn new(transport: T) -> Self {
    Dw1000 { transport, cfg: RadioConfig::default(), _state: Uninitialized }
  }

  /// Hardware reset: assert the reset line for 1 ms, release, give the
  /// chip 10 ms to boot, then probe DEV_ID to verify the link.
  pub fn reset(mut self) -> Result<Dw1000<T, Ready>, Error> {
    self
      .transport
      .reset(true)
      .map_err(|e| ll::wrap_transport(&self.transport, e))?;
    msdelay(1);
    self
      .transport
      .reset(false)
      .map_err(|e| ll::wrap_transport(&self.transport, e))?;
    msdelay(10);

    let mut dev_id = RegisterValue::new(&registers::DEV_ID);
    dev_id.read(&mut self.transport)?;
    if dev_id.field("RIDTAG")? != RIDTAG_DECA {
      return Err(Error::UnexpectedDeviceId(dev_id.value()));
    }
    debug!("{} DEV_ID {:#010x}", self.transport.id(), dev_id.value());

    Ok(self.into_state(Ready))
  }
}

// ── Ready ───────────────────────────────────────────────────────────────────

impl<T: Transport> Dw1000<T, Ready> {
  /// Soft reset via PMSC_CTRL0.SOFTRESET, with the system clock forced to
  /// XTI across the reset pulse to avoid glitching the PLL.
  pub fn soft_reset(&mut self) -> Result<(), Error> {
    let t = &mut self.transport;
    RegisterValue::new(&registers::DEV_ID).read(t)?;
    let mut pmsc = RegisterValue::new(&registers::PMSC_CTRL0);
    pmsc.read(t)?;
    pmsc.set("SYSCLKS", 1)?.write(t)?;
    msdelay(5);
    pmsc.set("SOFTRESET", 0)?.write(t)?;
    pmsc.set("SOFTRESET", 0xF)?.write(t)?;
    pmsc.set("SYSCLKS", 0)?.write(t)?;
    msdelay(5);
    Ok(())
  }

  /// Full initialisation for the given operating profile.
  ///
  /// Soft-resets the chip, loads the LDE microcode under the XTI clock,
  /// then programs event masks, LEDs, event counters, system config, LDE,
  /// frequency synthesiser, analog front end, digital receiver tuning,
  /// AGC, channel selection, frame control, antenna delays and TX power,
  /// in that order.
  pub fn initialise(&mut self, cfg: RadioConfig) -> Result<(), Error> {
    self.cfg = cfg;
    let pcode = cfg.channel.preamble_code(cfg.pulse_freq);

    self.soft_reset()?;
    // OTP address 4 primes the analog calibration loaded at power-up.
    self.read_otp(4, 4)?;

    let t = &mut self.transport;

    // Load the LDE microcode with the system clock on XTI.
    let mut pmsc = RegisterValue::new(&registers::PMSC_CTRL0);
    pmsc.read(t)?;
    pmsc.set("SYSCLKS", 1)?.write(t)?;
    msdelay(5);
    RegisterValue::new(&registers::EC_CTRL).set("PLLLDT", 1)?.write(t)?;
    RegisterValue::new(&registers::OTP_SF).set("LDO_KICK", 1)?.write(t)?;
    RegisterValue::with_value(&registers::OTP_CTRL, 0x8000).write(t)?;
    msdelay(5);
    pmsc.set("GPDCE", 1)?.set("KHZCLKEN", 1)?.write(t)?;
    pmsc.set("SYSCLKS", 0)?.write(t)?;
    msdelay(5);

    // Select the events that raise IRQ.
    RegisterValue::with_value(&registers::SYS_MASK, SYS_MASK_VAL).write(t)?;

    // Run the LDE on every frame; divide the kHz clock for the LEDs.
    RegisterValue::new(&registers::PMSC_CTRL1)
      .set("PKTSEQ", 0xE7)?
      .set("LDERUNE", 1)?
      .set("KHZCLKDIV", 20)?
      .write(t)?;
    // Route the Rx/Tx LEDs to GPIO2/GPIO3 and blink them once.
    RegisterValue::new(&registers::GPIO_MODE)
      .set("MSGP2", 1)?
      .set("MSGP3", 1)?
      .write(t)?;
    RegisterValue::new(&registers::PMSC_LEDC)
      .set("BLINK_TIM", 10)?
      .set("BLINKEN", 1)?
      .write(t)?;
    self.blink_leds()?;

    // Clear then enable the event counters.
    let t = &mut self.transport;
    let mut evc = RegisterValue::new(&registers::EVC_CTRL);
    evc.set("EVC_CLR", 1)?.write(t)?;
    evc.set("EVC_CLR", 1)?.set("EVC_EN", 1)?.write(t)?;

    // System configuration from the profile flags.
    RegisterValue::new(&registers::SYS_CFG)
      .set_flag("DIS_STXP", !cfg.smart_tx_power)?
      .set_flag("DIS_DRXB", !cfg.rx_double_buffer)?
      .set("PHR_MODE", if cfg.long_frames { 3 } else { 0 })?
      .set_flag("RXAUTR", cfg.rx_auto_enable)?
      .set_flag("AUTOACK", cfg.auto_ack)?
      .set_flag("RXM110K", cfg.bit_rate == BitRate::Kbps110)?
      .set("HIRQ_POL", 1)?
      .write(t)?;

    // Leading-edge detection tuning.
    let repc_shift = if cfg.bit_rate == BitRate::Kbps110 { 3 } else { 0 };
    RegisterValue::with_value(&registers::LDE_REPC, crate::config::lde_repc(pcode) >> repc_shift)
      .write(t)?;
    RegisterValue::new(&registers::LDE_CFG1).set("NTM", 0xD)?.set("PMULT", 3)?.write(t)?;
    RegisterValue::with_value(&registers::LDE_CFG2, cfg.pulse_freq.lde_cfg2()).write(t)?;

    // Frequency synthesiser.
    RegisterValue::with_value(&registers::FS_PLLCFG, cfg.channel.fs_pllcfg()).write(t)?;
    RegisterValue::with_value(&registers::FS_XTALT, 0x72).write(t)?;

    // Analog front end for the selected channel.
    RegisterValue::with_value(&registers::RF_RXCTRLH, cfg.channel.rf_rxctrlh()).write(t)?;
    RegisterValue::with_value(&registers::RF_TXCTRL, cfg.channel.rf_txctrl()).write(t)?;

    // Digital receiver tuning.
    RegisterValue::with_value(&registers::DRX_TUNE0B, cfg.bit_rate.drx_tune0b()).write(t)?;
    RegisterValue::with_value(&registers::DRX_TUNE1A, cfg.pulse_freq.drx_tune1a()).write(t)?;
    let plen = cfg.preamble_len;
    let tune1b = if cfg.bit_rate == BitRate::Kbps110 && plen.symbols() > 1024 {
      0x64
    } else if cfg.bit_rate == BitRate::Kbps6800 && plen == PreambleLength::P64 {
      0x10
    } else {
      0x20
    };
    RegisterValue::with_value(&registers::DRX_TUNE1B, tune1b).write(t)?;
    RegisterValue::with_value(&registers::DRX_TUNE2, plen.drx_tune2(cfg.pulse_freq)).write(t)?;
    let tune4h = if plen == PreambleLength::P64 { 0x10 } else { 0x28 };
    RegisterValue::with_value(&registers::DRX_TUNE4H, tune4h).write(t)?;

    // Automatic gain control.
    RegisterValue::with_value(&registers::AGC_TUNE1, cfg.pulse_freq.agc_tune1()).write(t)?;
    RegisterValue::with_value(&registers::AGC_TUNE2, 0x2502_A907).write(t)?;
    RegisterValue::with_value(&registers::AGC_TUNE3, 0x0035).write(t)?;

    // Channel and preamble code, both directions.
    RegisterValue::new(&registers::CHAN_CTRL)
      .set("TX_CHAN", cfg.channel.number())?
      .set("RX_CHAN", cfg.channel.number())?
      .set("RXPRF", cfg.pulse_freq.encoding())?
      .set("TX_PCODE", pcode)?
      .set("RX_PCODE", pcode)?
      .write(t)?;

    // Transmit frame control (frame length is set per-frame later).
    RegisterValue::new(&registers::TX_FCTRL)
      .set("TXBR", cfg.bit_rate.txbr())?
      .set("TXPRF", cfg.pulse_freq.encoding())?
      .set("PE", plen.pe())?
      .set("TXPSR", plen.txpsr())?
      .set("TR", 1)?
      .write(t)?;

    // Antenna delays, pulse generator delay and TX power.
    RegisterValue::new(&registers::LDE_RXANTD).write(t)?;
    RegisterValue::new(&registers::TX_ANTD).write(t)?;
    RegisterValue::with_value(&registers::TC_PGDELAY, cfg.channel.tc_pgdelay()).write(t)?;
    RegisterValue::with_value(
      &registers::TX_POWER,
      cfg.channel.tx_power(cfg.pulse_freq, cfg.smart_tx_power),
    )
    .write(t)?;

    self.clear_irq()
  }

  /// Pulse the LED blink-now bits: all four LEDs on for one blink period.
  pub fn blink_leds(&mut self) -> Result<(), Error> {
    let t = &mut self.transport;
    let mut ledc = RegisterValue::new(&registers::PMSC_LEDC);
    ledc.read(t)?;
    ledc.set("BLNKNOW", 0xF)?.write(t)?;
    ledc.set("BLNKNOW", 0)?.write(t)?;
    Ok(())
  }

  /// Abort any transmit or receive in progress and clear latched status.
  pub fn idle(&mut self) -> Result<(), Error> {
    RegisterValue::new(&registers::SYS_CTRL)
      .set("TRXOFF", 1)?
      .write(&mut self.transport)?;
    self.clear_irq()
  }

  /// Return the receiver to a clean state and re-arm it.
  pub fn restart_rx(&mut self) -> Result<(), Error> {
    self.idle()?;
    self.start_rx()
  }

  /// Load an outbound frame into the TX buffer and set the frame length
  /// (payload plus the 2-byte CRC the chip appends).
  pub fn set_txdata(&mut self, data: &[u8]) -> Result<(), Error> {
    let mut tx = ll::addr_header(&registers::TX_BUFFER, true);
    tx.extend_from_slice(data);
    self
      .transport
      .transfer(&tx)
      .map_err(|e| ll::wrap_transport(&self.transport, e))?;

    let t = &mut self.transport;
    let mut fctrl = RegisterValue::new(&registers::TX_FCTRL);
    fctrl.read(t)?;
    fctrl.set("TFLEN", data.len() as u64 + 2)?.write(t)?;
    Ok(())
  }

  /// Start transmission, optionally at `SYS_TIME + delay` ticks, and
  /// optionally turning the receiver on once the frame is sent.
  pub fn start_tx(&mut self, delay: Option<u64>, wait_for_response: bool) -> Result<(), Error> {
    let t = &mut self.transport;
    let mut ctrl = RegisterValue::new(&registers::SYS_CTRL);
    if let Some(delay) = delay {
      let mut now = RegisterValue::new(&registers::SYS_TIME);
      now.read(t)?;
      RegisterValue::with_value(&registers::DX_TIME, now.value().wrapping_add(delay)).write(t)?;
      ctrl.set("TXDLYS", 1)?;
    }
    ctrl.set("TXSTRT", 1)?.set_flag("WAIT4RESP", wait_for_response)?.write(t)?;
    Ok(())
  }

  /// Arm the receiver. Any stale interrupt flag is dropped first so a
  /// subsequent interrupt unambiguously belongs to this reception.
  pub fn start_rx(&mut self) -> Result<(), Error> {
    self.transport.clear_interrupt();
    RegisterValue::new(&registers::SYS_CTRL)
      .set("RXENAB", 1)?
      .write(&mut self.transport)
  }

  /// Clear all latched event bits by writing SYS_STATUS back to itself.
  pub fn clear_irq(&mut self) -> Result<(), Error> {
    let t = &mut self.transport;
    let mut status = RegisterValue::new(&registers::SYS_STATUS);
    status.read(t)?;
    status.write(t)
  }

  /// Transmit timestamp of the last sent frame.
  pub fn tx_time(&mut self) -> Result<Timestamp, Error> {
    let mut r = RegisterValue::new(&registers::TX_TIME1);
    r.read(&mut self.transport)?;
    Ok(Timestamp::new(r.field("TX_STAMP")?))
  }

  /// Receive timestamp of the last accepted frame.
  pub fn rx_time(&mut self) -> Result<Timestamp, Error> {
    let mut r = RegisterValue::new(&registers::RX_TIME1);
    r.read(&mut self.transport)?;
    Ok(Timestamp::new(r.field("RX_STAMP")?))
  }

  /// Read the received frame out of the RX buffer, stripping the trailing
  /// 2-byte CRC. Empty means no payload is ready.
  pub fn rx_data(&mut self) -> Result<Vec<u8>, Error> {
    let t = &mut self.transport;
    let mut finfo = RegisterValue::new(&registers::RX_FINFO);
    finfo.read(t)?;
    let mut nbytes = finfo.field("RXFLEN")? as usize;
    if !self.cfg.long_frames {
      nbytes &= 0x7F;
    }
    if nbytes <= 2 {
      return Ok(Vec::new());
    }

    let mut tx = ll::addr_header(&registers::RX_BUFFER, false);
    let hdr_len = tx.len();
    tx.resize(hdr_len + nbytes, 0);
    let resp = self
      .transport
      .transfer(&tx)
      .map_err(|e| ll::wrap_transport(&self.transport, e))?;
    if resp.len() < hdr_len + 2 {
      return Ok(Vec::new());
    }
    Ok(resp[hdr_len..resp.len() - 2].to_vec())
  }

  /// Fetch the received frame if one is ready: requires a pending
  /// interrupt (or the IRQS fallback) and SYS_STATUS.RXDFR.
  pub fn get_rxdata(&mut self) -> Result<Vec<u8>, Error> {
    if !self.check_interrupt()? {
      return Ok(Vec::new());
    }
    let mut status = RegisterValue::new(&registers::SYS_STATUS);
    status.read(&mut self.transport)?;
    if status.field("RXDFR")? == 0 {
      return Ok(Vec::new());
    }
    self.rx_data()
  }

  /// One-line dump of the non-zero status fields, for miss diagnostics.
  pub fn sys_status(&mut self) -> Result<String, Error> {
    let mut status = RegisterValue::new(&registers::SYS_STATUS);
    status.read(&mut self.transport)?;
    Ok(format!("Status {} {}", self.transport.id(), status.field_values(false)))
  }

  /// True if the transport has seen the IRQ line rise.
  pub fn check_irq(&mut self) -> bool {
    self.transport.interrupt_pending()
  }

  /// Drop the transport-level interrupt flag.
  pub fn clear_interrupt(&mut self) {
    self.transport.clear_interrupt();
  }

  /// Interrupt check with a register fallback: when the transport shows
  /// nothing, consult SYS_STATUS.IRQS before declaring a miss.
  fn check_interrupt(&mut self) -> Result<bool, Error> {
    if self.check_irq() {
      return Ok(true);
    }
    debug!("{} missed interrupt", self.transport.id());
    let mut status = RegisterValue::new(&registers::SYS_STATUS);
    status.read(&mut self.transport)?;
    Ok(status.field("IRQS")? != 0)
  }

  /// Drive GPIO8 (the IRQ pin) high then low to self-generate an
  /// interrupt, then restore the pin to its IRQ function.
  pub fn pulse_irq(&mut self) -> Result<(), Error> {
    let t = &mut self.transport;
    let mut mode = RegisterValue::new(&registers::GPIO_MODE);
    mode.read(t)?;
    mode.set("MSGP8", 1)?.write(t)?;
    let mut dir = RegisterValue::new(&registers::GPIO_DIR);
    dir.read(t)?;
    dir.set("GDP8", 0)?.set("GDM8", 1)?.write(t)?;
    let mut dout = RegisterValue::new(&registers::GPIO_DOUT);
    dout.read(t)?;
    dout.set("GOP8", 1)?.set("GOM8", 1)?.write(t)?;
    msdelay(10);
    dout.set("GOP8", 0)?.write(t)?;
    mode.set("MSGP8", 0)?.write(t)?;
    Ok(())
  }

  /// IRQ self-test: pulse the pin, verify the transport saw it, clear.
  /// A `false` result means the IRQ path (pin, edge config, notification
  /// plumbing) is broken and ranging cannot work.
  pub fn test_irq(&mut self) -> Result<bool, Error> {
    self.pulse_irq()?;
    let seen = self.check_irq();
    self.clear_interrupt();
    Ok(seen)
  }

  /// Program the PAN ID and short address.
  pub fn set_panadr(&mut self, pan: u64, addr: u64) -> Result<(), Error> {
    RegisterValue::new(&registers::PANADR)
      .set("PAN_ID", pan)?
      .set("SHORT_ADDR", addr)?
      .write(&mut self.transport)
  }

  /// Select the system clock source.
  pub fn set_clock(&mut self, clk: ClockSource) -> Result<(), Error> {
    let t = &mut self.transport;
    let mut pmsc = RegisterValue::new(&registers::PMSC_CTRL0);
    pmsc.read(t)?;
    match clk {
      ClockSource::Auto => {
        pmsc.set("SYSCLKS", 0)?.set("RXCLKS", 0)?.set("TXCLKS", 0)?;
      }
      ClockSource::Xti => {
        pmsc.set("SYSCLKS", 1)?;
      }
      ClockSource::Pll => {
        pmsc.set("SYSCLKS", 2)?;
      }
    }
    pmsc.write(t)?;
    msdelay(5);
    Ok(())
  }

  /// Read 4–8 bytes from OTP memory at `addr`. The OTP block is only
  /// accessible under the XTI clock; the auto clock is restored before
  /// returning.
  pub fn read_otp(&mut self, addr: u64, nbytes: usize) -> Result<u64, Error> {
    self.set_clock(ClockSource::Xti)?;
    let t = &mut self.transport;

    RegisterValue::new(&registers::OTP_ADDR).set("OTP_ADDR", addr)?.write(t)?;
    let mut ctrl = RegisterValue::new(&registers::OTP_CTRL);
    ctrl.set("OTPRDEN", 1)?.set("OTPREAD", 1)?.write(t)?;
    ctrl.set("OTPREAD", 0)?.write(t)?;
    let mut val = RegisterValue::new(&registers::OTP_RDAT).read(t)?.value();

    if nbytes > 4 {
      RegisterValue::new(&registers::OTP_ADDR).set("OTP_ADDR", addr + 4)?.write(t)?;
      ctrl.set("OTPREAD", 1)?.write(t)?;
      ctrl.set("OTPREAD", 0)?.write(t)?;
      val |= RegisterValue::new(&registers::OTP_RDAT).read_n(t, nbytes - 4)?.value() << 32;
    }
    ctrl.set("OTPRDEN", 0)?.write(t)?;

    self.set_clock(ClockSource::Auto)?;
    Ok(val)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::RadioConfig;
  use crate::mock::MockRadio;

  fn ready_driver() -> Dw1000<MockRadio, Ready> {
    Dw1000::new(MockRadio::new("t")).reset().unwrap()
  }

  #[test]
  fn reset_probes_dev_id() {
    let dw = Dw1000::new(MockRadio::new("t")).reset();
    assert!(dw.is_ok());
  }

  #[test]
  fn reset_rejects_implausible_dev_id() {
    let mut radio = MockRadio::new("t");
    radio.seed(&registers::DEV_ID, 0x1234_5678);
    assert!(matches!(
      Dw1000::new(radio).reset(),
      Err(Error::UnexpectedDeviceId(0x1234_5678))
    ));
  }

  #[test]
  fn initialise_programs_default_profile() {
    let mut dw = ready_driver();
    dw.initialise(RadioConfig::default()).unwrap();
    let radio = &dw.transport;

    assert_eq!(radio.current(&registers::SYS_MASK), 0x2403_D000);
    // Channel 2, 110 kbps, PRF 64, preamble 1024, flat power.
    assert_eq!(radio.current(&registers::TX_POWER), 0x6767_6767);
    assert_eq!(radio.current(&registers::TC_PGDELAY), 0xC2);
    assert_eq!(radio.current(&registers::RF_TXCTRL), 0x45CA0);
    assert_eq!(radio.current(&registers::RF_RXCTRLH), 0xD8);
    assert_eq!(radio.current(&registers::FS_PLLCFG), 0x0840_0508);
    assert_eq!(radio.current(&registers::FS_XTALT), 0x72);
    assert_eq!(radio.current(&registers::LDE_CFG2), 0x0607);
    // Preamble code 9 replica coefficient, scaled for 110 kbps.
    assert_eq!(radio.current(&registers::LDE_REPC), 0x28F4 >> 3);
    assert_eq!(radio.current(&registers::AGC_TUNE1), 0x889B);
    assert_eq!(radio.current(&registers::AGC_TUNE2), 0x2502_A907);
    assert_eq!(radio.current(&registers::AGC_TUNE3), 0x0035);
    assert_eq!(radio.current(&registers::DRX_TUNE0B), 0x16);
    assert_eq!(radio.current(&registers::DRX_TUNE1A), 0x8D);
    assert_eq!(radio.current(&registers::DRX_TUNE1B), 0x20);
    assert_eq!(radio.current(&registers::DRX_TUNE2), 0x353B_015E);
    assert_eq!(radio.current(&registers::DRX_TUNE4H), 0x28);

    let sys_cfg = RegisterValue::with_value(&registers::SYS_CFG, radio.current(&registers::SYS_CFG));
    assert_eq!(sys_cfg.field("DIS_STXP").unwrap(), 1);
    assert_eq!(sys_cfg.field("DIS_DRXB").unwrap(), 1);
    assert_eq!(sys_cfg.field("PHR_MODE").unwrap(), 0);
    assert_eq!(sys_cfg.field("RXM110K").unwrap(), 1);
    assert_eq!(sys_cfg.field("HIRQ_POL").unwrap(), 1);

    let chan = RegisterValue::with_value(&registers::CHAN_CTRL, radio.current(&registers::CHAN_CTRL));
    assert_eq!(chan.field("TX_CHAN").unwrap(), 2);
    assert_eq!(chan.field("RX_CHAN").unwrap(), 2);
    assert_eq!(chan.field("RXPRF").unwrap(), 2);
    assert_eq!(chan.field("TX_PCODE").unwrap(), 9);
    assert_eq!(chan.field("RX_PCODE").unwrap(), 9);

    let fctrl = RegisterValue::with_value(&registers::TX_FCTRL, radio.current(&registers::TX_FCTRL));
    assert_eq!(fctrl.field("TXBR").unwrap(), 0);
    assert_eq!(fctrl.field("TXPRF").unwrap(), 2);
    assert_eq!(fctrl.field("TXPSR").unwrap(), 2);
    assert_eq!(fctrl.field("PE").unwrap(), 0);
    assert_eq!(fctrl.field("TR").unwrap(), 1);
  }

  #[test]
  fn soft_reset_pulses_pmsc() {
    let mut dw = ready_driver();
    dw.soft_reset().unwrap();
    // SYSCLKS=1, SOFTRESET=0, SOFTRESET=0xF, SYSCLKS=0.
    assert_eq!(dw.transport.write_count(&registers::PMSC_CTRL0), 4);
  }

  #[test]
  fn set_txdata_fills_buffer_and_length() {
    let mut dw = ready_driver();
    dw.set_txdata(&[0xC5, 0x01, 0xAA]).unwrap();
    let radio = &dw.transport;
    assert_eq!(radio.bytes(&registers::TX_BUFFER, 3), [0xC5, 0x01, 0xAA]);
    let fctrl = RegisterValue::with_value(&registers::TX_FCTRL, radio.current(&registers::TX_FCTRL));
    assert_eq!(fctrl.field("TFLEN").unwrap(), 5);
  }

  #[test]
  fn delayed_tx_programs_dx_time() {
    let mut dw = ready_driver();
    dw.transport.seed(&registers::SYS_TIME, 1000);
    dw.start_tx(Some(0x100), true).unwrap();
    assert_eq!(dw.transport.current(&registers::DX_TIME), 1000 + 0x100);
    // TXSTRT | TXDLYS | WAIT4RESP.
    assert_eq!(dw.transport.current(&registers::SYS_CTRL), 0x86);
  }

  #[test]
  fn immediate_tx_sets_only_txstrt() {
    let mut dw = ready_driver();
    dw.start_tx(None, false).unwrap();
    assert_eq!(dw.transport.current(&registers::SYS_CTRL), 0x02);
    assert_eq!(dw.transport.write_count(&registers::DX_TIME), 0);
  }

  #[test]
  fn rx_data_strips_crc() {
    let mut dw = ready_driver();
    dw.transport.seed(&registers::RX_FINFO, 12);
    dw.transport.seed_bytes(&registers::RX_BUFFER, &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12]);
    assert_eq!(dw.rx_data().unwrap(), [1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);
  }

  #[test]
  fn rx_data_empty_when_no_frame() {
    let mut dw = ready_driver();
    dw.transport.seed(&registers::RX_FINFO, 2);
    assert!(dw.rx_data().unwrap().is_empty());
  }

  #[test]
  fn get_rxdata_requires_interrupt_and_rxdfr() {
    let mut dw = ready_driver();
    dw.transport.seed(&registers::RX_FINFO, 12);
    dw.transport.seed_bytes(&registers::RX_BUFFER, &[0; 12]);

    // No interrupt, IRQS clear: nothing.
    assert!(dw.get_rxdata().unwrap().is_empty());

    // Interrupt but no RXDFR: nothing.
    dw.transport.auto_irq = true;
    assert!(dw.get_rxdata().unwrap().is_empty());

    // RXDFR set: payload comes back.
    let mut status = RegisterValue::new(&registers::SYS_STATUS);
    status.set("RXDFR", 1).unwrap();
    dw.transport.seed(&registers::SYS_STATUS, status.value());
    assert_eq!(dw.get_rxdata().unwrap().len(), 10);
  }

  #[test]
  fn irq_self_test_round_trip() {
    let mut dw = ready_driver();
    assert!(dw.test_irq().unwrap());
    // The flag was cleared on the way out.
    assert!(!dw.check_irq());
  }

  #[test]
  fn otp_read_restores_auto_clock() {
    let mut dw = ready_driver();
    dw.transport.seed(&registers::OTP_RDAT, 0xAABB_CCDD);
    assert_eq!(dw.read_otp(4, 4).unwrap(), 0xAABB_CCDD);

    let otp_addr =
      RegisterValue::with_value(&registers::OTP_ADDR, dw.transport.current(&registers::OTP_ADDR));
    assert_eq!(otp_addr.field("OTP_ADDR").unwrap(), 4);
    // OTPRDEN was dropped and the clock handed back to auto sequencing.
    let ctrl = RegisterValue::with_value(&registers::OTP_CTRL, dw.transport.current(&registers::OTP_CTRL));
    assert_eq!(ctrl.field("OTPRDEN").unwrap(), 0);
    let pmsc =
      RegisterValue::with_value(&registers::PMSC_CTRL0, dw.transport.current(&registers::PMSC_CTRL0));
    assert_eq!(pmsc.field("SYSCLKS").unwrap(), 0);
  }

  #[test]
  fn idle_aborts_and_clears() {
    let mut dw = ready_driver();
    dw.idle().unwrap();
    assert_eq!(dw.transport.current(&registers::SYS_CTRL), 0x40);
    assert!(dw.transport.write_count(&registers::SYS_STATUS) > 0);
  }

  #[test]
  fn timestamps_latch_on_trx_start() {
    let mut dw = ready_driver();
    dw.transport.tx_stamps.push_back(0x12_3456_789A);
    dw.transport.rx_stamps.push_back(0xFF_0000_0001);
    dw.start_tx(None, false).unwrap();
    dw.start_rx().unwrap();
    assert_eq!(dw.tx_time().unwrap().ticks(), 0x12_3456_789A);
    assert_eq!(dw.rx_time().unwrap().ticks(), 0xFF_0000_0001);
  }

  #[test]
  fn set_panadr_packs_both_fields() {
    let mut dw = ready_driver();
    dw.set_panadr(10, 1).unwrap();
    assert_eq!(dw.transport.current(&registers::PANADR), 0x000A_0001);
  }
}
