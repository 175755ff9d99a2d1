// Symmetric double-sided two-way ranging between two DW1000 drivers.
//
// Each round exchanges three blink frames:
//
//   1. A → B   (A's tag, B pre-armed for receive)
//   2. B → A   (B's tag, A pre-armed)
//   3. A → B   (A's tag again)
//
// The four hardware timestamps on each side give two independent one-way
// flight-time estimates: the naive symmetric estimate (dt1 - dt2) / 2 and
// the double-sided estimate that cancels clock-offset bias. A missed
// frame aborts the round; after more than MISS_STREAK_LIMIT consecutive
// misses both radios are soft-reset and reconfigured.

use dw1000::config::RadioConfig;
use dw1000::time::TSTAMP_DIST;
use dw1000::transport::Transport;
use dw1000::{Dw1000, Error, Ready};
use log::{info, warn};

use crate::frame::Blink;

/// Consecutive missed rounds tolerated before both radios are reset.
const MISS_STREAK_LIMIT: u32 = 10;

/// Successful rounds between progress ticks on the diagnostic channel.
const PROGRESS_INTERVAL: u64 = 100;

/// Tag identifiers carried by each side's blink frames.
pub const TAG_A: u64 = 0x0101_0101_0101_0101;
pub const TAG_B: u64 = 0x0202_0202_0202_0202;

/// One-way flight-time estimates for a completed round, in radio ticks.
#[derive(Clone, Copy, Debug)]
pub struct RangingResult {
  /// Symmetric estimate (dt1 - dt2) / 2. Carries the full clock-offset
  /// error of both radios.
  pub symmetric: f64,
  /// Double-sided estimate (round1·round2 - reply1·reply2) / (sum).
  pub double_sided: f64,
}

impl RangingResult {
  /// Both estimates converted to metres.
  pub fn distances(&self) -> (f64, f64) {
    (self.symmetric * TSTAMP_DIST, self.double_sided * TSTAMP_DIST)
  }
}

/// Compute both estimators from the six mod-2^40 timestamp differences.
/// The double-sided products need 128-bit intermediates: each span is up
/// to 2^40, so a product is up to 2^80.
pub fn flight_times(
  dt1: u64,
  dt2: u64,
  round1: u64,
  round2: u64,
  reply1: u64,
  reply2: u64,
) -> RangingResult {
  let symmetric = (dt1 as i128 - dt2 as i128) as f64 / 2.0;

  let num = round1 as i128 * round2 as i128 - reply1 as i128 * reply2 as i128;
  let den = round1 as i128 + round2 as i128 + reply1 as i128 + reply2 as i128;
  let double_sided = if den == 0 { 0.0 } else { num as f64 / den as f64 };

  RangingResult { symmetric, double_sided }
}

/// Drives the three-frame exchange between two configured radios.
pub struct Ranger<T: Transport> {
  a: Dw1000<T, Ready>,
  b: Dw1000<T, Ready>,
  blink_a: Blink,
  blink_b: Blink,
  cfg: RadioConfig,
  streak: u32,
  rounds: u64,
}

/// Send one blink from `tx` to `rx`. The receiver is armed first, then
/// the frame is loaded and sent. A non-empty payload acknowledges the
/// receiver's IRQ; empty means the frame was missed.
fn exchange<T: Transport>(
  tx: &mut Dw1000<T, Ready>,
  rx: &mut Dw1000<T, Ready>,
  frame: &[u8],
) -> Result<Vec<u8>, Error> {
  rx.start_rx()?;
  tx.set_txdata(frame)?;
  tx.start_tx(None, false)?;
  let data = rx.get_rxdata()?;
  if !data.is_empty() {
    rx.clear_irq()?;
  }
  Ok(data)
}

impl<T: Transport> Ranger<T> {
  pub fn new(a: Dw1000<T, Ready>, b: Dw1000<T, Ready>, cfg: RadioConfig) -> Self {
    Ranger {
      a,
      b,
      blink_a: Blink::new(TAG_A),
      blink_b: Blink::new(TAG_B),
      cfg,
      streak: 0,
      rounds: 0,
    }
  }

  /// Current run of consecutive missed rounds.
  pub fn streak(&self) -> u32 {
    self.streak
  }

  /// Total successful rounds.
  pub fn rounds(&self) -> u64 {
    self.rounds
  }

  pub fn driver_a(&self) -> &Dw1000<T, Ready> {
    &self.a
  }

  pub fn driver_b(&self) -> &Dw1000<T, Ready> {
    &self.b
  }

  /// Run one ranging round. `None` means a frame was missed and the
  /// round was abandoned; the partial exchange is not salvaged.
  pub fn round(&mut self) -> Result<Option<RangingResult>, Error> {
    // Frame 1: A → B.
    let f1 = self.blink_a.next_frame();
    if exchange(&mut self.a, &mut self.b, &f1)?.is_empty() {
      warn!("{}", self.b.sys_status()?);
      return Ok(None);
    }

    // Frame 2: B → A.
    let f2 = self.blink_b.next_frame();
    if exchange(&mut self.b, &mut self.a, &f2)?.is_empty() {
      warn!("{}", self.a.sys_status()?);
      return Ok(None);
    }

    // Both sides now hold the frame-1/frame-2 stamp pairs. They must be
    // read before frame 3 overwrites the receive stamp on B.
    let dt1 = self.a.rx_time()? - self.a.tx_time()?;
    let dt2 = self.b.tx_time()? - self.b.rx_time()?;
    let (tx1, rx1) = (self.a.tx_time()?, self.b.rx_time()?);
    let (tx2, rx2) = (self.b.tx_time()?, self.a.rx_time()?);

    // Frame 3: A → B.
    let f3 = self.blink_a.next_frame();
    if exchange(&mut self.a, &mut self.b, &f3)?.is_empty() {
      warn!("{}", self.b.sys_status()?);
      return Ok(None);
    }
    let (tx3, rx3) = (self.a.tx_time()?, self.b.rx_time()?);

    Ok(Some(flight_times(
      dt1,
      dt2,
      rx2 - tx1,
      rx3 - tx2,
      tx2 - rx1,
      tx3 - rx2,
    )))
  }

  /// One scheduler step: attempt a round, maintain the miss streak, and
  /// reset both radios once the streak is exhausted.
  pub fn tick(&mut self) -> Result<Option<RangingResult>, Error> {
    match self.round()? {
      Some(result) => {
        self.streak = 0;
        self.rounds += 1;
        if self.rounds % PROGRESS_INTERVAL == 0 {
          info!("{} rounds", self.rounds);
        }
        Ok(Some(result))
      }
      None => {
        self.streak += 1;
        if self.streak > MISS_STREAK_LIMIT {
          self.recover()?;
        }
        Ok(None)
      }
    }
  }

  /// Soft-reset and reconfigure both radios, clearing the miss streak.
  pub fn recover(&mut self) -> Result<(), Error> {
    warn!("resetting radios after {} missed rounds", self.streak);
    self.a.soft_reset()?;
    self.a.initialise(self.cfg)?;
    self.b.soft_reset()?;
    self.b.initialise(self.cfg)?;
    self.streak = 0;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use dw1000::mock::MockRadio;
  use dw1000::registers;
  use dw1000::time::{TICK_MODULUS, Timestamp};

  /// Spans for a stationary-anchor exchange: flight time `t`,
  /// reply delay `d`, per-side clock offsets, with all subtractions taken
  /// mod 2^40 so the scenario can straddle the counter wrap.
  fn scenario_spans(
    base: u64,
    t: u64,
    d: u64,
    eps_a: u64,
    eps_b: u64,
  ) -> (u64, u64, u64, u64, u64, u64) {
    let ts = Timestamp::new;
    let tx1 = base;
    let rx1 = tx1 + t + eps_b;
    let tx2 = rx1 + d;
    let rx2 = tx2 + t + eps_a;
    let tx3 = rx2 + d;
    let rx3 = tx3 + t + eps_b;

    let dt1 = ts(rx2) - ts(tx1);
    let dt2 = ts(tx2) - ts(rx1);
    let round1 = ts(rx2) - ts(tx1);
    let round2 = ts(rx3) - ts(tx2);
    let reply1 = ts(tx2) - ts(rx1);
    let reply2 = ts(tx3) - ts(rx2);
    (dt1, dt2, round1, round2, reply1, reply2)
  }

  #[test]
  fn stationary_anchors_recover_flight_time() {
    // ~3 m of flight time with one tick of clock offset per side.
    let (dt1, dt2, round1, round2, reply1, reply2) = scenario_spans(0, 640, 10_000, 1, 1);
    let result = flight_times(dt1, dt2, round1, round2, reply1, reply2);
    assert!((result.symmetric - 640.0).abs() <= 1.0);
    assert!((result.double_sided - 640.0).abs() <= 1.0);
  }

  #[test]
  fn estimators_survive_counter_wrap() {
    // The exchange straddles the 2^40 rollover.
    let base = TICK_MODULUS - 5_000;
    let (dt1, dt2, round1, round2, reply1, reply2) = scenario_spans(base, 640, 10_000, 0, 0);
    let result = flight_times(dt1, dt2, round1, round2, reply1, reply2);
    assert_eq!(result.symmetric, 640.0);
    assert_eq!(result.double_sided, 640.0);
  }

  #[test]
  fn double_sided_estimate_is_exact_on_clean_spans() {
    // round = reply + 2T exactly; both estimators agree.
    let result = flight_times(11_280, 10_000, 11_280, 11_280, 10_000, 10_000);
    assert_eq!(result.symmetric, 640.0);
    assert_eq!(result.double_sided, 640.0);
  }

  #[test]
  fn distances_scale_by_tick_length() {
    let result = RangingResult { symmetric: 640.0, double_sided: 640.0 };
    let (d1, d2) = result.distances();
    // 640 ticks is almost exactly 3 m.
    assert!((d1 - 3.0).abs() < 0.01);
    assert_eq!(d1, d2);
  }

  fn ready_pair() -> (Dw1000<MockRadio, Ready>, Dw1000<MockRadio, Ready>) {
    let a = Dw1000::new(MockRadio::new("1")).reset().unwrap();
    let b = Dw1000::new(MockRadio::new("2")).reset().unwrap();
    (a, b)
  }

  /// Prepare a mock to deliver frames: latched IRQ, RXDFR set, and a
  /// 12-byte frame (10 payload + CRC) in the receive buffer.
  fn arm_receive(radio: &mut MockRadio) {
    radio.auto_irq = true;
    radio.seed(&registers::SYS_STATUS, 1 << 13);
    radio.seed(&registers::RX_FINFO, 12);
    radio.seed_bytes(&registers::RX_BUFFER, &[0; 12]);
  }

  #[test]
  fn successful_round_produces_both_estimates() {
    let (mut a, mut b) = ready_pair();

    // Stationary scenario: T=640, reply delay 10000, no clock offset.
    a.transport_mut().tx_stamps.extend([0, 21_280]);
    a.transport_mut().rx_stamps.extend([11_280]);
    b.transport_mut().tx_stamps.extend([10_640]);
    b.transport_mut().rx_stamps.extend([640, 21_920]);
    arm_receive(a.transport_mut());
    arm_receive(b.transport_mut());

    let mut ranger = Ranger::new(a, b, RadioConfig::default());
    let result = ranger.tick().unwrap().expect("round should complete");
    assert_eq!(result.symmetric, 640.0);
    assert_eq!(result.double_sided, 640.0);
    assert_eq!(ranger.rounds(), 1);
    assert_eq!(ranger.streak(), 0);
  }

  #[test]
  fn miss_streak_triggers_radio_recovery() {
    // Neither mock ever raises an interrupt: every round misses.
    let (a, b) = ready_pair();
    let mut ranger = Ranger::new(a, b, RadioConfig::default());

    for expect in 1..=MISS_STREAK_LIMIT {
      assert!(ranger.tick().unwrap().is_none());
      assert_eq!(ranger.streak(), expect);
      // No reconfiguration yet: the LDE microcode load never ran.
      assert_eq!(ranger.driver_a().transport().write_count(&registers::OTP_CTRL), 0);
    }

    // The 11th consecutive miss forces soft-reset + initialise on both.
    assert!(ranger.tick().unwrap().is_none());
    assert_eq!(ranger.streak(), 0);
    assert!(ranger.driver_a().transport().write_count(&registers::OTP_CTRL) > 0);
    assert!(ranger.driver_b().transport().write_count(&registers::OTP_CTRL) > 0);
  }
}
