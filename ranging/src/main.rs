// Host-side two-way ranging between a pair of tunneled DW1000 radios.
//
// Both radios are hardware-reset and must pass the IRQ self-test before
// any configuration happens; a radio whose interrupt path is broken can
// receive frames but never report them, which would look like an endless
// miss streak. Successful rounds print both distance estimates to stdout;
// diagnostics go to the logger.

use anyhow::{Context, bail};
use clap::Parser;
use dw1000::Dw1000;
use dw1000::config::RadioConfig;
use log::info;

use ranging::tunnel::UdpTunnel;
use ranging::twr::Ranger;

#[derive(Parser)]
#[command(version, about = "DW1000 two-way ranging over tunneled SPI")]
struct Args {
  /// Tunnel endpoint of the first radio.
  #[arg(default_value = "10.1.1.235:1401")]
  radio_a: String,

  /// Tunnel endpoint of the second radio.
  #[arg(default_value = "10.1.1.230:1401")]
  radio_b: String,

  /// Log transport traffic.
  #[arg(short, long)]
  verbose: bool,
}

fn main() -> anyhow::Result<()> {
  let args = Args::parse();
  let filter = if args.verbose { "debug" } else { "info" };
  env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

  let cfg = RadioConfig::default();

  let tunnel_a = UdpTunnel::connect(&args.radio_a, "1")
    .with_context(|| format!("connecting to {}", args.radio_a))?;
  let mut dw_a = Dw1000::new(tunnel_a).reset().context("resetting radio 1")?;
  if !dw_a.test_irq()? {
    bail!("no interrupt from radio 1");
  }

  let tunnel_b = UdpTunnel::connect(&args.radio_b, "2")
    .with_context(|| format!("connecting to {}", args.radio_b))?;
  let mut dw_b = Dw1000::new(tunnel_b).reset().context("resetting radio 2")?;
  if !dw_b.test_irq()? {
    bail!("no interrupt from radio 2");
  }

  dw_a.initialise(cfg).context("initialising radio 1")?;
  dw_b.initialise(cfg).context("initialising radio 2")?;
  info!("both radios configured, starting ranging");

  let mut ranger = Ranger::new(dw_a, dw_b, cfg);
  loop {
    if let Some(result) = ranger.tick()? {
      let (d1, d2) = result.distances();
      println!("{d1:7.3} {d2:7.3}");
    }
  }
}
