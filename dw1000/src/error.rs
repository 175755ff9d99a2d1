use thiserror::Error;

/// Errors from the DW1000 driver and its transport.
#[derive(Debug, Error)]
pub enum Error {
  /// The transport could not complete a transfer.
  #[error("transport {id}: {source}")]
  Transport {
    id: String,
    #[source]
    source: TransportError,
  },

  /// DEV_ID probe returned a value that cannot be a DW1000.
  #[error("unexpected DEV_ID {0:#010x}")]
  UnexpectedDeviceId(u64),

  /// A register has no field with the requested name. Programmer error.
  #[error("register {register} has no field {field}")]
  UnknownField {
    register: &'static str,
    field: &'static str,
  },

  /// A field was set to a value wider than the field. Programmer error.
  #[error("value {value:#x} does not fit {width}-bit field {register}.{field}")]
  FieldOverflow {
    register: &'static str,
    field: &'static str,
    width: u32,
    value: u64,
  },

  /// The IRQ self-test saw no interrupt from the radio.
  #[error("no interrupt during IRQ self-test")]
  IrqTestFailed,
}

/// Errors raised by a `Transport` implementation.
#[derive(Debug, Error)]
pub enum TransportError {
  #[error(transparent)]
  Io(#[from] std::io::Error),
}
