// src/reader/sync_reader/mod.rs

mod transaction;

use crate::common::{
    bus_state::{BusSlot, ReaderState},
    error::{RtdError, ValidationError},
    hal_traits::OpenBus,
    input::InputValue,
    reading::{ChannelReading, FirmwareVersion, Reading, READING_LEN},
    request::{ReadRequest, ReaderConfig},
};
use embedded_hal::i2c::{ErrorType, I2c};

/// Blocking reader for the RTD boards on one I2C bus.
///
/// `&mut self` on every read keeps a single transaction in flight per bus handle. For many
/// logical readers on one physical bus use [`crate::shared::SharedBus`].
#[derive(Debug)]
pub struct SensorChannelReader<I2C, V = ()> {
    bus: BusSlot<I2C>,
    config: ReaderConfig<V>,
    buffer: [u8; READING_LEN],
    last_validation_error: Option<ValidationError>,
}

impl<I2C, V> SensorChannelReader<I2C, V> {
    /// Creates a reader without a bus. Call [`initialize`](Self::initialize) or
    /// [`attach`](Self::attach) before reading.
    pub fn new(config: ReaderConfig<V>) -> Self {
        SensorChannelReader {
            bus: BusSlot::Uninitialized,
            config,
            buffer: [0; READING_LEN],
            last_validation_error: None,
        }
    }

    pub fn state(&self) -> ReaderState {
        self.bus.state()
    }

    pub fn config(&self) -> &ReaderConfig<V> {
        &self.config
    }

    /// The open bus, if any.
    pub fn bus(&self) -> Option<&I2C> {
        self.bus.bus()
    }

    /// Why the most recent request was rejected, or `None` if it passed validation.
    pub fn last_validation_error(&self) -> Option<&ValidationError> {
        self.last_validation_error.as_ref()
    }

    /// Closes the reader and hands back the bus; dropping it releases the device.
    ///
    /// Further reads fail with [`RtdError::BusClosed`]. Calling this again returns `None`.
    pub fn shutdown(&mut self) -> Option<I2C> {
        let bus = self.bus.close();
        if bus.is_some() {
            debug!("bus closed");
        }
        bus
    }
}

impl<I2C, V> SensorChannelReader<I2C, V>
where
    I2C: ErrorType,
{
    /// Installs an already opened bus.
    pub fn attach(&mut self, bus: I2C) -> Result<(), RtdError<I2C::Error>> {
        self.bus.attach::<I2C::Error>(bus)?;
        debug!("bus attached");
        Ok(())
    }
}

impl<I2C, V> SensorChannelReader<I2C, V>
where
    I2C: OpenBus,
{
    /// Opens bus `bus_number` and moves the reader to `Open`.
    ///
    /// On failure the reader stays `Uninitialized` and the error is
    /// [`RtdError::BusOpen`].
    pub fn initialize(&mut self, bus_number: u8) -> Result<(), RtdError<I2C::Error>> {
        self.bus.ensure_vacant::<I2C::Error>()?;
        let bus = I2C::open(bus_number).map_err(|e| {
            warn!("failed to open i2c bus {}", bus_number);
            RtdError::BusOpen(e)
        })?;
        self.bus.attach::<I2C::Error>(bus)?;
        debug!("bus {} open", bus_number);
        Ok(())
    }

    /// Shorthand for [`new`](Self::new) followed by [`initialize`](Self::initialize).
    pub fn open(bus_number: u8, config: ReaderConfig<V>) -> Result<Self, RtdError<I2C::Error>> {
        let mut reader = Self::new(config);
        reader.initialize(bus_number)?;
        Ok(reader)
    }
}

impl<I2C, V> SensorChannelReader<I2C, V>
where
    I2C: I2c,
    V: Clone,
{
    /// Reads one channel.
    ///
    /// Validation, clamping and payload evaluation happen before any bus traffic and before the
    /// lifecycle check. A failed transfer is reported as [`RtdError::Transaction`] and leaves
    /// the reader open.
    pub fn read_channel(
        &mut self,
        request: &ReadRequest<'_>,
    ) -> Result<ChannelReading<V>, RtdError<I2C::Error>> {
        let prepared = match self.config.prepare(request) {
            Ok(prepared) => {
                self.last_validation_error = None;
                prepared
            }
            Err(e) => {
                warn!("request rejected before bus access");
                self.last_validation_error = Some(e);
                return Err(e.into());
            }
        };
        self.bus.ensure_open::<I2C::Error>()?;

        let raw = self.block_read(prepared.address, prepared.register)?;
        Ok(ChannelReading {
            address: prepared.address,
            reading: Reading::from_le_bytes(raw),
            payload: prepared.payload,
        })
    }
}

impl<I2C, V> SensorChannelReader<I2C, V>
where
    I2C: I2c,
{
    /// Reads the firmware revision of the board at `stack`.
    ///
    /// The stack goes through the same validation as for a channel read, including a fixed
    /// stack in the reader's config.
    pub fn read_firmware_version<'r>(
        &mut self,
        stack: impl Into<InputValue<'r>>,
    ) -> Result<FirmwareVersion, RtdError<I2C::Error>> {
        let stack = match self.config.resolve_stack(stack.into()) {
            Ok(stack) => {
                self.last_validation_error = None;
                stack
            }
            Err(e) => {
                warn!("stack rejected before bus access");
                self.last_validation_error = Some(e);
                return Err(e.into());
            }
        };
        self.bus.ensure_open::<I2C::Error>()?;

        let raw = self.revision_read(stack)?;
        Ok(FirmwareVersion::from_bytes(raw))
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{
        address::{Quantity, RangePolicy},
        payload::{PayloadError, PayloadFn, PayloadMode},
    };
    use crate::mock::{BlockRead, MockI2c, MockI2cError, MOCK_BUS_NUMBER};

    fn open_reader() -> SensorChannelReader<MockI2c> {
        SensorChannelReader::open(MOCK_BUS_NUMBER, ReaderConfig::new()).unwrap()
    }

    fn transaction_count<V>(reader: &SensorChannelReader<MockI2c, V>) -> usize {
        reader.bus().map_or(0, |bus| bus.transactions.len())
    }

    #[test]
    fn test_reads_and_decodes_channel() {
        let mut bus = MockI2c::new();
        bus.registers.set(0x43, 8, [0x00, 0x00, 0xB4, 0x41]);
        let mut reader: SensorChannelReader<MockI2c> = SensorChannelReader::new(ReaderConfig::new());
        reader.attach(bus).unwrap();

        let result = reader.read_channel(&ReadRequest::new(3, 3)).unwrap();
        assert_eq!(result.reading.as_str(), "22.5000");
        assert_eq!(result.address.device_address(), 0x43);
        assert_eq!(result.payload, None);
        assert_eq!(
            reader.bus().unwrap().transactions,
            [BlockRead { address: 0x43, register: 8, len: 4 }]
        );
    }

    #[test]
    fn test_out_of_range_request_is_clamped() {
        let mut reader = open_reader();
        reader.read_channel(&ReadRequest::new(99, -5)).unwrap();
        reader.read_channel(&ReadRequest::new(-3, 20)).unwrap();
        assert_eq!(
            reader.bus().unwrap().transactions,
            [
                BlockRead { address: 0x47, register: 0, len: 4 },
                BlockRead { address: 0x40, register: 28, len: 4 },
            ]
        );
    }

    #[test]
    fn test_invalid_input_does_no_io() {
        let mut reader = open_reader();

        let err = reader.read_channel(&ReadRequest::new("abc", 1)).unwrap_err();
        assert!(matches!(err, RtdError::Validation(ValidationError::InvalidStack(_))));
        assert!(matches!(
            reader.last_validation_error(),
            Some(ValidationError::InvalidStack(_))
        ));

        let err = reader
            .read_channel(&ReadRequest::new(0, InputValue::Absent))
            .unwrap_err();
        assert!(matches!(err, RtdError::Validation(ValidationError::InvalidChannel(_))));

        let err = reader
            .read_channel(&ReadRequest::new(InputValue::Float(f64::NAN), 1))
            .unwrap_err();
        assert!(matches!(err, RtdError::Validation(ValidationError::InvalidStack(_))));

        assert_eq!(transaction_count(&reader), 0);

        // A good request clears the diagnostic
        reader.read_channel(&ReadRequest::new(0, 1)).unwrap();
        assert!(reader.last_validation_error().is_none());
    }

    #[test]
    fn test_transaction_failure_does_not_poison_bus() {
        let mut reader = open_reader();
        let mut bus = reader.shutdown().unwrap();
        bus.fail_next = 1;
        bus.registers.set_value(0x41, 4, -3.5);

        let mut reader: SensorChannelReader<MockI2c> = SensorChannelReader::new(ReaderConfig::new());
        reader.attach(bus).unwrap();

        let err = reader.read_channel(&ReadRequest::new(1, 2)).unwrap_err();
        match err {
            RtdError::Transaction { address, cause } => {
                assert_eq!((address.stack(), address.channel()), (1, 2));
                assert_eq!(cause, MockI2cError::Nack);
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(reader.state(), ReaderState::Open);

        let ok = reader.read_channel(&ReadRequest::new(1, 2)).unwrap();
        assert_eq!(ok.reading.as_str(), "-3.5000");
        assert_eq!(transaction_count(&reader), 2);
    }

    #[test]
    fn test_read_after_shutdown_fails_without_io() {
        let mut reader = open_reader();
        reader.read_channel(&ReadRequest::new(0, 1)).unwrap();

        let bus = reader.shutdown().unwrap();
        assert_eq!(bus.transactions.len(), 1);
        assert_eq!(reader.state(), ReaderState::Closed);
        assert!(reader.shutdown().is_none());

        let err = reader.read_channel(&ReadRequest::new(0, 1)).unwrap_err();
        assert!(matches!(err, RtdError::BusClosed));
        assert_eq!(bus.transactions.len(), 1);

        assert!(matches!(reader.initialize(MOCK_BUS_NUMBER), Err(RtdError::BusClosed)));
    }

    #[test]
    fn test_lifecycle_errors() {
        let mut reader: SensorChannelReader<MockI2c> = SensorChannelReader::new(ReaderConfig::new());
        assert_eq!(reader.state(), ReaderState::Uninitialized);
        assert!(matches!(
            reader.read_channel(&ReadRequest::new(0, 1)),
            Err(RtdError::BusNotOpen)
        ));

        assert!(matches!(
            reader.initialize(5),
            Err(RtdError::BusOpen(MockI2cError::NoDevice))
        ));
        assert_eq!(reader.state(), ReaderState::Uninitialized);

        reader.initialize(MOCK_BUS_NUMBER).unwrap();
        assert!(matches!(
            reader.initialize(MOCK_BUS_NUMBER),
            Err(RtdError::AlreadyInitialized)
        ));
    }

    #[test]
    fn test_static_and_evaluated_payloads() {
        let config = ReaderConfig::new().with_payload(PayloadMode::Static("tank-3"));
        let mut reader: SensorChannelReader<MockI2c, &str> =
            SensorChannelReader::open(MOCK_BUS_NUMBER, config).unwrap();
        let result = reader.read_channel(&ReadRequest::new(0, 1)).unwrap();
        assert_eq!(result.payload, Some("tank-3"));

        fn reject(_: &ReadRequest<'_>) -> Result<u32, PayloadError> {
            Err(PayloadError::new("bad expression"))
        }
        let config = ReaderConfig::new().with_payload(PayloadMode::FromRequest(reject as PayloadFn<u32>));
        let mut reader: SensorChannelReader<MockI2c, u32> =
            SensorChannelReader::open(MOCK_BUS_NUMBER, config).unwrap();
        let err = reader.read_channel(&ReadRequest::new(0, 1)).unwrap_err();
        assert!(matches!(err, RtdError::Validation(ValidationError::Payload(_))));
        assert_eq!(transaction_count(&reader), 0);
    }

    #[test]
    fn test_strict_mode_and_resistance_block() {
        let config = ReaderConfig::new()
            .with_range_policy(RangePolicy::Reject)
            .with_quantity(Quantity::Resistance);
        let mut reader: SensorChannelReader<MockI2c> =
            SensorChannelReader::open(MOCK_BUS_NUMBER, config).unwrap();

        let err = reader.read_channel(&ReadRequest::new(9, 1)).unwrap_err();
        assert!(matches!(err, RtdError::Validation(ValidationError::StackOutOfRange(9))));
        assert_eq!(transaction_count(&reader), 0);

        reader.read_channel(&ReadRequest::new(2, 8)).unwrap();
        assert_eq!(
            reader.bus().unwrap().transactions,
            [BlockRead { address: 0x42, register: 87, len: 4 }]
        );
    }

    #[test]
    fn test_invalid_request_reported_after_shutdown() {
        let mut reader = open_reader();
        let bus = reader.shutdown().unwrap();

        let err = reader.read_channel(&ReadRequest::new("abc", 1)).unwrap_err();
        assert!(matches!(err, RtdError::Validation(ValidationError::InvalidStack(_))));
        assert!(matches!(reader.read_channel(&ReadRequest::new(0, 1)), Err(RtdError::BusClosed)));
        assert!(bus.transactions.is_empty());
    }

    #[test]
    fn test_reads_firmware_version() {
        let mut bus = MockI2c::new();
        bus.registers.set(0x42, 57, [3, 7, 0xFF, 0xFF]);
        let mut reader: SensorChannelReader<MockI2c> = SensorChannelReader::new(ReaderConfig::new());
        reader.attach(bus).unwrap();

        let version = reader.read_firmware_version(2).unwrap();
        assert_eq!(version, FirmwareVersion { major: 3, minor: 7 });
        assert_eq!(
            reader.bus().unwrap().transactions,
            [BlockRead { address: 0x42, register: 57, len: 2 }]
        );
    }

    #[test]
    fn test_firmware_version_errors() {
        let mut reader = open_reader();
        let err = reader.read_firmware_version("none").unwrap_err();
        assert!(matches!(err, RtdError::Validation(ValidationError::InvalidStack(_))));
        assert_eq!(transaction_count(&reader), 0);

        let mut bus = reader.shutdown().unwrap();
        bus.fail_next = 1;
        let mut reader: SensorChannelReader<MockI2c> =
            SensorChannelReader::new(ReaderConfig::new().with_stack(4));
        reader.attach(bus).unwrap();
        let err = reader.read_firmware_version(InputValue::Absent).unwrap_err();
        assert!(matches!(
            err,
            RtdError::BoardTransaction { stack: 4, cause: MockI2cError::Nack }
        ));
        assert_eq!(reader.state(), ReaderState::Open);
    }

    #[test]
    fn test_configured_channel_overrides_request() {
        let config = ReaderConfig::new().with_stack(5).with_channel(6);
        let mut reader: SensorChannelReader<MockI2c> =
            SensorChannelReader::open(MOCK_BUS_NUMBER, config).unwrap();
        reader
            .read_channel(&ReadRequest::new(InputValue::Absent, InputValue::Absent))
            .unwrap();
        assert_eq!(
            reader.bus().unwrap().transactions,
            [BlockRead { address: 0x45, register: 20, len: 4 }]
        );
    }
}
