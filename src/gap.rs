//! ## Generic Access Profile
//!
//! Parameters and payloads the driver hands to the transport to become discoverable and to
//! shape the links it accepts: advertising parameters, the advertising payload announcing the
//! Nordic UART Service, the preferred connection parameters requested after link-up, and the
//! device name served from the GAP device name characteristic.

use core::fmt::Write as _;

use bt_hci::param::BdAddr;
use embassy_time::Duration;
use heapless::String;

use crate::ad_structure::{AdStructure, BR_EDR_NOT_SUPPORTED, LEGACY_ADV_DATA_MAX, LE_GENERAL_DISCOVERABLE};
use crate::types::uuid::NUS_SERVICE;
use crate::Error;

/// Longest device name produced by [`device_name`].
pub const DEVICE_NAME_MAX: usize = 32;

/// All three primary advertising channels.
pub const ADV_CHANNEL_MAP_ALL: u8 = 0x07;

#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AdvertisementParameters {
    /// Advertising interval
    pub interval_min: Duration,
    pub interval_max: Duration,

    pub channel_map: u8,
}

impl Default for AdvertisementParameters {
    fn default() -> Self {
        Self {
            interval_min: Duration::from_millis(500),
            interval_max: Duration::from_millis(500),
            channel_map: ADV_CHANNEL_MAP_ALL,
        }
    }
}

impl AdvertisementParameters {
    /// Interval bounds in the 0.625 ms units used on the wire.
    pub fn interval_units(&self) -> (u16, u16) {
        (to_units(self.interval_min, 625), to_units(self.interval_max, 625))
    }
}

/// Connection parameters requested from the central once a link is up.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ConnectionParameters {
    pub min_interval: Duration,
    pub max_interval: Duration,
    pub latency: u16,
    pub supervision_timeout: Duration,
}

impl Default for ConnectionParameters {
    /// 15 ms, the shortest interval iOS accepts.
    fn default() -> Self {
        Self {
            min_interval: Duration::from_micros(15_000),
            max_interval: Duration::from_micros(15_000),
            latency: 4,
            supervision_timeout: Duration::from_millis(720),
        }
    }
}

impl ConnectionParameters {
    /// Interval bounds in 1.25 ms units.
    pub fn interval_units(&self) -> (u16, u16) {
        (to_units(self.min_interval, 1250), to_units(self.max_interval, 1250))
    }

    /// Supervision timeout in 10 ms units.
    pub fn supervision_timeout_units(&self) -> u16 {
        to_units(self.supervision_timeout, 10_000)
    }
}

fn to_units(duration: Duration, unit_us: u64) -> u16 {
    (duration.as_micros() / unit_us).min(u16::MAX as u64) as u16
}

/// Format a connection interval given in 1.25 ms units as `(millis, hundredths)`.
pub(crate) fn interval_millis(interval: u16) -> (u32, u32) {
    let interval = interval as u32;
    (interval * 125 / 100, 25 * (interval & 3))
}

/// Encode the advertising payload: flags, shortened local name and the Nordic UART Service UUID.
pub fn advertising_data(name: &str, dest: &mut [u8; LEGACY_ADV_DATA_MAX]) -> Result<usize, Error> {
    AdStructure::encode_slice(
        &[
            AdStructure::Flags(LE_GENERAL_DISCOVERABLE | BR_EDR_NOT_SUPPORTED),
            AdStructure::ShortenedLocalName(name.as_bytes()),
            AdStructure::ServiceUuids128(&[NUS_SERVICE]),
        ],
        &mut dest[..],
    )
}

/// Device name followed by the local address, e.g. `Pico 28:CD:C1:0A:4B:2F`.
///
/// `addr` is in the little-endian order used by HCI; it is printed most significant byte first.
pub fn device_name(name: &str, addr: &BdAddr) -> Result<String<DEVICE_NAME_MAX>, Error> {
    let mut out = String::new();
    out.push_str(name).map_err(|_| Error::InsufficientSpace)?;
    out.push(' ').map_err(|_| Error::InsufficientSpace)?;
    for (i, b) in addr.raw().iter().rev().enumerate() {
        if i > 0 {
            out.push(':').map_err(|_| Error::InsufficientSpace)?;
        }
        write!(out, "{:02X}", b).map_err(|_| Error::InsufficientSpace)?;
    }
    Ok(out)
}

/// Serve a long attribute read: copy `value` starting at `offset` into `dest`.
///
/// Returns the number of bytes copied, zero once `offset` is past the end of the value.
pub fn read_blob(value: &[u8], offset: usize, dest: &mut [u8]) -> usize {
    let Some(rest) = value.get(offset..) else {
        return 0;
    };
    let len = rest.len().min(dest.len());
    dest[..len].copy_from_slice(&rest[..len]);
    len
}
