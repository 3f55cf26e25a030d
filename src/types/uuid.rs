//! UUID types.

/// A 16-bit or 128-bit UUID, stored little-endian as sent over the air.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Uuid {
    /// 16-bit UUID
    Uuid16([u8; 2]),
    /// 128-bit UUID
    Uuid128([u8; 16]),
}

impl From<u16> for Uuid {
    fn from(data: u16) -> Self {
        Uuid::Uuid16(data.to_le_bytes())
    }
}

impl From<u128> for Uuid {
    fn from(data: u128) -> Self {
        Uuid::Uuid128(data.to_le_bytes())
    }
}

impl Uuid {
    /// Create a new 16-bit UUID.
    pub const fn new_short(val: u16) -> Self {
        Self::Uuid16(val.to_le_bytes())
    }

    /// Create a new 128-bit UUID from its little-endian bytes.
    pub const fn new_long(val: [u8; 16]) -> Self {
        Self::Uuid128(val)
    }

    /// The raw little-endian bytes of the UUID.
    pub fn as_raw(&self) -> &[u8] {
        match self {
            Uuid::Uuid16(uuid) => uuid,
            Uuid::Uuid128(uuid) => uuid,
        }
    }
}

/// Nordic UART Service.
pub const NUS_SERVICE: Uuid = Uuid::new_long(0x6e400001_b5a3_f393_e0a9_e50e24dcca9e_u128.to_le_bytes());
/// Nordic UART Service RX characteristic.
///
/// The driver never reads it; the stack glue registers it so centrals find the complete
/// service.
pub const NUS_RX: Uuid = Uuid::new_long(0x6e400002_b5a3_f393_e0a9_e50e24dcca9e_u128.to_le_bytes());
/// Nordic UART Service TX characteristic, carrying our output as notifications.
///
/// The stack glue registers it with a client characteristic configuration descriptor; writes
/// to that descriptor become [`SubscriptionEnabled`](crate::TransportEvent::SubscriptionEnabled)
/// and [`SubscriptionDisabled`](crate::TransportEvent::SubscriptionDisabled).
pub const NUS_TX: Uuid = Uuid::new_long(0x6e400003_b5a3_f393_e0a9_e50e24dcca9e_u128.to_le_bytes());

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nus_service_wire_order() {
        assert_eq!(
            NUS_SERVICE.as_raw(),
            &[0x9e, 0xca, 0xdc, 0x24, 0x0e, 0xe5, 0xa9, 0xe0, 0x93, 0xf3, 0xa3, 0xb5, 0x01, 0x00, 0x40, 0x6e]
        );
    }

    #[test]
    fn nus_characteristics_follow_service_base() {
        for (uuid, short) in [(NUS_SERVICE, 1), (NUS_RX, 2), (NUS_TX, 3)] {
            assert_eq!(&uuid.as_raw()[..12], &NUS_SERVICE.as_raw()[..12]);
            assert_eq!(uuid.as_raw()[12], short);
        }
    }

    #[test]
    fn short_uuid_little_endian() {
        assert_eq!(Uuid::from(0x2a00u16).as_raw(), &[0x00, 0x2a]);
    }
}
