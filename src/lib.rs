//! Character output redirected to BLE peers as Nordic UART Service notifications.
#![no_std]

mod fmt;

pub mod config;
mod cursor;
pub mod types;

pub mod ad_structure;
pub mod connection;
pub mod connection_table;
pub mod driver;
pub mod event;
pub mod gap;
pub mod runner;
pub mod scheduler;
pub mod stdio;
pub mod transport;

#[cfg(test)]
mod mock_transport;

pub use connection::{Connection, Identity};
pub use connection_table::ConnectionTable;
pub use driver::{StdioDriver, StdioWriter};
pub use event::{EventOutcome, SendOutcome, TransportEvent, TransportInput};
pub use runner::{InputChannel, Runner};
pub use stdio::{StdioBle, StdioConfig};
pub use transport::Transport;

/// Errors raised by the driver itself.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Every slot of the connection table is occupied.
    ConnectionLimitReached,
    /// No slot holds the given link.
    NotFound,
    /// A write larger than the connection accepts in one notification.
    PayloadTooLarge { len: usize, capacity: usize },
    /// An encoding ran out of room in its destination buffer.
    InsufficientSpace,
    InvalidValue,
}

/// Errors of a driver operation, either raised by the driver or passed through from the
/// [`Transport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StdioError<E> {
    Transport(E),
    Stdio(Error),
}

impl<E> From<Error> for StdioError<E> {
    fn from(error: Error) -> Self {
        Self::Stdio(error)
    }
}

impl<E: transport::Error> embedded_io::Error for StdioError<E> {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self {
            Self::Transport(e) => e.kind(),
            Self::Stdio(Error::PayloadTooLarge { .. }) => embedded_io::ErrorKind::InvalidInput,
            Self::Stdio(Error::InsufficientSpace) => embedded_io::ErrorKind::OutOfMemory,
            Self::Stdio(Error::InvalidValue) => embedded_io::ErrorKind::InvalidData,
            Self::Stdio(Error::NotFound) => embedded_io::ErrorKind::NotConnected,
            Self::Stdio(Error::ConnectionLimitReached) => embedded_io::ErrorKind::Other,
        }
    }
}

#[cfg(feature = "defmt")]
impl<E> defmt::Format for StdioError<E>
where
    E: transport::Error,
{
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            StdioError::Transport(e) => {
                defmt::write!(fmt, "Transport({})", e.kind())
            }
            StdioError::Stdio(e) => {
                defmt::write!(fmt, "Stdio({})", e)
            }
        }
    }
}

pub mod prelude {
    pub use bt_hci::param::{BdAddr, ConnHandle};

    pub use crate::gap::{AdvertisementParameters, ConnectionParameters};
    pub use crate::types::uuid::{Uuid, NUS_RX, NUS_SERVICE, NUS_TX};
    pub use crate::{
        Error, EventOutcome, SendOutcome, StdioBle, StdioConfig, StdioDriver, StdioError, StdioWriter, Transport,
        TransportEvent, TransportInput,
    };
}
