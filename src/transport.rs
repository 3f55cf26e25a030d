//! Interface to the BLE stack carrying the output.
pub use embedded_io::ErrorKind;

use bt_hci::param::ConnHandle;

use crate::gap::{AdvertisementParameters, ConnectionParameters};

/// Error raised by a [`Transport`].
///
/// This trait allows generic code to do limited inspecting of errors,
/// to react differently to different kinds.
pub trait Error: core::fmt::Debug {
    /// Get the kind of this error.
    fn kind(&self) -> ErrorKind;
}

impl Error for core::convert::Infallible {
    fn kind(&self) -> ErrorKind {
        match *self {}
    }
}

impl Error for ErrorKind {
    fn kind(&self) -> ErrorKind {
        *self
    }
}

/// The narrow surface of the BLE stack the driver depends on.
///
/// Lifecycle events and send-capacity grants travel the other way: the stack reports them
/// through [`StdioBle::dispatch`](crate::StdioBle::dispatch) and
/// [`StdioBle::on_send_capacity`](crate::StdioBle::on_send_capacity), directly or through a
/// [`Runner`](crate::runner::Runner).
///
/// Implementations must not call back into the driver from within these methods.
pub trait Transport {
    type Error: Error;

    /// Arm a one-shot notification telling the driver it may send one payload on `handle`.
    ///
    /// The grant is delivered later, exactly once, when the link has room for a notification.
    fn request_send_capacity(&self, handle: ConnHandle) -> Result<(), Self::Error>;

    /// Notify `data` on the output characteristic of `handle`.
    ///
    /// Only called after a grant for `handle` was delivered.
    fn send_now(&self, handle: ConnHandle, data: &[u8]) -> Result<(), Self::Error>;

    /// Start connectable undirected advertising with the given legacy payload.
    fn start_advertising(&self, params: &AdvertisementParameters, adv_data: &[u8]) -> Result<(), Self::Error>;

    /// Ask the central to move `handle` to the given connection parameters.
    fn request_connection_update(
        &self,
        handle: ConnHandle,
        params: &ConnectionParameters,
    ) -> Result<(), Self::Error>;
}

impl<T: Transport> Transport for &T {
    type Error = T::Error;

    fn request_send_capacity(&self, handle: ConnHandle) -> Result<(), Self::Error> {
        T::request_send_capacity(self, handle)
    }

    fn send_now(&self, handle: ConnHandle, data: &[u8]) -> Result<(), Self::Error> {
        T::send_now(self, handle, data)
    }

    fn start_advertising(&self, params: &AdvertisementParameters, adv_data: &[u8]) -> Result<(), Self::Error> {
        T::start_advertising(self, params, adv_data)
    }

    fn request_connection_update(
        &self,
        handle: ConnHandle,
        params: &ConnectionParameters,
    ) -> Result<(), Self::Error> {
        T::request_connection_update(self, handle, params)
    }
}
