use core::cell::{Cell, RefCell};

use bt_hci::param::ConnHandle;
use heapless::Vec;

use crate::config::PAYLOAD_MAX;
use crate::gap::{AdvertisementParameters, ConnectionParameters};
use crate::transport::{ErrorKind, Transport};

const LOG_DEPTH: usize = 16;

/// Records every request the driver makes instead of talking to a BLE stack.
pub struct MockTransport {
    pub requests: RefCell<Vec<ConnHandle, LOG_DEPTH>>,
    pub sent: RefCell<Vec<(ConnHandle, Vec<u8, PAYLOAD_MAX>), LOG_DEPTH>>,
    pub adv_data: RefCell<Vec<u8, 31>>,
    pub updates: RefCell<Vec<(ConnHandle, ConnectionParameters), LOG_DEPTH>>,
    pub fail_sends: Cell<bool>,
    pub fail_requests: Cell<bool>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            requests: RefCell::new(Vec::new()),
            sent: RefCell::new(Vec::new()),
            adv_data: RefCell::new(Vec::new()),
            updates: RefCell::new(Vec::new()),
            fail_sends: Cell::new(false),
            fail_requests: Cell::new(false),
        }
    }

    /// Handles in the order notifications went out.
    pub fn sent_handles(&self) -> Vec<u16, LOG_DEPTH> {
        self.sent.borrow().iter().map(|(handle, _)| handle.raw()).collect()
    }

    pub fn last_request(&self) -> Option<ConnHandle> {
        self.requests.borrow().last().copied()
    }
}

impl Transport for MockTransport {
    type Error = ErrorKind;

    fn request_send_capacity(&self, handle: ConnHandle) -> Result<(), Self::Error> {
        if self.fail_requests.get() {
            return Err(ErrorKind::OutOfMemory);
        }
        self.requests.borrow_mut().push(handle).map_err(|_| ErrorKind::OutOfMemory)
    }

    fn send_now(&self, handle: ConnHandle, data: &[u8]) -> Result<(), Self::Error> {
        if self.fail_sends.get() {
            return Err(ErrorKind::NotConnected);
        }
        let payload = Vec::from_slice(data).map_err(|_| ErrorKind::InvalidInput)?;
        self.sent
            .borrow_mut()
            .push((handle, payload))
            .map_err(|_| ErrorKind::OutOfMemory)
    }

    fn start_advertising(&self, _params: &AdvertisementParameters, adv_data: &[u8]) -> Result<(), Self::Error> {
        *self.adv_data.borrow_mut() = Vec::from_slice(adv_data).map_err(|_| ErrorKind::InvalidInput)?;
        Ok(())
    }

    fn request_connection_update(
        &self,
        handle: ConnHandle,
        params: &ConnectionParameters,
    ) -> Result<(), Self::Error> {
        self.updates
            .borrow_mut()
            .push((handle, *params))
            .map_err(|_| ErrorKind::OutOfMemory)
    }
}
