use std::cell::RefCell;

use bt_hci::param::ConnHandle;
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use tokio::time::{sleep, timeout, Duration};
use trouble_stdio::gap::{AdvertisementParameters, ConnectionParameters};
use trouble_stdio::transport::ErrorKind;
use trouble_stdio::{InputChannel, StdioBle, Transport, TransportInput};

pub type Inputs = InputChannel<NoopRawMutex>;
pub type Stdio = StdioBle<NoopRawMutex, ChannelTransport>;

/// Stack glue granting send capacity right away through the runner's input queue.
pub struct ChannelTransport {
    inputs: &'static Inputs,
    pub sent: RefCell<Vec<(u16, Vec<u8>)>>,
    pub adv_data: RefCell<Vec<u8>>,
    pub updates: RefCell<Vec<(u16, ConnectionParameters)>>,
}

impl ChannelTransport {
    pub fn new(inputs: &'static Inputs) -> Self {
        Self {
            inputs,
            sent: RefCell::new(Vec::new()),
            adv_data: RefCell::new(Vec::new()),
            updates: RefCell::new(Vec::new()),
        }
    }

    pub fn sent_text(&self) -> Vec<(u16, String)> {
        self.sent
            .borrow()
            .iter()
            .map(|(handle, data)| (*handle, String::from_utf8_lossy(data).into_owned()))
            .collect()
    }

    /// Wait until `count` notifications went out.
    pub async fn wait_sent(&self, count: usize) {
        timeout(Duration::from_secs(2), async {
            while self.sent.borrow().len() < count {
                sleep(Duration::from_millis(1)).await;
            }
        })
        .await
        .unwrap();
    }
}

impl Transport for ChannelTransport {
    type Error = ErrorKind;

    fn request_send_capacity(&self, handle: ConnHandle) -> Result<(), Self::Error> {
        self.inputs
            .try_send(TransportInput::SendCapacity(handle))
            .map_err(|_| ErrorKind::OutOfMemory)
    }

    fn send_now(&self, handle: ConnHandle, data: &[u8]) -> Result<(), Self::Error> {
        self.sent.borrow_mut().push((handle.raw(), data.to_vec()));
        Ok(())
    }

    fn start_advertising(&self, _params: &AdvertisementParameters, adv_data: &[u8]) -> Result<(), Self::Error> {
        *self.adv_data.borrow_mut() = adv_data.to_vec();
        Ok(())
    }

    fn request_connection_update(
        &self,
        handle: ConnHandle,
        params: &ConnectionParameters,
    ) -> Result<(), Self::Error> {
        self.updates.borrow_mut().push((handle.raw(), *params));
        Ok(())
    }
}
