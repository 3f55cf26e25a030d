//! Output multiplexer: stages writes per connection and feeds them to the transport, one
//! payload in flight at a time, rotating fairly among subscribed peers.
use core::cell::RefCell;

use bt_hci::param::ConnHandle;
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;

use crate::ad_structure::LEGACY_ADV_DATA_MAX;
use crate::config::CONNECTIONS_MAX;
use crate::connection_table::ConnectionTable;
use crate::event::{EventOutcome, SendOutcome, TransportEvent};
use crate::gap::{self, AdvertisementParameters, ConnectionParameters};
use crate::scheduler::Scheduler;
use crate::transport::Transport;
use crate::{Error, StdioError};

/// Runtime parameters of the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StdioConfig {
    /// Advertised as the shortened local name and prefixed to the GAP device name.
    pub name: &'static str,
    pub advertisement: AdvertisementParameters,
    /// Requested once a link is up.
    pub connection: ConnectionParameters,
}

impl Default for StdioConfig {
    fn default() -> Self {
        Self {
            name: "Pico",
            advertisement: AdvertisementParameters::default(),
            connection: ConnectionParameters::default(),
        }
    }
}

struct State<const N: usize> {
    table: ConnectionTable<N>,
    scheduler: Scheduler,
    /// Slot of the most recently connected link, target of [`StdioBle::write`].
    current: Option<usize>,
    /// Link of the one capacity request in flight.
    armed: Option<ConnHandle>,
}

/// Character output over BLE notifications to up to `N` peers.
///
/// All methods take `&self` and return promptly; nothing blocks waiting for the transport.
/// Writes only stage data and arm a send request, the payload goes out when the transport
/// later reports capacity through [`StdioBle::on_send_capacity`].
pub struct StdioBle<M: RawMutex, T: Transport, const N: usize = CONNECTIONS_MAX> {
    transport: T,
    config: StdioConfig,
    state: Mutex<M, RefCell<State<N>>>,
}

impl<M: RawMutex, T: Transport, const N: usize> StdioBle<M, T, N> {
    pub fn new(transport: T, config: StdioConfig) -> Self {
        Self {
            transport,
            config,
            state: Mutex::new(RefCell::new(State {
                table: ConnectionTable::new(),
                scheduler: Scheduler::new(),
                current: None,
                armed: None,
            })),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn config(&self) -> &StdioConfig {
        &self.config
    }

    /// Inspect the connection table.
    pub fn with_table<R>(&self, f: impl FnOnce(&ConnectionTable<N>) -> R) -> R {
        self.with_state(|state| f(&state.table))
    }

    /// Link targeted by [`StdioBle::write`].
    pub fn current(&self) -> Option<ConnHandle> {
        self.with_state(|state| state.current.and_then(|idx| state.table.get(idx)).and_then(|slot| slot.handle()))
    }

    /// Largest payload [`StdioBle::write`] currently accepts, zero without a link.
    pub fn capacity(&self) -> usize {
        self.with_state(|state| {
            state
                .current
                .and_then(|idx| state.table.get(idx))
                .filter(|slot| slot.handle().is_some())
                .map(|slot| slot.capacity())
                .unwrap_or(0)
        })
    }

    /// Link of the capacity request in flight, if any.
    pub fn armed(&self) -> Option<ConnHandle> {
        self.with_state(|state| state.armed)
    }

    /// Apply one lifecycle event to the connection table.
    pub fn dispatch(&self, event: TransportEvent) -> Result<EventOutcome, StdioError<T::Error>> {
        match event {
            TransportEvent::PowerOnReady => {
                self.start_advertising()?;
                Ok(EventOutcome::Applied)
            }
            TransportEvent::LinkUp {
                handle,
                interval,
                latency,
            } => self.link_up(handle, interval, latency),
            TransportEvent::SubscriptionEnabled(handle) | TransportEvent::ServiceConnected(handle) => {
                self.with_state(|state| self.subscribe(state, handle))
            }
            TransportEvent::SubscriptionDisabled(handle) | TransportEvent::ServiceDisconnected(handle) => {
                self.with_state(|state| self.unsubscribe(state, handle))
            }
            TransportEvent::LinkDown(handle) => self.with_state(|state| self.release(state, handle)),
            TransportEvent::ConnectionParametersUpdated {
                handle,
                interval,
                latency,
            } => {
                let known = self.with_state(|state| state.table.find_by_handle(Some(handle)).is_some());
                if !known {
                    return Ok(EventOutcome::Ignored);
                }
                let (ms, frac) = gap::interval_millis(interval);
                info!(
                    "[stdio] connection {:?} parameters updated: interval {}.{:02} ms, latency {}",
                    handle,
                    ms,
                    frac,
                    latency
                );
                Ok(EventOutcome::Applied)
            }
            TransportEvent::MtuExchanged { handle, mtu } => self.with_state(|state| {
                match state.table.set_att_mtu(handle, mtu) {
                    Ok(_) => {
                        debug!("[stdio] connection {:?} att mtu = {}", handle, mtu);
                        Ok(EventOutcome::Applied)
                    }
                    Err(_) => Ok(EventOutcome::Ignored),
                }
            }),
        }
    }

    /// Handle a send-capacity grant: transmit the staged payload of the connection under the
    /// scheduler cursor, move the cursor on, and arm the next waiting peer.
    pub fn on_send_capacity(&self, granted: ConnHandle) -> Result<SendOutcome, StdioError<T::Error>> {
        self.with_state(|state| self.send_staged(state, granted))
    }

    /// Stage `data` for the most recently connected link.
    ///
    /// Returns immediately with the number of bytes staged, zero when no peer is connected. A
    /// payload staged earlier and not yet transmitted is replaced. Data larger than the
    /// connection's capacity is rejected with [`Error::PayloadTooLarge`].
    ///
    /// [`StdioError::Transport`] means the data was staged but the send request could not be
    /// armed. The payload stays pending and is requested again on the next write or
    /// subscription.
    pub fn write(&self, data: &[u8]) -> Result<usize, StdioError<T::Error>> {
        self.with_state(|state| match state.current {
            Some(idx) => self.stage(state, idx, data),
            None => Ok(0),
        })
    }

    /// Stage `data` for the link `handle`, with the same contract as [`StdioBle::write`].
    pub fn write_to(&self, handle: ConnHandle, data: &[u8]) -> Result<usize, StdioError<T::Error>> {
        self.with_state(|state| match state.table.find_by_handle(Some(handle)) {
            Some(idx) => self.stage(state, idx, data),
            None => Ok(0),
        })
    }

    /// Inbound data is not supported: there is never anything to read.
    pub fn read(&self, _buf: &mut [u8]) -> usize {
        0
    }

    /// Nothing to flush, the transport owns every buffer beyond the staged payload.
    pub fn flush(&self) {}

    pub(crate) fn log_status(&self) {
        self.with_state(|state| state.table.log_status());
    }

    fn start_advertising(&self) -> Result<(), StdioError<T::Error>> {
        let mut adv_data = [0; LEGACY_ADV_DATA_MAX];
        let len = gap::advertising_data(self.config.name, &mut adv_data)?;
        info!("[gap] advertising as {}", self.config.name);
        self.transport
            .start_advertising(&self.config.advertisement, &adv_data[..len])
            .map_err(StdioError::Transport)
    }

    fn link_up(&self, handle: ConnHandle, interval: u16, latency: u16) -> Result<EventOutcome, StdioError<T::Error>> {
        let claimed = self.with_state(|state| {
            let claimed = state.table.claim(handle);
            if let Ok(idx) = claimed {
                state.current = Some(idx);
            }
            claimed
        });
        match claimed {
            Ok(idx) => {
                let (ms, frac) = gap::interval_millis(interval);
                info!(
                    "[stdio] connection {:?} on slot {}: interval {}.{:02} ms, latency {}",
                    handle,
                    idx,
                    ms,
                    frac,
                    latency
                );
                self.log_status();
                self.transport
                    .request_connection_update(handle, &self.config.connection)
                    .map_err(StdioError::Transport)?;
                Ok(EventOutcome::Applied)
            }
            Err(e) => {
                warn!("[stdio] connection {:?} rejected: {:?}", handle, e);
                Ok(EventOutcome::Rejected)
            }
        }
    }

    fn subscribe(&self, state: &mut State<N>, handle: ConnHandle) -> Result<EventOutcome, StdioError<T::Error>> {
        let Ok(idx) = state.table.enable_notifications(handle) else {
            return Ok(EventOutcome::Ignored);
        };
        info!("[stdio] peer {:?} subscribed on slot {}", handle, idx);
        self.arm_next(state)?;
        Ok(EventOutcome::Applied)
    }

    fn unsubscribe(&self, state: &mut State<N>, handle: ConnHandle) -> Result<EventOutcome, StdioError<T::Error>> {
        let Ok(idx) = state.table.disable_notifications(handle) else {
            return Ok(EventOutcome::Ignored);
        };
        info!("[stdio] peer {:?} unsubscribed on slot {}", handle, idx);
        self.drop_armed(state, handle)?;
        Ok(EventOutcome::Applied)
    }

    fn send_staged(&self, state: &mut State<N>, granted: ConnHandle) -> Result<SendOutcome, StdioError<T::Error>> {
        if state.armed != Some(granted) {
            trace!("[stdio] ignoring stale grant for {:?}", granted);
            return Ok(SendOutcome::Stale);
        }
        state.armed = None;

        // Not reached while the armed link stays eligible: unsubscribe and release drop
        // `armed` before the link leaves the rotation.
        let Some(idx) = state.scheduler.next_eligible(&state.table) else {
            return Ok(SendOutcome::Idle);
        };
        let Some(slot) = state.table.get_mut(idx) else {
            return Ok(SendOutcome::Idle);
        };
        // The link may have changed since the request was armed
        if slot.handle != Some(granted) || !slot.pending_send {
            trace!("[stdio] grant for {:?} does not match slot {}", granted, idx);
            self.arm_next(state)?;
            return Ok(SendOutcome::Stale);
        }

        slot.pending_send = false;
        let len = slot.buffer.len();
        let sent = self.transport.send_now(granted, &slot.buffer);
        state.scheduler.advance(N);

        if let Err(e) = &sent {
            warn!("[stdio] send on {:?} failed: {:?}", granted, crate::transport::Error::kind(e));
        }
        let rearmed = self.arm_next(state);
        sent.map_err(StdioError::Transport)?;
        rearmed?;
        trace!("[stdio] sent {} bytes on slot {}", len, idx);
        Ok(SendOutcome::Sent { index: idx, len })
    }

    fn release(&self, state: &mut State<N>, handle: ConnHandle) -> Result<EventOutcome, StdioError<T::Error>> {
        let Ok(idx) = state.table.release(handle) else {
            return Ok(EventOutcome::Ignored);
        };
        info!("[stdio] connection {:?} on slot {} released", handle, idx);
        if state.current == Some(idx) {
            state.current = None;
        }
        self.drop_armed(state, handle)?;
        Ok(EventOutcome::Applied)
    }

    /// Forget the request armed for `handle`, if any, and let the next waiting peer go ahead.
    fn drop_armed(&self, state: &mut State<N>, handle: ConnHandle) -> Result<(), StdioError<T::Error>> {
        if state.armed == Some(handle) {
            // The grant may never come
            state.armed = None;
            self.arm_next(state)?;
        }
        Ok(())
    }

    fn stage(&self, state: &mut State<N>, idx: usize, data: &[u8]) -> Result<usize, StdioError<T::Error>> {
        let Some(slot) = state.table.get_mut(idx) else {
            return Ok(0);
        };
        if slot.handle.is_none() || data.is_empty() {
            return Ok(0);
        }
        let capacity = slot.capacity();
        if data.len() > capacity {
            warn!("[stdio] write of {} bytes exceeds capacity {}", data.len(), capacity);
            return Err(Error::PayloadTooLarge {
                len: data.len(),
                capacity,
            }
            .into());
        }
        slot.buffer.clear();
        slot.buffer
            .extend_from_slice(data)
            .map_err(|_| Error::InsufficientSpace)?;
        slot.pending_send = true;
        self.arm_next(state)?;
        Ok(data.len())
    }

    /// Arm a capacity request for the next eligible slot with staged data, unless one is
    /// already in flight.
    fn arm_next(&self, state: &mut State<N>) -> Result<(), StdioError<T::Error>> {
        if state.armed.is_some() {
            return Ok(());
        }
        for _ in 0..N {
            let Some(idx) = state.scheduler.next_eligible(&state.table) else {
                return Ok(());
            };
            if let Some(handle) = state
                .table
                .get(idx)
                .filter(|slot| slot.pending_send)
                .and_then(|slot| slot.handle)
            {
                trace!("[stdio] requesting send capacity on slot {} for {:?}", idx, handle);
                state.armed = Some(handle);
                if let Err(e) = self.transport.request_send_capacity(handle) {
                    state.armed = None;
                    return Err(StdioError::Transport(e));
                }
                return Ok(());
            }
            // Eligible but nothing staged
            state.scheduler.advance(N);
        }
        Ok(())
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut State<N>) -> R) -> R {
        self.state.lock(|state| f(&mut state.borrow_mut()))
    }
}
