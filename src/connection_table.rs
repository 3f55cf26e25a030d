//! Fixed-capacity table mapping transport link handles to connection slots.
use bt_hci::param::ConnHandle;

use crate::connection::{Connection, Identity, IDENTITIES_MAX};
use crate::Error;

/// `N` connection slots, created once and reused for the lifetime of the table.
///
/// At most one slot holds a given link handle at any time.
pub struct ConnectionTable<const N: usize> {
    slots: [Connection; N],
}

impl<const N: usize> Default for ConnectionTable<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> ConnectionTable<N> {
    const LABELS_FIT: () = assert!(N <= IDENTITIES_MAX, "a connection table holds at most 26 slots");

    pub fn new() -> Self {
        let () = Self::LABELS_FIT;
        Self {
            slots: core::array::from_fn(|idx| Connection::new(Identity::new(idx))),
        }
    }

    /// Number of slots.
    pub const fn len(&self) -> usize {
        N
    }

    pub const fn is_empty(&self) -> bool {
        N == 0
    }

    /// Linear scan for the slot holding `handle`.
    ///
    /// Searching for `None` returns the first unoccupied slot.
    pub fn find_by_handle(&self, handle: Option<ConnHandle>) -> Option<usize> {
        self.slots.iter().position(|slot| slot.handle == handle)
    }

    /// Assign `handle` to the first free slot.
    ///
    /// A handle that is already present keeps its slot. When every slot is occupied the link
    /// is rejected with [`Error::ConnectionLimitReached`].
    pub fn claim(&mut self, handle: ConnHandle) -> Result<usize, Error> {
        if let Some(idx) = self.find_by_handle(Some(handle)) {
            trace!("[table][claim] connection handle {:?} already in slot {}", handle, idx);
            return Ok(idx);
        }
        match self.find_by_handle(None) {
            Some(idx) => {
                self.slots[idx].claim(handle);
                Ok(idx)
            }
            None => {
                trace!("[table][claim] no available slot found for handle {:?}", handle);
                Err(Error::ConnectionLimitReached)
            }
        }
    }

    /// Mark the slot holding `handle` as subscribed.
    pub fn enable_notifications(&mut self, handle: ConnHandle) -> Result<usize, Error> {
        let idx = self.lookup(handle)?;
        self.slots[idx].notifications_enabled = true;
        Ok(idx)
    }

    /// Mark the slot holding `handle` as unsubscribed. The link stays in its slot; data staged
    /// for it is no longer pending.
    pub fn disable_notifications(&mut self, handle: ConnHandle) -> Result<usize, Error> {
        let idx = self.lookup(handle)?;
        let slot = &mut self.slots[idx];
        slot.notifications_enabled = false;
        slot.pending_send = false;
        Ok(idx)
    }

    /// Record the negotiated ATT MTU of the link.
    pub fn set_att_mtu(&mut self, handle: ConnHandle, mtu: u16) -> Result<usize, Error> {
        let idx = self.lookup(handle)?;
        self.slots[idx].att_mtu = mtu;
        Ok(idx)
    }

    /// Release the slot holding `handle`.
    pub fn release(&mut self, handle: ConnHandle) -> Result<usize, Error> {
        let idx = self.lookup(handle)?;
        self.reset(Identity::new(idx));
        Ok(idx)
    }

    /// Clear the link of one slot. The staged buffer is left untouched.
    pub fn reset(&mut self, identity: Identity) {
        if let Some(slot) = self.slots.get_mut(identity.index()) {
            slot.reset();
        }
    }

    pub fn get(&self, idx: usize) -> Option<&Connection> {
        self.slots.get(idx)
    }

    pub(crate) fn get_mut(&mut self, idx: usize) -> Option<&mut Connection> {
        self.slots.get_mut(idx)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Connection> {
        self.slots.iter()
    }

    /// Number of slots holding a link.
    pub fn occupied(&self) -> usize {
        self.slots.iter().filter(|slot| slot.handle.is_some()).count()
    }

    pub(crate) fn log_status(&self) {
        for slot in self.slots.iter() {
            if slot.handle.is_some() {
                debug!("[table][slot = {}] {:?}", slot.identity().label(), slot);
            }
        }
    }

    fn lookup(&self, handle: ConnHandle) -> Result<usize, Error> {
        self.find_by_handle(Some(handle)).ok_or_else(|| {
            trace!("[table] connection handle {:?} not found", handle);
            Error::NotFound
        })
    }
}
