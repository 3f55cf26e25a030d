//! A single slot of the connection table.
use bt_hci::param::ConnHandle;
use heapless::Vec;

use crate::config::PAYLOAD_MAX;

/// Minimum ATT MTU every link starts out with.
pub const ATT_MTU_DEFAULT: u16 = 23;

/// Size of the ATT header preceding a notification payload.
pub(crate) const ATT_NOTIFY_HEADER: u16 = 3;

/// Number of distinct slot labels, `A` through `Z`.
pub const IDENTITIES_MAX: usize = 26;

/// Logical label of a slot, assigned once when the table is created.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity(usize);

impl Identity {
    pub(crate) const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Index of the slot inside its table.
    pub fn index(&self) -> usize {
        self.0
    }

    /// Letter label of the slot: `A` for the first slot, `B` for the second, and so on.
    ///
    /// Tables never hold more than [`IDENTITIES_MAX`] slots, so every label is unique.
    pub fn label(&self) -> char {
        char::from(b'A' + self.0 as u8)
    }
}

/// State of one potential peer link.
///
/// A slot without a link handle is unoccupied. The staging buffer is left as is when the
/// slot is reset; it is unreachable until the slot is claimed and written again.
#[derive(Debug)]
pub struct Connection {
    identity: Identity,
    pub(crate) handle: Option<ConnHandle>,
    pub(crate) notifications_enabled: bool,
    pub(crate) buffer: Vec<u8, PAYLOAD_MAX>,
    pub(crate) pending_send: bool,
    pub(crate) att_mtu: u16,
}

impl Connection {
    pub(crate) const fn new(identity: Identity) -> Self {
        Self {
            identity,
            handle: None,
            notifications_enabled: false,
            buffer: Vec::new(),
            pending_send: false,
            att_mtu: ATT_MTU_DEFAULT,
        }
    }

    pub fn identity(&self) -> Identity {
        self.identity
    }

    /// Link handle, `None` when the slot is unoccupied.
    pub fn handle(&self) -> Option<ConnHandle> {
        self.handle
    }

    pub fn notifications_enabled(&self) -> bool {
        self.notifications_enabled
    }

    /// Whether data is staged and waiting for a transmission opportunity.
    pub fn pending_send(&self) -> bool {
        self.pending_send
    }

    /// Bytes currently staged.
    pub fn staged(&self) -> &[u8] {
        &self.buffer
    }

    pub fn att_mtu(&self) -> u16 {
        self.att_mtu
    }

    /// A slot is a legitimate transmission target once a peer is linked and has subscribed.
    pub fn is_eligible(&self) -> bool {
        self.handle.is_some() && self.notifications_enabled
    }

    /// Largest write this slot accepts, bounded by both the staging buffer and the
    /// notification payload of the negotiated MTU.
    pub fn capacity(&self) -> usize {
        let payload = self.att_mtu.saturating_sub(ATT_NOTIFY_HEADER) as usize;
        payload.min(PAYLOAD_MAX)
    }

    pub(crate) fn claim(&mut self, handle: ConnHandle) {
        self.handle = Some(handle);
        self.notifications_enabled = false;
        self.pending_send = false;
        self.att_mtu = ATT_MTU_DEFAULT;
    }

    pub(crate) fn reset(&mut self) {
        self.handle = None;
        self.notifications_enabled = false;
        self.pending_send = false;
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Connection {
    fn format(&self, f: defmt::Formatter<'_>) {
        defmt::write!(
            f,
            "slot = {}, conn = {:?}, notify = {}, pending = {}, staged = {}, mtu = {}",
            self.identity.label(),
            self.handle,
            self.notifications_enabled,
            self.pending_send,
            self.buffer.len(),
            self.att_mtu,
        );
    }
}
