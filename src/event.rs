//! Events reported by the BLE stack and the outcomes of handling them.
use bt_hci::param::ConnHandle;

/// Lifecycle events of the BLE stack the driver reacts to.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportEvent {
    /// The controller is powered and ready; advertising can start.
    PowerOnReady,
    /// A central connected. `interval` is in 1.25 ms units.
    LinkUp {
        handle: ConnHandle,
        interval: u16,
        latency: u16,
    },
    LinkDown(ConnHandle),
    /// The peer enabled notifications on the output characteristic.
    SubscriptionEnabled(ConnHandle),
    /// The peer disabled notifications. The link keeps its slot and staged output is dropped.
    SubscriptionDisabled(ConnHandle),
    /// The peer attached to the UART service. Treated like [`TransportEvent::SubscriptionEnabled`].
    ServiceConnected(ConnHandle),
    /// The peer detached from the UART service. Treated like [`TransportEvent::SubscriptionDisabled`].
    ServiceDisconnected(ConnHandle),
    ConnectionParametersUpdated {
        handle: ConnHandle,
        interval: u16,
        latency: u16,
    },
    MtuExchanged {
        handle: ConnHandle,
        mtu: u16,
    },
}

/// Anything the stack delivers to the driver through a [`Runner`](crate::runner::Runner).
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportInput {
    Event(TransportEvent),
    /// A grant previously armed with [`Transport::request_send_capacity`](crate::Transport::request_send_capacity).
    SendCapacity(ConnHandle),
}

impl From<TransportEvent> for TransportInput {
    fn from(event: TransportEvent) -> Self {
        Self::Event(event)
    }
}

/// What an event did to the connection table.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    Applied,
    /// No slot matched the event's link.
    Ignored,
    /// The link could not get a slot because the table is full.
    Rejected,
}

/// What a send-capacity grant resulted in.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// One payload of `len` bytes went out on the slot at `index`.
    Sent { index: usize, len: usize },
    /// No eligible connection, nothing sent. Unsubscribing or dropping a link withdraws its
    /// armed request, so a matching grant normally finds its link still eligible.
    Idle,
    /// The grant no longer matches an armed request, nothing sent.
    Stale,
}
