//! Round-robin selection of the next connection allowed to transmit.
use crate::connection_table::ConnectionTable;

/// Cursor into the connection table rotating transmission opportunities.
///
/// The slot under the cursor is preferred as long as it stays eligible. After a
/// transmission the cursor is moved past the transmitter, so every eligible slot gets one
/// turn per rotation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Scheduler {
    cursor: usize,
}

impl Scheduler {
    pub const fn new() -> Self {
        Self { cursor: 0 }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Find the first eligible slot starting at the cursor, leaving the cursor on it.
    ///
    /// Visits each slot at most once.
    pub fn next_eligible<const N: usize>(&mut self, table: &ConnectionTable<N>) -> Option<usize> {
        if N == 0 {
            return None;
        }
        let start = self.cursor % N;
        self.cursor = start;
        loop {
            if table.get(self.cursor).is_some_and(|slot| slot.is_eligible()) {
                return Some(self.cursor);
            }
            self.advance(N);
            if self.cursor == start {
                trace!("[sched] no eligible connection");
                return None;
            }
        }
    }

    /// Move the cursor to the following slot, wrapping after `len` slots.
    pub fn advance(&mut self, len: usize) {
        if len > 0 {
            self.cursor = (self.cursor + 1) % len;
        }
    }
}

#[cfg(test)]
mod tests {
    use bt_hci::param::ConnHandle;

    use super::*;

    fn eligible(table: &mut ConnectionTable<3>, slot_handle: u16) {
        let handle = ConnHandle::new(slot_handle);
        unwrap!(table.claim(handle));
        unwrap!(table.enable_notifications(handle));
    }

    /// Repeats select + advance like the send path does.
    fn rotation<const N: usize>(sched: &mut Scheduler, table: &ConnectionTable<N>, turns: usize) -> [Option<usize>; 6] {
        let mut seen = [None; 6];
        for turn in seen.iter_mut().take(turns) {
            *turn = sched.next_eligible(table);
            if turn.is_some() {
                sched.advance(N);
            }
        }
        seen
    }

    #[test]
    fn skips_ineligible_slot() {
        let mut table: ConnectionTable<3> = ConnectionTable::new();
        eligible(&mut table, 1); // A
        unwrap!(table.claim(ConnHandle::new(2))); // B, never subscribes
        eligible(&mut table, 3); // C

        let mut sched = Scheduler::new();
        let seen = rotation(&mut sched, &table, 6);
        assert_eq!(seen, [Some(0), Some(2), Some(0), Some(2), Some(0), Some(2)]);
    }

    #[test]
    fn every_eligible_slot_once_per_rotation() {
        let mut table: ConnectionTable<3> = ConnectionTable::new();
        eligible(&mut table, 5);
        eligible(&mut table, 6);
        eligible(&mut table, 7);

        // Start mid-table
        let mut sched = Scheduler::new();
        sched.advance(3);
        let seen = rotation(&mut sched, &table, 6);
        assert_eq!(seen, [Some(1), Some(2), Some(0), Some(1), Some(2), Some(0)]);
    }

    #[test]
    fn occupancy_order_does_not_matter() {
        let mut table: ConnectionTable<3> = ConnectionTable::new();
        unwrap!(table.claim(ConnHandle::new(1)));
        unwrap!(table.claim(ConnHandle::new(2)));
        unwrap!(table.claim(ConnHandle::new(3)));
        // Subscriptions arrive in reverse order
        unwrap!(table.enable_notifications(ConnHandle::new(3)));
        unwrap!(table.enable_notifications(ConnHandle::new(2)));

        let mut sched = Scheduler::new();
        let seen = rotation(&mut sched, &table, 4);
        assert_eq!(seen[..4], [Some(1), Some(2), Some(1), Some(2)]);
    }

    #[test]
    fn none_eligible_terminates() {
        let mut table: ConnectionTable<3> = ConnectionTable::new();
        unwrap!(table.claim(ConnHandle::new(1)));

        let mut sched = Scheduler::new();
        sched.advance(3);
        assert_eq!(sched.next_eligible(&table), None);
        // A full cycle brings the cursor back where it started
        assert_eq!(sched.cursor(), 1);
    }

    #[test]
    fn cursor_stays_on_selected_slot() {
        let mut table: ConnectionTable<3> = ConnectionTable::new();
        unwrap!(table.claim(ConnHandle::new(1)));
        eligible(&mut table, 2);

        let mut sched = Scheduler::new();
        assert_eq!(sched.next_eligible(&table), Some(1));
        assert_eq!(sched.next_eligible(&table), Some(1));
        assert_eq!(sched.cursor(), 1);
    }

    #[test]
    fn empty_table() {
        let table: ConnectionTable<0> = ConnectionTable::new();
        let mut sched = Scheduler::new();
        assert_eq!(sched.next_eligible(&table), None);
    }
}
