//! Event loop feeding queued transport input into the multiplexer.
use core::future::Future;

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::Channel;

use crate::config::{CONNECTIONS_MAX, INPUT_QUEUE_SIZE};
use crate::event::TransportInput;
use crate::stdio::StdioBle;
use crate::transport::Transport;
use crate::StdioError;

/// Queue through which transport glue hands events and grants to a [`Runner`].
pub type InputChannel<M> = Channel<M, TransportInput, INPUT_QUEUE_SIZE>;

/// Drains an [`InputChannel`] on the task owning the multiplexer.
///
/// Transport callbacks often run in a context that must not touch the connection table
/// directly. They push [`TransportInput`] values instead, and the runner applies them one at
/// a time.
pub struct Runner<'d, M: RawMutex, T: Transport, const N: usize = CONNECTIONS_MAX> {
    stdio: &'d StdioBle<M, T, N>,
    inputs: &'d InputChannel<M>,
}

impl<'d, M: RawMutex, T: Transport, const N: usize> Runner<'d, M, T, N> {
    pub fn new(stdio: &'d StdioBle<M, T, N>, inputs: &'d InputChannel<M>) -> Self {
        Self { stdio, inputs }
    }

    pub fn stdio(&self) -> &'d StdioBle<M, T, N> {
        self.stdio
    }

    /// Process input forever. Returns only when the transport fails.
    pub async fn run(&self) -> Result<(), StdioError<T::Error>> {
        loop {
            let input = self.inputs.receive().await;
            self.process(input)?;
        }
    }

    /// Process input until `stop` completes.
    pub async fn run_until<F: Future<Output = ()>>(&self, stop: F) -> Result<(), StdioError<T::Error>> {
        match select(stop, self.run()).await {
            Either::First(_) => Ok(()),
            Either::Second(result) => result,
        }
    }

    /// Process everything already queued without waiting, returning how many inputs were
    /// handled.
    pub fn poll(&self) -> Result<usize, StdioError<T::Error>> {
        let mut handled = 0;
        while let Ok(input) = self.inputs.try_receive() {
            self.process(input)?;
            handled += 1;
        }
        Ok(handled)
    }

    pub fn process(&self, input: TransportInput) -> Result<(), StdioError<T::Error>> {
        let result = match input {
            TransportInput::Event(event) => self.stdio.dispatch(event).map(|_| ()),
            TransportInput::SendCapacity(handle) => self.stdio.on_send_capacity(handle).map(|_| ()),
        };
        if let Err(e) = &result {
            warn!("[stdio] failed to process {:?}: {:?}", input, embedded_io::Error::kind(e));
        }
        result
    }
}
