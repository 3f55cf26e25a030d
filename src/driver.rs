//! Character-output driver surface of the multiplexer.
use embassy_sync::blocking_mutex::raw::RawMutex;
use heapless::Vec;

use crate::config::PAYLOAD_MAX;
use crate::stdio::StdioBle;
use crate::transport::Transport;
use crate::{Error, StdioError};

/// Interface of a character-output driver behind a process-wide stdio facade.
pub trait StdioDriver {
    /// Whether the facade should translate `\n` into `\r\n` before handing output over.
    const CRLF_ENABLED: bool = false;

    /// Hand over output. Never blocks; failures are logged and dropped.
    fn out_chars(&self, buf: &[u8]);

    /// Fill `buf` with input, returning the number of bytes read.
    fn in_chars(&self, buf: &mut [u8]) -> usize;

    fn flush(&self) {}
}

impl<M: RawMutex, T: Transport, const N: usize> StdioDriver for StdioBle<M, T, N> {
    fn out_chars(&self, buf: &[u8]) {
        match self.write(buf) {
            Ok(_) => {}
            Err(StdioError::Transport(e)) => {
                warn!(
                    "[stdio] {} bytes staged, send request failed: {:?}",
                    buf.len(),
                    crate::transport::Error::kind(&e)
                );
            }
            Err(StdioError::Stdio(e)) => {
                warn!("[stdio] dropped {} bytes of output: {:?}", buf.len(), e);
            }
        }
    }

    fn in_chars(&self, buf: &mut [u8]) -> usize {
        self.read(buf)
    }

    fn flush(&self) {
        StdioBle::flush(self)
    }
}

/// Line-buffered writer staging whole lines on the current link.
///
/// Output is collected until a newline or the capacity of the link is reached, then staged
/// in one write. Staging replaces whatever the link has not transmitted yet, so producers
/// should pace themselves on the send path. Without a link output is discarded.
pub struct StdioWriter<'d, M: RawMutex, T: Transport, const N: usize> {
    stdio: &'d StdioBle<M, T, N>,
    line: Vec<u8, PAYLOAD_MAX>,
}

impl<'d, M: RawMutex, T: Transport, const N: usize> StdioWriter<'d, M, T, N> {
    pub fn new(stdio: &'d StdioBle<M, T, N>) -> Self {
        Self { stdio, line: Vec::new() }
    }

    /// Bytes collected and not yet staged.
    pub fn buffered(&self) -> &[u8] {
        &self.line
    }

    /// Stage as much of the collected line as the link accepts, keeping the rest.
    fn stage(&mut self) -> Result<(), StdioError<T::Error>> {
        if self.line.is_empty() {
            return Ok(());
        }
        let n = self.line.len().min(self.stdio.capacity());
        if n == 0 {
            self.line.clear();
            return Ok(());
        }
        let staged = self.stdio.write(&self.line[..n]);
        let rest = self.line.len() - n;
        self.line.copy_within(n.., 0);
        self.line.truncate(rest);
        staged.map(|_| ())
    }
}

impl<M: RawMutex, T: Transport, const N: usize> embedded_io::ErrorType for StdioWriter<'_, M, T, N> {
    type Error = StdioError<T::Error>;
}

impl<M: RawMutex, T: Transport, const N: usize> embedded_io::Write for StdioWriter<'_, M, T, N> {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        if buf.is_empty() {
            return Ok(0);
        }
        let capacity = self.stdio.capacity().min(PAYLOAD_MAX);
        if capacity == 0 {
            self.line.clear();
            return Ok(buf.len());
        }
        while self.line.len() >= capacity {
            self.stage()?;
        }

        let n = (capacity - self.line.len()).min(buf.len());
        let chunk = match buf[..n].iter().position(|b| *b == b'\n') {
            Some(pos) => &buf[..=pos],
            None => &buf[..n],
        };
        self.line
            .extend_from_slice(chunk)
            .map_err(|_| Error::InsufficientSpace)?;
        if chunk.last() == Some(&b'\n') || self.line.len() == capacity {
            self.stage()?;
        }
        Ok(chunk.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        while !self.line.is_empty() {
            self.stage()?;
        }
        Ok(())
    }
}

impl<M: RawMutex, T: Transport, const N: usize> embedded_io::Read for StdioWriter<'_, M, T, N> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        Ok(self.stdio.read(buf))
    }
}

impl<M: RawMutex, T: Transport, const N: usize> core::fmt::Write for StdioWriter<'_, M, T, N> {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        embedded_io::Write::write_all(self, s.as_bytes()).map_err(|_| core::fmt::Error)
    }
}

#[cfg(test)]
mod tests {
    use core::fmt::Write as _;

    use bt_hci::param::ConnHandle;
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;
    use embedded_io::Read as _;

    use super::*;
    use crate::event::TransportEvent;
    use crate::mock_transport::MockTransport;
    use crate::StdioConfig;

    type Stdio<'a> = StdioBle<NoopRawMutex, &'a MockTransport, 3>;

    fn linked(stdio: &Stdio<'_>, handle: u16) {
        let handle = ConnHandle::new(handle);
        unwrap!(stdio.dispatch(TransportEvent::LinkUp {
            handle,
            interval: 12,
            latency: 0
        }));
        unwrap!(stdio.dispatch(TransportEvent::SubscriptionEnabled(handle)));
    }

    #[test]
    fn out_chars_absorbs_errors() {
        let transport = MockTransport::new();
        let stdio: Stdio = StdioBle::new(&transport, StdioConfig::default());
        linked(&stdio, 1);

        stdio.out_chars(&[b'x'; 40]);
        assert!(transport.requests.borrow().is_empty());
        stdio.out_chars(b"ok");
        assert_eq!(transport.requests.borrow().len(), 1);

        let mut buf = [0; 4];
        assert_eq!(stdio.in_chars(&mut buf), 0);
        assert!(!<Stdio as StdioDriver>::CRLF_ENABLED);
    }

    #[test]
    fn lines_are_staged_whole() {
        let transport = MockTransport::new();
        let stdio: Stdio = StdioBle::new(&transport, StdioConfig::default());
        linked(&stdio, 1);

        let mut w = StdioWriter::new(&stdio);
        unwrap!(write!(w, "Hello {}", 1));
        assert_eq!(w.buffered(), b"Hello 1");
        assert!(transport.requests.borrow().is_empty());

        unwrap!(writeln!(w));
        assert!(w.buffered().is_empty());
        assert!(stdio.with_table(|t| unwrap!(t.get(0)).staged() == b"Hello 1\n"));
        assert_eq!(transport.last_request(), Some(ConnHandle::new(1)));
    }

    #[test]
    fn long_output_split_at_capacity() {
        let transport = MockTransport::new();
        let stdio: Stdio = StdioBle::new(&transport, StdioConfig::default());
        linked(&stdio, 1);

        let mut w = StdioWriter::new(&stdio);
        let data = [b'a'; 25];
        assert_eq!(unwrap!(embedded_io::Write::write(&mut w, &data)), 20);
        assert!(w.buffered().is_empty());
        assert_eq!(stdio.with_table(|t| unwrap!(t.get(0)).staged().len()), 20);
        assert_eq!(unwrap!(embedded_io::Write::write(&mut w, &data[20..])), 5);
        assert_eq!(w.buffered().len(), 5);
    }

    #[test]
    fn pending_line_split_for_smaller_link() {
        let transport = MockTransport::new();
        let stdio: Stdio = StdioBle::new(&transport, StdioConfig::default());
        linked(&stdio, 1);
        unwrap!(stdio.dispatch(TransportEvent::MtuExchanged {
            handle: ConnHandle::new(1),
            mtu: 247
        }));

        let mut w = StdioWriter::new(&stdio);
        let data: [u8; 30] = core::array::from_fn(|i| b'a' + i as u8 % 26);
        assert_eq!(unwrap!(embedded_io::Write::write(&mut w, &data)), 30);
        assert_eq!(w.buffered().len(), 30);

        // A new link with the default MTU becomes the target
        linked(&stdio, 3);
        assert_eq!(stdio.capacity(), 20);
        assert_eq!(unwrap!(embedded_io::Write::write(&mut w, b"z")), 1);
        assert!(stdio.with_table(|t| unwrap!(t.get(1)).staged() == &data[..20]));
        assert_eq!(w.buffered().len(), 11);
        assert_eq!(&w.buffered()[..10], &data[20..]);
        assert_eq!(w.buffered()[10], b'z');

        unwrap!(embedded_io::Write::flush(&mut w));
        assert!(w.buffered().is_empty());
        assert!(stdio.with_table(|t| unwrap!(t.get(1)).staged().len() == 11));
    }

    #[test]
    fn out_chars_keeps_output_when_request_fails() {
        let transport = MockTransport::new();
        let stdio: Stdio = StdioBle::new(&transport, StdioConfig::default());
        linked(&stdio, 1);

        transport.fail_requests.set(true);
        stdio.out_chars(b"held");
        assert!(stdio.with_table(|t| unwrap!(t.get(0)).pending_send()));
        assert!(transport.requests.borrow().is_empty());
    }

    #[test]
    fn no_link_discards() {
        let transport = MockTransport::new();
        let stdio: Stdio = StdioBle::new(&transport, StdioConfig::default());

        let mut w = StdioWriter::new(&stdio);
        assert_eq!(unwrap!(embedded_io::Write::write(&mut w, b"lost\n")), 5);
        unwrap!(embedded_io::Write::flush(&mut w));
        assert!(transport.requests.borrow().is_empty());

        let mut buf = [0; 8];
        assert_eq!(unwrap!(w.read(&mut buf)), 0);
    }
}
