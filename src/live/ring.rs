//! The kernel-assisted receive path: an io_uring with one receive request
//! outstanding per buffer, so the kernel always has somewhere to place
//! incoming bytes while userland drains the other buffer.

use std::{
    io,
    os::fd::RawFd,
};

use io_uring::{opcode, types, IoUring};

/// The number of receive buffers, and of receive requests kept in flight.
const NUM_BUFFERS: usize = 2;

/// A completed receive: which buffer it landed in and how many bytes
/// arrived. Zero bytes means the peer closed the connection.
pub(crate) type Completion = (usize, usize);

/// An io_uring cycling [`NUM_BUFFERS`] receive requests on one socket. Each
/// request is tagged with its buffer index so completions can be routed back.
pub(crate) struct RecvRing {
    ring: IoUring,
    fd: RawFd,
    buffers: [Box<[u8]>; NUM_BUFFERS],
}

impl RecvRing {
    /// Creates a ring over the socket `fd` with two `capacity`-sized receive
    /// buffers and submits the initial receive request for each.
    pub(crate) fn new(fd: RawFd, capacity: usize) -> io::Result<Self> {
        let mut ring = Self {
            ring: IoUring::new(NUM_BUFFERS as u32)?,
            fd,
            buffers: std::array::from_fn(|_| vec![0; capacity].into_boxed_slice()),
        };
        for index in 0..NUM_BUFFERS {
            ring.push_recv(index)?;
        }
        ring.ring.submit()?;
        Ok(ring)
    }

    /// Returns the receive buffer with `index`.
    pub(crate) fn buffer_mut(&mut self, index: usize) -> &mut [u8] {
        &mut self.buffers[index]
    }

    /// Blocks until one receive request completes and returns its buffer
    /// index and byte count. Returns `None` without consuming a completion
    /// if the wait was interrupted by a signal.
    pub(crate) fn wait(&mut self) -> io::Result<Option<Completion>> {
        match self.ring.submit_and_wait(1) {
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::Interrupted => return Ok(None),
            Err(e) => return Err(e),
        }
        let Some(entry) = self.ring.completion().next() else {
            return Ok(None);
        };
        let index = (entry.user_data() as usize).min(NUM_BUFFERS - 1);
        let result = entry.result();
        if result < 0 {
            let err = io::Error::from_raw_os_error(-result);
            if err.kind() == io::ErrorKind::Interrupted {
                // An interrupted receive left its buffer unarmed; re-arm it
                // before reporting the interruption.
                self.resubmit(index)?;
                return Ok(None);
            }
            return Err(err);
        }
        Ok(Some((index, result as usize)))
    }

    /// Re-arms a receive request targeting the drained buffer `index`.
    pub(crate) fn resubmit(&mut self, index: usize) -> io::Result<()> {
        self.push_recv(index)?;
        self.ring.submit()?;
        Ok(())
    }

    fn push_recv(&mut self, index: usize) -> io::Result<()> {
        let buffer = &mut self.buffers[index];
        let entry = opcode::Recv::new(types::Fd(self.fd), buffer.as_mut_ptr(), buffer.len() as u32)
            .build()
            .user_data(index as u64);
        // Safety: the buffer is owned by `self` at a stable heap address and
        // is not handed out again until this request's completion has been
        // harvested by `wait()`.
        unsafe {
            self.ring
                .submission()
                .push(&entry)
                .map_err(|_| io::Error::new(io::ErrorKind::Other, "submission queue full"))?;
        }
        Ok(())
    }
}
