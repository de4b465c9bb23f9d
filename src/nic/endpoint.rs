//! Per-endpoint state: flow control, counters and the staging slot.
use super::MAX_FRAME_LEN;

/// Flow-control status of an interface's transmit queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueState {
    /// The queue accepts frames.
    Running,

    /// The host stopped the queue. Only `open` restarts it.
    Stopped,

    /// The staging slot is full; the queue wakes once it drains.
    Throttled,
}

/// Frame counters of one interface, exposed as a read-only snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    /// Frames accepted for transmission and delivered to the peer.
    pub sent: u64,
    /// Frames handed to the ingress hook on this side.
    pub received: u64,
    /// Frames the ingress hook on this side refused.
    pub dropped: u64,
}

/// Staging buffer holding at most one frame in flight.
///
/// Not a queue. While it is occupied the owning endpoint is throttled, so a
/// stored frame can never be overwritten by a second transmit.
pub(crate) struct Slot {
    len: usize,
    occupied: bool,
    data: [u8; MAX_FRAME_LEN],
}

impl Slot {
    pub(crate) fn new() -> Self {
        Slot {
            len: 0,
            occupied: false,
            data: [0; MAX_FRAME_LEN],
        }
    }

    /// Stage a frame. The caller has checked the length against capacity.
    pub(crate) fn store(&mut self, frame: &[u8]) {
        debug_assert!(!self.occupied);
        self.data[..frame.len()].copy_from_slice(frame);
        self.len = frame.len();
        self.occupied = true;
    }

    pub(crate) fn clear(&mut self) {
        self.len = 0;
        self.occupied = false;
    }

    pub(crate) fn is_empty(&self) -> bool {
        !self.occupied
    }

    pub(crate) fn bytes(&self) -> &[u8] {
        &self.data[..self.len]
    }

    pub(crate) fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data[..self.len]
    }
}

/// The mutable half of one interface, guarded by the pair's lock.
pub(crate) struct EndpointState {
    pub(crate) queue: QueueState,
    pub(crate) slot: Slot,
    pub(crate) stats: Stats,
}

impl EndpointState {
    /// A fresh endpoint. The queue starts stopped until the host opens it.
    pub(crate) fn new() -> Self {
        EndpointState {
            queue: QueueState::Stopped,
            slot: Slot::new(),
            stats: Stats::default(),
        }
    }

    /// Restart a queue that was throttled by a full slot, once it drained.
    ///
    /// A host stop is never undone here; only `open` leaves `Stopped`.
    pub(crate) fn wake(&mut self) {
        if self.queue == QueueState::Throttled && self.slot.is_empty() {
            self.queue = QueueState::Running;
        }
    }
}
