//! The interface pair and its forwarding sequence.
use core::fmt;

use spin::Mutex;

use crate::wire::{self, ethernet_frame, ipv4_packet, EthernetAddress, EthernetProtocol, EthernetRepr};

use super::endpoint::EndpointState;
use super::{Dropped, QueueState, Recv, Stats, TransmitError, MAX_FRAME_LEN};

/// Names one side of the link.
///
/// Doubles as the peer back-reference: each port maps to the other through
/// [`peer`], an index into the pair's fixed two-element tables. The relation
/// is symmetric and never reassigned.
///
/// [`peer`]: #method.peer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Port {
    /// The first interface.
    A,
    /// The second interface.
    B,
}

impl Port {
    /// The port of the other side.
    pub fn peer(self) -> Port {
        match self {
            Port::A => Port::B,
            Port::B => Port::A,
        }
    }

    fn index(self) -> usize {
        match self {
            Port::A => 0,
            Port::B => 1,
        }
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Port::A => write!(f, "A"),
            Port::B => write!(f, "B"),
        }
    }
}

/// Two interfaces wired back to back.
///
/// The explicit context object of the link: it owns both endpoints' state
/// and drives the forwarding sequence on transmit. Construct it once and
/// hand [`Interface`] views to whatever host-integration layer needs them;
/// dropping the pair releases both endpoints.
///
/// All entry points take `&self` and run to completion. The forwarding
/// sequence executes under exclusive access to both endpoints, so transmits
/// may be issued concurrently from independent execution contexts.
///
/// [`Interface`]: struct.Interface.html
pub struct Pair {
    addrs: [EthernetAddress; 2],
    state: Mutex<[EndpointState; 2]>,
}

/// One side of a [`Pair`]: the host-facing view of a single interface.
///
/// [`Pair`]: struct.Pair.html
pub struct Interface<'a> {
    pair: &'a Pair,
    port: Port,
}

impl Pair {
    /// Create a link from a base address.
    ///
    /// Addresses are assigned deterministically: port A gets `base`, port B
    /// gets `base` with its final byte incremented, so the two differ only
    /// there. Both queues start stopped until the host opens them.
    pub fn new(base: EthernetAddress) -> Self {
        let mut second = base;
        second.0[5] = second.0[5].wrapping_add(1);

        Pair {
            addrs: [base, second],
            state: Mutex::new([EndpointState::new(), EndpointState::new()]),
        }
    }

    /// The link address of one side.
    pub fn addr(&self, port: Port) -> EthernetAddress {
        self.addrs[port.index()]
    }

    /// Borrow the host-facing view of one side.
    pub fn interface(&self, port: Port) -> Interface<'_> {
        Interface {
            pair: self,
            port,
        }
    }

    fn transmit(&self, port: Port, frame: &[u8], mut ingress: impl Recv)
        -> Result<(), TransmitError>
    {
        let x = port.index();
        let y = port.peer().index();
        let mut state = self.state.lock();

        if state[x].queue != QueueState::Running {
            return Err(TransmitError::QueueClosed);
        }
        if frame.len() > MAX_FRAME_LEN {
            return Err(TransmitError::TooLarge);
        }

        // Stage the frame. The slot holds one frame in flight at most;
        // while it does, the queue is throttled.
        state[x].slot.store(frame);
        state[x].queue = QueueState::Throttled;

        rewrite(state[x].slot.bytes_mut());

        net_trace!("{} tx {} octets", port, frame.len());
        let delivered = ingress.receive(port.peer(), state[x].slot.bytes());

        match delivered {
            Ok(()) => {
                state[x].stats.sent += 1;
                state[y].stats.received += 1;
            }
            Err(Dropped) => {
                state[y].stats.dropped += 1;
            }
        }

        state[x].slot.clear();
        state[x].wake();
        state[y].wake();

        delivered.map_err(|_| TransmitError::ResourceExhausted)
    }
}

impl<'a> Interface<'a> {
    /// The port this view refers to.
    pub fn port(&self) -> Port {
        self.port
    }

    /// The interface's own link address.
    pub fn addr(&self) -> EthernetAddress {
        self.pair.addr(self.port)
    }

    /// The broadcast address of the link.
    pub fn broadcast(&self) -> EthernetAddress {
        EthernetAddress::BROADCAST
    }

    /// Let the queue accept frames. Idempotent.
    pub fn open(&self) {
        self.pair.state.lock()[self.port.index()].queue = QueueState::Running;
    }

    /// Stop the queue. Idempotent; only `open` restarts a stopped queue.
    pub fn stop(&self) {
        self.pair.state.lock()[self.port.index()].queue = QueueState::Stopped;
    }

    /// The current flow-control state of the queue.
    pub fn queue_state(&self) -> QueueState {
        self.pair.state.lock()[self.port.index()].queue
    }

    /// A read-only snapshot of the interface's counters.
    pub fn stats(&self) -> Stats {
        self.pair.state.lock()[self.port.index()].stats
    }

    /// Write the link header at the front of an outgoing frame.
    ///
    /// The source field is this interface's address; the destination is the
    /// peer's, which shares every byte but the last. The link always
    /// addresses the other side, never itself. Returns the header length.
    pub fn fill_header(&self, frame: &mut [u8], ethertype: EthernetProtocol)
        -> wire::Result<usize>
    {
        let frame = ethernet_frame::new_checked_mut(frame)?;
        let repr = EthernetRepr {
            dst_addr: self.pair.addr(self.port.peer()),
            src_addr: self.addr(),
            ethertype,
        };
        repr.emit(frame);
        Ok(wire::ETHERNET_HEADER_LEN)
    }

    /// Transmit a frame, delivering it to the peer's ingress hook.
    ///
    /// The queue must be running and the frame must fit the maximum transfer
    /// unit. On success the frame is staged, its embedded IPv4 header is
    /// rewritten onto the mirrored subnets with a fresh checksum, and the
    /// result is handed to `ingress` tagged with the peer's port. A frame
    /// without a usable IPv4 header at the link-header offset is forwarded
    /// unchanged.
    ///
    /// A failed transmit leaves all endpoint state exactly as it was.
    pub fn transmit(&self, frame: &[u8], ingress: impl Recv)
        -> Result<(), TransmitError>
    {
        self.pair.transmit(self.port, frame, ingress)
    }
}

/// Toggle the subnet-mirroring bit of both addresses of an IPv4 header.
///
/// Flips bit 0 of the third octet of the source and destination fields, the
/// fixed mapping between the two mirrored address ranges. An involution:
/// applying it twice restores the original header. The checksum is not
/// touched; callers recompute it afterwards.
pub fn mirror_addresses(packet: &mut ipv4_packet) {
    let mut src = packet.src_addr();
    let mut dst = packet.dst_addr();
    src.0[2] ^= 0x01;
    dst.0[2] ^= 0x01;
    packet.set_src_addr(src);
    packet.set_dst_addr(dst);
}

/// Rewrite a staged frame in place for delivery to the other subnet.
///
/// Absence of a well-formed IPv4 header at the link-header offset is not an
/// error; the frame passes through unmodified.
fn rewrite(frame: &mut [u8]) {
    let frame = match ethernet_frame::new_checked_mut(frame) {
        Ok(frame) => frame,
        Err(_) => return,
    };

    let packet = match ipv4_packet::new_checked_mut(frame.payload_mut_slice()) {
        Ok(packet) if packet.version() == 4 => packet,
        _ => {
            net_debug!("no ipv4 header at link offset, passing frame through");
            return;
        }
    };

    mirror_addresses(packet);
    packet.fill_checksum();
}
