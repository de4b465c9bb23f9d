//! A software crossover link between two virtual network interfaces.
//!
//! The crate emulates a pair of interfaces wired back to back: a frame
//! transmitted on one side is rewritten and handed to the other side's
//! receive path, as if a crossover cable joined two mirrored subnets. The
//! rewrite toggles the low bit of the third octet of both IPv4 addresses and
//! refills the header checksum, so that traffic sent *from* one subnet
//! arrives *as* the other and a round trip restores the original frame.
//!
//! ## Design
//!
//! Nothing in this crate dynamically allocates memory. Each interface owns a
//! single staging slot sized for one maximal frame; setup code constructs the
//! [`nic::Pair`] once and every entry point runs synchronously to completion.
//! The host's ingress hook is passed into [`nic::Interface::transmit`] per
//! call, in the same way a device implementation is handed its sender and
//! receiver callbacks.
//!
//! The [`wire`] module provides the byte-level access to the two formats in
//! play, the fixed 14-byte link header and the IPv4 header. The [`nic`]
//! module holds the interface pair itself: identity, flow control, counters
//! and the forwarding sequence.
//!
//! [`nic::Pair`]: nic/struct.Pair.html
//! [`nic::Interface::transmit`]: nic/struct.Interface.html#method.transmit
//! [`wire`]: wire/index.html
//! [`nic`]: nic/index.html
#![warn(missing_docs)]
#![warn(unreachable_pub)]

// tests should be able to use `std`
#![cfg_attr(all(
    not(feature = "std"),
    not(test)),
no_std)]

#[macro_use] mod macros;
pub mod nic;
pub mod wire;
