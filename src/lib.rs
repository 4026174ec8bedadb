#![cfg_attr(not(test), no_std)]

//! Blocking driver for Quectel BC95 NB-IoT modules.
//!
//! [`AtClient`](client::AtClient) runs AT transactions over any
//! `embedded-io` serial port, [`NetworkAttach`](network::NetworkAttach) brings
//! the module onto the network and [`UdpSession`](udp::UdpSession) sends
//! framed, optionally encrypted telemetry datagrams. [`Modem`] ties the three
//! together.

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

#[cfg(feature = "aes")]
pub mod cipher;
pub mod client;
pub mod command;
pub mod config;
pub mod error;
pub mod hex;
mod modem;
mod module_timing;
pub mod network;
pub mod packet;
pub mod traits;
pub mod udp;

#[cfg(test)]
mod test_helpers;

pub use modem::Modem;

pub mod prelude;
