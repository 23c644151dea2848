//! Nursery AGV firmware library.
//!
//! Exposes the pure-logic modules for integration testing and host-side
//! simulation. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod control_loop;
pub mod error;
pub mod fsm;
pub mod pins;
pub mod rpc;
pub mod scheduler;

// Drivers are generic over embedded-hal; the adapters bind them to the
// app ports and to the network.
pub mod adapters;
pub mod drivers;
