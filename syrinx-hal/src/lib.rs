//! Syrinx Hardware Abstraction Layer
//!
//! This crate defines the transport traits the payload-link drivers are
//! written against. Any polled serial peripheral (or a plain in-memory
//! buffer on the host) can implement them, so the same driver code runs
//! on target hardware and in host tests.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Link drivers (syrinx-drivers)          │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  syrinx-hal (this crate - traits)       │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ target UART   │       │ host mock     │
//! │ periphery     │       │ (tests)       │
//! └───────────────┘       └───────────────┘
//! ```

#![no_std]
#![deny(unsafe_code)]

pub mod serial;

pub use serial::SerialPort;
