//! Application core: pure domain logic, zero I/O.
//!
//! This module contains the business rules for the pet: smoothing,
//! FSM orchestration and timers.  All interaction with the camera,
//! classifier and screen happens through **port traits** defined in
//! [`ports`], keeping this layer fully testable without real devices.

pub mod commands;
pub mod detector;
pub mod events;
pub mod ports;
pub mod service;
