//! PetPal library.
//!
//! A webcam virtual pet: a classifier watches the camera, a smoother turns
//! noisy per-frame confidences into stable sightings, and a small state
//! machine decides whether the pet is happy, neutral or sad.  Everything
//! here is pure logic driven through the port traits in [`app::ports`];
//! the binary wires in console adapters.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod error;
pub mod events;
pub mod fsm;
pub mod scheduler;
pub mod smoother;

pub use error::{Error, Result};
pub use fsm::context::Millis;
