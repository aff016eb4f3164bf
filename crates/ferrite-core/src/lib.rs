//! # Ferrite Core
//!
//! The numerical backbone of Ferrite. This crate selects a switching
//! frequency and a pair of catalogued power semiconductors (a switch device
//! and a rectifying device) for an inductively coupled power transfer link,
//! minimising a blend of electrical loss and component price.
//!
//! ## Architecture
//!
//! The analytic loss models ([`coil`], [`devices`]) are pure functions of a
//! validated [`types::SystemParameters`] record and one catalogue entry. The
//! [`objective::ObjectiveFunction`] reduces both catalogues to their best
//! entry at a given frequency and tracks the best choice seen during a run.
//! A particle swarm ([`optimizer::ParticleSwarm`]) drives the objective over
//! a bounded frequency interval, and [`engine::optimize`] assembles the final
//! [`result::OptimizationResult`].
//!
//! Progress and diagnostic text leave the core only through an
//! [`events::EventSink`], so the crate has no dependency on any presentation
//! layer and runs headlessly in tests.
//!
//! ## Modules
//!
//! - [`types`]: Coil geometry, system parameters, derived coil pair.
//! - [`coil`]: Wheeler inductance, conductor resistance, link efficiency.
//! - [`devices`]: Switch and rectifier loss models.
//! - [`catalog`]: Validated catalogue records and their schemas.
//! - [`objective`]: Stateful objective with best-so-far tracking.
//! - [`optimizer`]: Bounded one-dimensional particle swarm.
//! - [`result`]: Immutable result record.
//! - [`engine`]: Run driver.
//! - [`events`]: Outward progress/diagnostic channel.
//! - [`error`]: Error taxonomy.

pub mod catalog;
pub mod coil;
pub mod devices;
pub mod engine;
pub mod error;
pub mod events;
pub mod objective;
pub mod optimizer;
pub mod result;
pub mod types;

pub use error::DesignError;
