//! Ownership-tracked cellular automaton with recursive layer navigation.
//!
//! Main components:
//! - [`engine`] — double-buffered grid, the ownership-inheriting rule and
//!   cross-fade interpolation queries.
//! - [`centroid`] — per-owner spatial centres, recomputed every generation.
//! - [`seeder`] — deterministic layer population and periodic disturbance.
//! - [`navigator`] — entering child and parent layers from a focus cell.
//! - [`session`] — the single owner of simulation, camera and layer state.
//! - [`sampler`] — per-cell colour and opacity for renderers.
//! - [`camera`] — screen/cell mapping, pan and zoom.
//! - [`transition`] — animated layer change timing.
//! - [`catalog`] — content units and active-unit selection.
//! - [`layer`] — layer identity, seed hints and per-layer state.
//! - [`config`] — tuning parameters.
//! - [`error`] — navigation errors.
//! - [`types`] — shared type aliases and IDs.

pub mod camera;
pub mod catalog;
pub mod centroid;
pub mod config;
pub mod engine;
pub mod error;
pub mod layer;
pub mod navigator;
pub mod sampler;
pub mod seeder;
pub mod session;
pub mod transition;
pub mod types;
