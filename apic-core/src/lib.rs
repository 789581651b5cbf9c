//! Core query engine for the Australian precipitation isotope calculator.
//!
//! The engine serves two request shapes over an immutable store of gridded
//! monthly fields (δ²H, δ¹⁸O, dxs and precipitation amount, 1962–2023 on a
//! shared 0.25° grid):
//!
//! - **Timeseries extraction**: project the monthly fields onto a named
//!   temporal resolution ([`resample`]), then select the grid cell nearest
//!   to a coordinate ([`extract`]).
//! - **Spatial search**: reduce the isotope field to an amount-weighted
//!   temporal mean ([`aggregate`]) and mask the cells whose value falls in
//!   a target interval ([`search`]).
//!
//! Both entry points live on [`store::GriddedStore`] (see [`queries`]).
//! All components are pure functions of their inputs; the store is loaded
//! once at startup ([`manifest`]) and shared read-only.

pub mod aggregate;
pub mod errors;
pub mod export;
pub mod extract;
pub mod field;
pub mod grid;
pub mod manifest;
pub mod mwl;
pub mod queries;
pub mod resample;
pub mod search;
pub mod store;
pub mod timeline;
