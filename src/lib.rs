//! Bloodbank - back end for a blood bank: donors, drives, requests and stock.
//!
//! # Overview
//!
//! The service keeps four kinds of records:
//!
//! - donors and the blood type each one carries
//! - donation drives, scheduled and completed
//! - blood requests filed by hospitals
//! - an inventory record per blood type, with the expiry batches received
//!
//! # Inventory Guarantees
//!
//! The inventory ledger is the only writer of stock levels:
//!
//! - units on hand never go below zero
//! - an allocation takes the full amount or nothing
//! - concurrent allocations never lose an update
//!
//! Fulfilling a blood request does **not** deduct stock; allocation is a
//! separate, explicit operation.
//!
//! # Modules
//!
//! - [`model`]: Records, enums and request bodies
//! - [`storage`]: SQLite record store
//! - [`ledger`]: Inventory ledger
//! - [`services`]: Donor, drive and request services
//! - [`dashboard`]: Headline figures
//! - [`api`]: HTTP API handlers and router
//! - [`error`]: Error taxonomy

pub mod api;
pub mod dashboard;
pub mod error;
pub mod ledger;
pub mod model;
pub mod services;
pub mod storage;

pub use error::{Error, Result};
