// src/lib.rs

//! stormwatch library
//!
//! Ingests storm-track geodata, gridded weather fields, and ocean fields from
//! unreliable upstream feeds, keeps an append-only snapshot store with a
//! "latest known" view per feed kind, and derives structured multi-day storm
//! forecasts through an external reasoning oracle.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod tracker;
pub mod utils;
