//! Historical trade ingestion.
//!
//! [`providers::TradeProvider`] is the entry point: give it a
//! [`models::request_params::TradesRequestParams`] and get back every trade in
//! the requested range, together with a flag saying whether the upstream
//! delivered all pages.

pub mod models;
pub mod providers;
