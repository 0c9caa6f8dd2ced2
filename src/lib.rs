//! fxwatch: a terminal dashboard for the daily economic calendar.
//!
//! Every refresh cycle fetches the day's calendar page, extracts the release
//! table, highlighted events and central-bank rates, and redraws them with a
//! countdown to the next cycle.

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod events;
pub mod state;
pub mod ui;
