//! Shared test harness modules for the ridetrack CLI.
#![expect(
    clippy::panic,
    reason = "Tests assert panic branches to surface unexpected CLI outcomes"
)]

use super::*;

mod helpers;
mod stops_steps;
mod stops_unit;
