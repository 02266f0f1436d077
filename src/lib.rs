//! UK Inheritance Tax calculations for lifetime gifts and estates.
//!
//! Everything in [`core`] is a pure function of its inputs: gifts are allocated to
//! exemptions, positioned in the 7-year PET window, aggregated, and combined with the
//! estate's nil-rate bands. The as-of date is always passed in explicitly.

pub mod core;
