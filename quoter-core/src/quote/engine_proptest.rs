//! Property-based tests for quote rounding
//!
//! Prices are generated on a grid of tick/1000 so that every exact
//! quotient is at least 0.001 away from a tick boundary or sits exactly
//! on one, which is the situation the f64 ε is meant to absorb.
