//! REST-Handler Module

pub mod bots;
pub mod loops;
