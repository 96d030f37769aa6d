//! Runs the three compositors together and publishes their results in trigger order.

pub mod coordinator;
