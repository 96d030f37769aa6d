//! Prompt enhancement and final sheet rendering against an external image model.

pub mod gemini;
pub mod service;
pub mod session;
