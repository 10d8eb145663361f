//! Facial scoring core: converts face mesh geometry into a bounded 0-100
//! score and aggregates per-frame scores across a capture session.

pub mod capture;
pub mod detection;
pub mod pipeline;
pub mod scoring;
pub mod shared;
