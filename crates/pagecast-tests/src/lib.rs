//! Integration test crate for Pagecast.
//!
//! This crate exists solely to hold cross-crate integration tests.
//! The pipeline tests run against in-memory collaborators, so no ffmpeg
//! is needed.

#[cfg(test)]
mod mocks;

#[cfg(test)]
mod planning;

#[cfg(test)]
mod pipeline;

#[cfg(test)]
mod cancellation;
