//! Integration tests for codec robustness and end-to-end persistence.

mod codec;
mod sharing;
