//! Integration tests for the smol-dev generation pipeline

mod fan_out;
mod overrides;
mod resume;
mod test_utils;
