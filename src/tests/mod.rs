//! Scenario tests
//!
//! - Pass-through, in-place and sibling encodes against scripted encoders
//! - Failure paths leave the input untouched
//! - End-to-end runs against a real ffmpeg when one is installed
