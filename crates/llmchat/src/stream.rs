//! Streaming response assembly
//!
//! A streamed completion flows through two stages. [`decoder`] turns raw body
//! chunks into `data:` event payloads, and [`accumulator`] folds each payload
//! into a cumulative [`accumulator::StreamSnapshot`].
pub mod accumulator;
pub mod decoder;
