//! Usecase layer: sampling, navigation, events.

pub mod event;
pub mod navigator;
pub mod sample;
