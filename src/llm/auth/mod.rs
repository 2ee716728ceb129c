//! Authentication helpers for cloud-hosted providers

pub mod adc;
