#![deny(warnings)]

pub mod analyzer;
pub mod asr;
pub mod config;
pub mod decode;
pub mod emotion;
pub mod fillers;
pub mod prosody;

pub use bytes::Bytes;
