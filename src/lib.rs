#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
#![warn(unused_extern_crates, unreachable_pub, nonstandard_style)]

pub mod authenticator;
pub mod config;
pub mod credentials;
pub mod error;
pub mod hotp;
pub mod otpauth;
pub mod reactive;
mod rng;
pub mod store;
