#![cfg_attr(not(feature = "std"), no_std)]

pub mod connectors;
pub mod ecosystem;

pub use connectors::*;
pub use ecosystem::*;
