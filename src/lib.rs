#![doc = include_str!("RUSTDOC.md")]

pub mod monitor;
pub mod performance;
pub mod platform;

#[cfg(test)]
pub mod test_support;
