pub mod collector;
pub mod delta;
pub mod identity;
pub mod platform;
pub mod provider;
pub mod sample;
