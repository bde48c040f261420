// tests/support/mocks/mod.rs
#![allow(dead_code)]
#![allow(unused_imports)]

pub mod session;
pub mod time;

pub use session::SwitchableSessionRepository;
pub use time::{MockClock, fixed_now};
