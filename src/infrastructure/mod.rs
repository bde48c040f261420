pub mod database;
pub mod gc;
pub mod repositories;
pub mod security;
pub mod time;
pub mod util;
