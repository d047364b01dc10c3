pub mod auth;
pub mod seed;
pub mod session;
pub mod simulator;
