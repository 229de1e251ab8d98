pub mod sweeper;
pub mod webhook;
