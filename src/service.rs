pub mod auction_service;
pub mod audit_service;
pub mod background_jobs;
pub mod broadcast_service;
pub mod conversation_service;
pub mod error;
pub mod messaging;
pub mod notification_service;
pub mod prompts;
pub mod sweeper_service;

#[cfg(test)]
pub mod testkit;
