pub mod auditdb;
pub mod biddb;
pub mod db;
pub mod jobdb;
pub mod profiledb;

#[cfg(test)]
pub mod memorydb;
