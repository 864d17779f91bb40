pub mod app_config;
pub mod audit_repo;
pub mod booking_repo;
pub mod database;
pub mod inquiry_repo;
pub mod payment_repo;
pub mod quote_repo;
pub mod redis_repo;

pub use database::DbClient;
pub use redis_repo::RedisClient;
