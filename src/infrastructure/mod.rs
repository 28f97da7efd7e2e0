pub mod captioning;
pub mod database;
pub mod hashing;
pub mod payments;
pub mod publishing;
pub mod repositories;
pub mod storage;
