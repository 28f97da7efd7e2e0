pub mod entity;
pub mod errors;
pub mod lifecycle;
pub mod repository;
pub mod value_objects;
