pub mod blacklist;
pub mod checks;
pub mod profanity;
pub mod quick_check;
pub mod verdict;
