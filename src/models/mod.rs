pub mod asset;
pub mod dashboard;
