pub mod dashboard;
pub mod dialog;
