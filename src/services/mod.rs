pub mod dashboard;
pub mod interview;
pub mod lookup;
