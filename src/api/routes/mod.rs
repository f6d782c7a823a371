pub mod health;
pub mod metrics;
pub mod update;
pub mod value;
