pub mod config_cmd;
pub mod plan;

pub use plan::PlanOptions;
