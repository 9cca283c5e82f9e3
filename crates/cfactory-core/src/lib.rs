pub mod app_config;
pub mod config;
pub mod domain;
pub mod plan;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use domain::{
    CarouselStatus, ContentStatus, ContentView, PlanStatus, RunKind, RunStatus, Theme,
    TriggerSource,
};
pub use plan::{CtaFinal, PlanStructure, SlideDescriptor};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unknown run kind: {0}")]
    UnknownRunKind(String),
    #[error("unknown status '{value}' for {entity}")]
    UnknownStatus {
        entity: &'static str,
        value: String,
    },
}
