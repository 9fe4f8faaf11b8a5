use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("server startup failed: {0}")]
    Startup(String),
}
