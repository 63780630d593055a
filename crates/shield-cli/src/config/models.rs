use gammashield::engine::config::SweepConfig;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub cross_sections: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub engine: EngineConfig,
    pub sweep: SweepConfig,
}
