use std::path::PathBuf;

pub struct DefaultsConfig {
    pub test_mode: bool,
    pub results_dir: PathBuf,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            test_mode: true,
            results_dir: PathBuf::from("results"),
        }
    }
}
