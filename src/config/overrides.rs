use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use std::path::PathBuf;

/// Command-line values that replace configured ones before a run starts
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub base_url: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub max_retries: Option<u32>,
    pub request_timeout_secs: Option<u64>,
    pub delay_min_secs: Option<f64>,
    pub delay_max_secs: Option<f64>,
}

impl ConfigOverrides {
    /// Applies the overrides and validates the result
    pub fn apply(self, config: &mut Config) -> Result<(), ConfigError> {
        if let Some(base_url) = self.base_url {
            config.site.base_url = base_url;
        }
        if let Some(output_dir) = self.output_dir {
            config.output.output_dir = output_dir;
        }
        if let Some(max_retries) = self.max_retries {
            config.fetch.max_retries = max_retries;
        }
        if let Some(timeout) = self.request_timeout_secs {
            config.fetch.request_timeout_secs = timeout;
        }
        if let Some(delay_min) = self.delay_min_secs {
            config.fetch.delay_min_secs = delay_min;
            if self.delay_max_secs.is_none() && config.fetch.delay_max_secs < delay_min {
                config.fetch.delay_max_secs = delay_min;
            }
        }
        if let Some(delay_max) = self.delay_max_secs {
            config.fetch.delay_max_secs = delay_max;
        }

        validate(config)
    }
}
