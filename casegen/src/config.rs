//! Configuration types for generators and suite emission.

use std::path::{Path, PathBuf};

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// The batch directory prefix is empty
    EmptyBatchPrefix,
    /// The cases directory is empty
    EmptyCasesDir,
    /// The reference solution command is empty
    EmptySolutionCommand,
    /// Invalid rejection limit (must be > 0)
    InvalidRejectionLimit(usize),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::EmptyBatchPrefix => write!(f, "Batch directory prefix must not be empty"),
            ConfigError::EmptyCasesDir => write!(f, "Cases directory must not be empty"),
            ConfigError::EmptySolutionCommand => {
                write!(f, "Reference solution command must not be empty")
            }
            ConfigError::InvalidRejectionLimit(n) => {
                write!(f, "Invalid rejection limit: {} (must be > 0)", n)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Options shared by every generator builder
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GeneratorOptions {
    /// Seed for the generator's private RNG; entropy when absent
    pub seed: Option<u64>,
    /// Maximum number of consecutive rejected draws before a rejection loop gives up.
    ///
    /// `None` keeps the loops unbounded: an infeasible configuration (for example asking
    /// for more distinct edges than exist) then never terminates.
    pub rejection_limit: Option<usize>,
}

impl GeneratorOptions {
    /// Validate the generator options
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(0) = self.rejection_limit {
            return Err(ConfigError::InvalidRejectionLimit(0));
        }
        Ok(())
    }
}

/// Configuration for writing batches of cases to disk
#[derive(Debug, Clone, PartialEq)]
pub struct SuiteConfig {
    /// Root directory that receives one sub-directory per batch
    pub cases_dir: PathBuf,
    /// Prefix of batch directory names (`batch` gives `batch1`, `batch2`, ...)
    pub batch_prefix: String,
    /// Shell command of the reference solution, run once per case to produce `.out` files
    pub solution: Option<String>,
    /// Base seed; every case derives its own stream from it
    pub seed: Option<u64>,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            cases_dir: PathBuf::from("cases"),
            batch_prefix: "batch".to_string(),
            solution: None,
            seed: None,
        }
    }
}

impl SuiteConfig {
    /// Use a different root directory
    pub fn with_cases_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cases_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Use a different batch directory prefix
    pub fn with_batch_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.batch_prefix = prefix.into();
        self
    }

    /// Run `command` on every written input to produce the expected output
    pub fn with_solution(mut self, command: impl Into<String>) -> Self {
        self.solution = Some(command.into());
        self
    }

    /// Make the whole suite reproducible
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validate the suite configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cases_dir.as_os_str().is_empty() {
            return Err(ConfigError::EmptyCasesDir);
        }
        if self.batch_prefix.is_empty() {
            return Err(ConfigError::EmptyBatchPrefix);
        }
        if let Some(command) = &self.solution {
            if command.trim().is_empty() {
                return Err(ConfigError::EmptySolutionCommand);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suite_config_defaults() {
        let config = SuiteConfig::default();
        assert_eq!(config.cases_dir, PathBuf::from("cases"));
        assert_eq!(config.batch_prefix, "batch");
        assert!(config.solution.is_none());
        assert!(config.seed.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_suite_config_validation() {
        let config = SuiteConfig::default().with_batch_prefix("");
        assert_eq!(config.validate(), Err(ConfigError::EmptyBatchPrefix));

        let config = SuiteConfig::default().with_solution("   ");
        assert_eq!(config.validate(), Err(ConfigError::EmptySolutionCommand));

        let config = SuiteConfig::default().with_cases_dir("");
        assert_eq!(config.validate(), Err(ConfigError::EmptyCasesDir));
    }

    #[test]
    fn test_generator_options_validation() {
        assert!(GeneratorOptions::default().validate().is_ok());
        let options = GeneratorOptions {
            seed: Some(1),
            rejection_limit: Some(0),
        };
        assert_eq!(
            options.validate(),
            Err(ConfigError::InvalidRejectionLimit(0))
        );
    }

    #[test]
    fn test_config_error_display() {
        assert_eq!(
            format!("{}", ConfigError::InvalidRejectionLimit(0)),
            "Invalid rejection limit: 0 (must be > 0)"
        );
    }
}
