use crate::return_config_error;
use crate::return_file_error;
use crate::ssa_analysis::analysis_errors::AnalysisError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const CONFIG_FILE_NAME: &str = "tracerr.toml";
pub const DEFAULT_TEST_FILE_SUFFIX: &str = "_test.go";
pub const IR_FILE_EXTENSION: &str = "json";

// Rough guesses to avoid early reallocation while loading a program.
pub const MINIMUM_STRING_TABLE_CAPACITY: usize = 64;
pub const VALUES_PER_FUNCTION_GUESS: usize = 24; // (Maybe) small functions dominate most packages

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Report functions declared in test files as well.
    pub include_test_files: bool,

    /// Files whose name ends with this suffix are test files.
    pub test_file_suffix: String,

    /// Strip the "<package>." prefix from function, global and closure names.
    pub trim_package_prefix: bool,

    pub output: OutputFormat,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            include_test_files: false,
            test_file_suffix: String::from(DEFAULT_TEST_FILE_SUFFIX),
            trim_package_prefix: true,
            output: OutputFormat::Text,
        }
    }
}

impl Config {
    pub fn from_toml_str(source: &str) -> Result<Self, AnalysisError> {
        match toml::from_str::<Config>(source) {
            Ok(config) => Ok(config),
            Err(e) => {
                return_config_error!(
                    format!("Malformed {CONFIG_FILE_NAME}: {e}"),
                    None,
                    {
                        PrimarySuggestion => "Check the field names and value types in the config file",
                    }
                );
            }
        }
    }

    /// Loads the config at `path`. A missing file is an error here;
    /// use `Config::discover` for the optional working-directory lookup.
    pub fn load(path: &Path) -> Result<Self, AnalysisError> {
        let source = match fs::read_to_string(path) {
            Ok(source) => source,
            Err(e) => {
                return_file_error!(path, format!("Could not read config file: {e}"));
            }
        };

        Self::from_toml_str(&source)
    }

    /// Looks for `tracerr.toml` inside `dir` and falls back to defaults when there is none.
    pub fn discover(dir: &Path) -> Result<Self, AnalysisError> {
        let candidate = dir.join(CONFIG_FILE_NAME);
        if !candidate.is_file() {
            return Ok(Config::default());
        }

        Self::load(&candidate)
    }

    pub fn is_test_file(&self, file_name: &str) -> bool {
        !self.test_file_suffix.is_empty() && file_name.ends_with(&self.test_file_suffix)
    }
}
