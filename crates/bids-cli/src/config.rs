//! TOML configuration file and its merge with command-line flags.
//!
//! ```toml
//! [paths]
//! dicom_dir = "/data/dicom"
//! bids_dir = "/data/bids"
//! dcm2bids_config = "/data/dcm2bids_config.json"
//! mapping = "/data/mapping.xlsx"
//! session = "01"
//!
//! [tools]
//! dcm2bids = "/opt/venv/bin/dcm2bids"
//!
//! [matching]
//! strategy = "token"
//! reject_ambiguous = true
//! column_order = "anonymized-first"
//!
//! [deface]
//! enabled = true
//! suffix = "_T1w.nii.gz"
//!
//! [physio]
//! extension = ".puls"
//!
//! [logging]
//! level = "info"
//! format = "compact"
//! ```
//!
//! Command-line flags always win over file values.

use std::path::{Path, PathBuf};

use bids_core::{
    ConvertOptions, DEFAULT_PHYSIO_EXTENSION, DEFAULT_T1W_SUFFIX, DefaceOptions, MatchingOptions,
    PhysioOptions, ToolPaths,
};
use bids_model::{ArchiveLayout, ColumnOrder, MatchStrategy};
use serde::Deserialize;
use thiserror::Error;

use crate::logging::{LogFormat, LogLevel};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("missing required setting '{key}' (pass --{flag} or set {key} in the config file)")]
    MissingField {
        key: &'static str,
        flag: &'static str,
    },
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatchConfig {
    pub paths: PathsSection,
    pub tools: ToolsSection,
    pub matching: MatchingSection,
    pub deface: DefaceSection,
    pub physio: PhysioSection,
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsSection {
    pub dicom_dir: Option<PathBuf>,
    pub bids_dir: Option<PathBuf>,
    pub dcm2bids_config: Option<PathBuf>,
    pub mapping: Option<PathBuf>,
    pub session: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolsSection {
    pub dcm2bids: Option<PathBuf>,
    pub pydeface: Option<PathBuf>,
    pub physio: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MatchingSection {
    pub strategy: Option<MatchStrategy>,
    pub reject_ambiguous: Option<bool>,
    /// Column layout of the mapping table in the convert pass.
    pub column_order: Option<ColumnOrder>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DefaceSection {
    pub enabled: Option<bool>,
    pub suffix: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PhysioSection {
    pub extension: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSection {
    pub level: Option<LogLevel>,
    pub format: Option<LogFormat>,
    /// Replaces the per-pass default log file.
    pub file: Option<PathBuf>,
}

/// Path values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct PathOverrides {
    pub dicom_dir: Option<PathBuf>,
    pub bids_dir: Option<PathBuf>,
    pub dcm2bids_config: Option<PathBuf>,
    pub mapping: Option<PathBuf>,
    pub session: Option<String>,
}

/// Matching values given on the command line. Flags can only switch
/// rejection on.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchingOverrides {
    pub strategy: Option<MatchStrategy>,
    pub reject_ambiguous: bool,
    pub column_order: Option<ColumnOrder>,
}

impl BatchConfig {
    /// Read and parse a config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML
    /// for this schema.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `path` if given, otherwise start from an empty configuration.
    ///
    /// # Errors
    ///
    /// See [`BatchConfig::load`].
    pub fn load_optional(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Resolve the inputs of the convert pass.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] for the first required path or
    /// the session label that neither the flags nor the file provide.
    pub fn convert_options(
        &self,
        paths: &PathOverrides,
        matching: MatchingOverrides,
        no_deface: bool,
    ) -> Result<ConvertOptions, ConfigError> {
        let dicom_dir = self.dicom_dir(paths)?;
        let layout = self.layout(paths)?;
        let dcm2bids_config = required(
            paths.dcm2bids_config.as_ref().or(self.paths.dcm2bids_config.as_ref()),
            "paths.dcm2bids_config",
            "dcm2bids-config",
        )?;
        let mapping_file = self.mapping_file(paths)?;

        let mut options = ConvertOptions::new(dicom_dir, layout, dcm2bids_config, mapping_file);
        options.column_order = self.column_order(matching);
        options.matching = self.matching_options(matching);
        options.deface = DefaceOptions {
            enabled: !no_deface && self.deface.enabled.unwrap_or(true),
            suffix: self
                .deface
                .suffix
                .clone()
                .unwrap_or_else(|| DEFAULT_T1W_SUFFIX.to_string()),
        };
        options.physio_extension = self.physio_extension();
        options.tools = self.tool_paths();
        Ok(options)
    }

    /// Resolve the inputs of the physio pass.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] like
    /// [`BatchConfig::convert_options`]; the dcm2bids config is not needed.
    pub fn physio_options(
        &self,
        paths: &PathOverrides,
        matching: MatchingOverrides,
    ) -> Result<PhysioOptions, ConfigError> {
        let mut options = PhysioOptions::new(
            self.dicom_dir(paths)?,
            self.layout(paths)?,
            self.mapping_file(paths)?,
        );
        options.matching = self.matching_options(matching);
        options.extension = self.physio_extension();
        options.tools = self.tool_paths();
        Ok(options)
    }

    /// Resolve the mapping table path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] if no mapping path is set.
    pub fn mapping_file(&self, paths: &PathOverrides) -> Result<PathBuf, ConfigError> {
        required(
            paths.mapping.as_ref().or(self.paths.mapping.as_ref()),
            "paths.mapping",
            "mapping",
        )
    }

    /// Column layout for positional loading, flags first.
    pub fn column_order(&self, matching: MatchingOverrides) -> ColumnOrder {
        matching
            .column_order
            .or(self.matching.column_order)
            .unwrap_or_default()
    }

    fn dicom_dir(&self, paths: &PathOverrides) -> Result<PathBuf, ConfigError> {
        required(
            paths.dicom_dir.as_ref().or(self.paths.dicom_dir.as_ref()),
            "paths.dicom_dir",
            "dicom-dir",
        )
    }

    fn layout(&self, paths: &PathOverrides) -> Result<ArchiveLayout, ConfigError> {
        let bids_dir = required(
            paths.bids_dir.as_ref().or(self.paths.bids_dir.as_ref()),
            "paths.bids_dir",
            "bids-dir",
        )?;
        let session = paths
            .session
            .as_deref()
            .or(self.paths.session.as_deref())
            .map(str::trim)
            .filter(|session| !session.is_empty())
            .ok_or(ConfigError::MissingField {
                key: "paths.session",
                flag: "session",
            })?;
        Ok(ArchiveLayout::new(bids_dir, session))
    }

    fn matching_options(&self, matching: MatchingOverrides) -> MatchingOptions {
        MatchingOptions {
            strategy: matching
                .strategy
                .or(self.matching.strategy)
                .unwrap_or_default(),
            reject_ambiguous: matching.reject_ambiguous
                || self.matching.reject_ambiguous.unwrap_or(false),
        }
    }

    fn physio_extension(&self) -> String {
        self.physio
            .extension
            .clone()
            .unwrap_or_else(|| DEFAULT_PHYSIO_EXTENSION.to_string())
    }

    fn tool_paths(&self) -> ToolPaths {
        let defaults = ToolPaths::default();
        ToolPaths {
            dcm2bids: self.tools.dcm2bids.clone().unwrap_or(defaults.dcm2bids),
            pydeface: self.tools.pydeface.clone().unwrap_or(defaults.pydeface),
            physio: self.tools.physio.clone().unwrap_or(defaults.physio),
        }
    }
}

fn required(
    value: Option<&PathBuf>,
    key: &'static str,
    flag: &'static str,
) -> Result<PathBuf, ConfigError> {
    value
        .cloned()
        .ok_or(ConfigError::MissingField { key, flag })
}
