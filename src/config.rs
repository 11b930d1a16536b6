// Command line and environment configuration.
//
// Flags are parsed once by clap and resolved into immutable config values
// that the report and validation operations take by reference.

use std::path::PathBuf;

use clap::Args;

use crate::error::ReportError;

pub const DEFAULT_DAYS_BACK: i64 = 30;
pub const DEFAULT_OUTPUT_FILE: &str = "user_usage_report.csv";
pub const DEFAULT_IDENTITY_DIMENSION: &str = "customUser:user_identity";
pub const DEFAULT_TOP_N: usize = 20;
pub const DEFAULT_SKILLS_ROOT: &str = ".claude/skills";

#[derive(Args, Debug, Clone)]
pub struct ReportArgs {
    /// GA4 property id, either `123456789` or `properties/123456789`
    #[arg(long, env = "GA4_PROPERTY_ID")]
    pub property_id: Option<String>,

    /// Size of the trailing window in days
    #[arg(long, env = "GA4_DAYS_BACK", default_value_t = DEFAULT_DAYS_BACK, allow_negative_numbers = true)]
    pub days_back: i64,

    /// CSV file to write the full report to
    #[arg(long, env = "GA4_OUTPUT_FILE", default_value = DEFAULT_OUTPUT_FILE)]
    pub out: PathBuf,

    /// Print the summary only, do not write a CSV file
    #[arg(long)]
    pub no_csv: bool,

    /// Custom dimension holding `<user id>|<display name>`
    #[arg(long, env = "GA4_IDENTITY_DIMENSION", default_value = DEFAULT_IDENTITY_DIMENSION)]
    pub identity_dimension: String,

    /// Number of records shown in the console table
    #[arg(long, default_value_t = DEFAULT_TOP_N)]
    pub top: usize,
}

#[derive(Args, Debug, Clone)]
pub struct ValidateArgs {
    /// Directory holding one subdirectory per skill
    #[arg(long, default_value = DEFAULT_SKILLS_ROOT)]
    pub root: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportConfig {
    pub property_id: String,
    pub days_back: i64,
    pub output_path: Option<PathBuf>,
    pub identity_dimension: String,
    pub top_n: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidateConfig {
    pub root: PathBuf,
}

impl ReportConfig {
    #[cfg(test)]
    pub fn new(property_id: impl Into<String>) -> Self {
        Self {
            property_id: property_id.into(),
            days_back: DEFAULT_DAYS_BACK,
            output_path: None,
            identity_dimension: DEFAULT_IDENTITY_DIMENSION.to_string(),
            top_n: DEFAULT_TOP_N,
        }
    }

    /// Rejects a missing or blank property id before anything touches the network.
    pub fn validate(&self) -> Result<(), ReportError> {
        if self.property_id.trim().is_empty() {
            return Err(ReportError::Configuration(
                "GA4_PROPERTY_ID is not set; pass --property-id or export GA4_PROPERTY_ID"
                    .to_string(),
            ));
        }
        Ok(())
    }

    /// Resource name in the form the Data API expects.
    pub fn property_resource(&self) -> String {
        let id = self.property_id.trim();
        if id.starts_with("properties/") {
            id.to_string()
        } else {
            format!("properties/{id}")
        }
    }
}

impl TryFrom<ReportArgs> for ReportConfig {
    type Error = ReportError;

    fn try_from(args: ReportArgs) -> Result<Self, Self::Error> {
        let config = ReportConfig {
            property_id: args.property_id.unwrap_or_default(),
            days_back: args.days_back,
            output_path: (!args.no_csv).then_some(args.out),
            identity_dimension: args.identity_dimension,
            top_n: args.top,
        };
        config.validate()?;
        Ok(config)
    }
}

impl From<ValidateArgs> for ValidateConfig {
    fn from(args: ValidateArgs) -> Self {
        ValidateConfig { root: args.root }
    }
}
