use crate::allow_list::AllowRange;
use crate::error::ConfigError;
use crate::service::LineEnding;

use common::ErrorLocation;

use std::fmt::{Display, Formatter, Result as FormatResult};
use std::panic::Location;
use std::str::FromStr;

const PARAMS_SEPARATOR: char = ';';
const MAX_PARTS: usize = 3;

/// Compact `port;allow;line_ending` override string. Every part is optional
/// and trailing parts may be left out: `"2850"`, `";10.0.0.0/8"`, `";;crlf"`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceParams {
    pub port: Option<u16>,
    pub allow: Option<String>,
    pub line_ending: Option<LineEnding>,
}

impl ServiceParams {
    pub fn is_empty(&self) -> bool {
        self.port.is_none() && self.allow.is_none() && self.line_ending.is_none()
    }
}

impl FromStr for ServiceParams {
    type Err = ConfigError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let params_error = |reason: String| ConfigError::ParamsError {
            location: ErrorLocation::from(Location::caller()),
            input: input.to_string(),
            reason,
        };

        let parts: Vec<&str> = input.split(PARAMS_SEPARATOR).map(str::trim).collect();
        if parts.len() > MAX_PARTS {
            return Err(params_error(format!(
                "wrong number of parameters: {}, expected at most {MAX_PARTS}",
                parts.len()
            )));
        }

        let mut params = ServiceParams::default();

        if let Some(port) = parts.first().filter(|part| !part.is_empty()) {
            let port = port
                .parse::<u16>()
                .map_err(|e| params_error(format!("unable to parse port '{port}': {e}")))?;
            params.port = Some(port);
        }

        if let Some(allow) = parts.get(1).filter(|part| !part.is_empty()) {
            AllowRange::new(allow).map_err(|e| params_error(e.to_string()))?;
            params.allow = Some(allow.to_string());
        }

        if let Some(line_ending) = parts.get(2).filter(|part| !part.is_empty()) {
            params.line_ending = Some(line_ending.parse::<LineEnding>().map_err(params_error)?);
        }

        Ok(params)
    }
}

impl Display for ServiceParams {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        if let Some(port) = self.port {
            write!(formatter, "{port}")?;
        }
        if self.allow.is_none() && self.line_ending.is_none() {
            return Ok(());
        }

        write!(formatter, "{PARAMS_SEPARATOR}")?;
        if let Some(allow) = &self.allow {
            write!(formatter, "{allow}")?;
        }
        if let Some(line_ending) = self.line_ending {
            write!(formatter, "{PARAMS_SEPARATOR}{line_ending}")?;
        }
        Ok(())
    }
}
