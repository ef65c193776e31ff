use common::ErrorLocation;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum AllowListError {
    #[error("Allow List Parse Error: '{entry}': {reason} {location}")]
    Parse {
        entry: String,
        reason: String,
        location: ErrorLocation,
    },
}
