//! INI configuration for the client builder.
//!
//! One section supplies the same named options accepted by
//! [`ClientBuilder::with_option`], for example:
//!
//! ```ini
//! [collector]
//! host = logs.internal
//! port = 5140
//! max_retries = 5
//! retry_delay = 0.5
//! shared_secret = changeme
//! ```

use std::{fs, io::ErrorKind, path::Path};

use ini::{Ini, Properties};

use crate::{client::ClientBuilder, error::ClientError};

impl ClientBuilder {
    /// Load options from `section` of the INI file at `path`.
    ///
    /// `None` selects the keys that precede any section header.
    pub fn from_ini_file(
        path: impl AsRef<Path>,
        section: Option<&str>,
    ) -> Result<Self, ClientError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|err| match err.kind() {
            ErrorKind::NotFound => {
                ClientError::config(format!("{} doesn't exist", path.display()))
            }
            _ => ClientError::config(format!("failed to read {}: {err}", path.display())),
        })?;
        Self::from_ini_str(&text, section)
    }

    /// Load options from `section` of INI-formatted `text`.
    pub fn from_ini_str(text: &str, section: Option<&str>) -> Result<Self, ClientError> {
        let ini = Ini::load_from_str(text)
            .map_err(|err| ClientError::config(format!("invalid ini: {err}")))?;
        let properties = ini.section(section).ok_or_else(|| {
            ClientError::config(format!(
                "missing section {}",
                section.unwrap_or("<general>")
            ))
        })?;
        apply_properties(Self::new(), properties)
    }
}

fn apply_properties(
    builder: ClientBuilder,
    properties: &Properties,
) -> Result<ClientBuilder, ClientError> {
    properties
        .iter()
        .try_fold(builder, |builder, (key, value)| builder.with_option(key, value))
}
