//! Configuration type definitions

use core::fmt;

use cta2045_hal::UartConfig;
use cta2045_protocol::{MaxPayload, MAX_LENGTH};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Max payload class larger than the frames this build can hold
    PayloadClassTooLarge(MaxPayload),
    /// Document is not valid TOML for this schema
    Parse,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::PayloadClassTooLarge(class) => write!(
                f,
                "max payload class {:?} exceeds {} bytes",
                class, MAX_LENGTH
            ),
            ConfigError::Parse => write!(f, "invalid configuration document"),
        }
    }
}

impl core::error::Error for ConfigError {}

/// Settings for one CTA-2045 session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SessionConfig {
    /// Announced in max payload responses and used as the LENGTH ceiling
    pub max_payload: MaxPayload,
    /// Serial port settings, applied by the board bring-up
    pub uart: UartConfig,
}

impl SessionConfig {
    /// Check the configuration against compiled limits
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_payload.bytes() > MAX_LENGTH {
            return Err(ConfigError::PayloadClassTooLarge(self.max_payload));
        }
        Ok(())
    }

    /// Parse and validate a TOML document
    ///
    /// ```toml
    /// max_payload = "Bytes128"
    ///
    /// [uart]
    /// baudrate = 19200
    /// ```
    #[cfg(feature = "toml")]
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|_| ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SessionConfig::default();
        assert_eq!(config.max_payload, MaxPayload::Bytes256);
        assert_eq!(config.uart.baudrate, 115200);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_small_class_is_valid() {
        let config = SessionConfig {
            max_payload: MaxPayload::Bytes2,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_class_above_ceiling_is_rejected() {
        let config = SessionConfig {
            max_payload: MaxPayload::Bytes512,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::PayloadClassTooLarge(MaxPayload::Bytes512))
        );
    }

    #[cfg(feature = "toml")]
    #[test]
    fn test_from_toml() {
        let config = SessionConfig::from_toml(
            r#"
            max_payload = "Bytes128"

            [uart]
            baudrate = 19200
            "#,
        )
        .unwrap();

        assert_eq!(config.max_payload, MaxPayload::Bytes128);
        assert_eq!(config.uart.baudrate, 19200);
        assert_eq!(config.uart, UartConfig { baudrate: 19200, ..Default::default() });
    }

    #[cfg(feature = "toml")]
    #[test]
    fn test_from_toml_empty_document_uses_defaults() {
        assert_eq!(SessionConfig::from_toml(""), Ok(SessionConfig::default()));
    }

    #[cfg(feature = "toml")]
    #[test]
    fn test_from_toml_rejects_bad_input() {
        assert_eq!(
            SessionConfig::from_toml("max_payload = \"Bytes4096\""),
            Err(ConfigError::PayloadClassTooLarge(MaxPayload::Bytes4096))
        );
        assert_eq!(
            SessionConfig::from_toml("max_payload = 7"),
            Err(ConfigError::Parse)
        );
    }
}
