use crate::Error;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Denotes the file type of the saved codebook and states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SerializedType {
    /// Fast, binary format
    Bincode,
    /// Slow, human-readable format
    #[default]
    Yaml,
    /// Everybody's favorite
    Json,
}

impl SerializedType {
    /// The file extension used for this type
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Bincode => "bincode",
            Self::Yaml => "yaml",
            Self::Json => "json",
        }
    }
}

impl FromStr for SerializedType {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bincode" => Ok(Self::Bincode),
            "yaml" | "yml" => Ok(Self::Yaml),
            "json" => Ok(Self::Json),
            _ => Err(Self::Err::SerializedTypeInvalid(String::from(s))),
        }
    }
}

#[derive(PartialEq, Eq, Clone, Debug, Serialize, Deserialize)]
pub struct FileConfig {
    pub metadata_version: i32,
    pub serialized_type: SerializedType,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            metadata_version: crate::METADATA_VERSION,
            serialized_type: SerializedType::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_serialized_types() {
        assert_eq!(
            SerializedType::from_str("YML").unwrap(),
            SerializedType::Yaml
        );
        assert_eq!(
            SerializedType::from_str("json").unwrap(),
            SerializedType::Json
        );
        assert!(SerializedType::from_str("pickle").is_err());
    }

    #[test]
    fn extension_parses_back() {
        for t in [
            SerializedType::Bincode,
            SerializedType::Yaml,
            SerializedType::Json,
        ] {
            assert_eq!(SerializedType::from_str(t.extension()).unwrap(), t);
        }
    }
}
