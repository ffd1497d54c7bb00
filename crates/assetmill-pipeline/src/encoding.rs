use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use crate::error::{PipelineError, PipelineResult};

/// Text encoding used when source content is treated as text.
///
/// Streams piped straight into a byte sink are copied untouched; the
/// encoding only matters where bytes become text or text becomes bytes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TextEncoding {
    #[default]
    Utf8,
    /// ISO-8859-1: every byte is the code point of the same value.
    Latin1,
}

impl TextEncoding {
    pub fn name(self) -> &'static str {
        match self {
            Self::Utf8 => "utf8",
            Self::Latin1 => "latin1",
        }
    }

    pub fn decode(self, bytes: Vec<u8>) -> PipelineResult<String> {
        match self {
            Self::Utf8 => String::from_utf8(bytes).map_err(|e| PipelineError::Encoding {
                encoding: self.name(),
                message: e.to_string(),
            }),
            Self::Latin1 => Ok(bytes.into_iter().map(char::from).collect()),
        }
    }

    pub fn encode(self, text: &str) -> PipelineResult<Cow<'_, [u8]>> {
        match self {
            Self::Utf8 => Ok(Cow::Borrowed(text.as_bytes())),
            Self::Latin1 => text
                .chars()
                .map(|c| {
                    u8::try_from(u32::from(c)).map_err(|_| PipelineError::Encoding {
                        encoding: self.name(),
                        message: format!("character {c:?} is outside latin1"),
                    })
                })
                .collect::<PipelineResult<Vec<u8>>>()
                .map(Cow::Owned),
        }
    }
}

impl FromStr for TextEncoding {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "utf8" | "utf-8" => Ok(Self::Utf8),
            "latin1" | "binary" | "iso-8859-1" => Ok(Self::Latin1),
            other => Err(PipelineError::Configuration(format!(
                "unsupported text encoding '{other}'"
            ))),
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_names() {
        assert_eq!("utf8".parse::<TextEncoding>().unwrap(), TextEncoding::Utf8);
        assert_eq!("UTF-8".parse::<TextEncoding>().unwrap(), TextEncoding::Utf8);
        assert_eq!("binary".parse::<TextEncoding>().unwrap(), TextEncoding::Latin1);
        assert!(matches!(
            "ebcdic".parse::<TextEncoding>(),
            Err(PipelineError::Configuration(_))
        ));
    }

    #[test]
    fn latin1_maps_bytes_to_code_points() {
        let text = TextEncoding::Latin1.decode(vec![0x63, 0x61, 0x66, 0xe9]).unwrap();
        assert_eq!(text, "café");
        assert_eq!(
            TextEncoding::Latin1.encode("café").unwrap().as_ref(),
            &[0x63, 0x61, 0x66, 0xe9]
        );
        assert!(TextEncoding::Latin1.encode("€").is_err());
    }

    #[test]
    fn invalid_utf8_is_an_encoding_error() {
        let err = TextEncoding::Utf8.decode(vec![0xff, 0xfe]).unwrap_err();
        assert!(matches!(err, PipelineError::Encoding { encoding: "utf8", .. }));
    }
}
