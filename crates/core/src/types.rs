use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CoreError;

/// Maximum length of an upload identifier, in characters.
pub const MAX_UPLOAD_ID_LEN: usize = 32;

/// Maximum length of a stored content type, in characters.
pub const MAX_CONTENT_TYPE_LEN: usize = 32;

macro_rules! validated_string {
    ($name:ident, $doc:expr, $validate:path) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
        #[cfg_attr(feature = "openapi", schema(value_type = String))]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(pub(crate) String);

        impl $name {
            /// Validate and wrap a string value.
            pub fn parse(value: impl Into<String>) -> Result<Self, CoreError> {
                let value = value.into();
                $validate(&value)?;
                Ok(Self(value))
            }

            /// Return the inner string as a str slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the wrapper and return the inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl TryFrom<String> for $name {
            type Error = CoreError;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                Self::parse(s)
            }
        }

        impl TryFrom<&str> for $name {
            type Error = CoreError;

            fn try_from(s: &str) -> Result<Self, Self::Error> {
                Self::parse(s)
            }
        }

        impl From<$name> for String {
            fn from(v: $name) -> Self {
                v.0
            }
        }

        impl std::ops::Deref for $name {
            type Target = str;

            fn deref(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

validated_string!(
    UploadId,
    "Identifier of an upload. Doubles as URL path segment and storage key, \
     so it is restricted to 1-32 characters from `[A-Za-z0-9_-]`.",
    validate_upload_id
);
validated_string!(
    ContentType,
    "MIME content type recorded with an upload (1-32 characters).",
    validate_content_type
);

fn validate_upload_id(value: &str) -> Result<(), CoreError> {
    let valid_chars = value
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
    if value.is_empty() || value.len() > MAX_UPLOAD_ID_LEN || !valid_chars {
        return Err(CoreError::InvalidUploadId(value.to_owned()));
    }
    Ok(())
}

fn validate_content_type(value: &str) -> Result<(), CoreError> {
    let len = value.chars().count();
    if len == 0 || len > MAX_CONTENT_TYPE_LEN {
        return Err(CoreError::InvalidContentType(value.to_owned()));
    }
    Ok(())
}

impl ContentType {
    /// Whether the type names an image (`image/*`).
    #[must_use]
    pub fn is_image(&self) -> bool {
        self.0.starts_with("image/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_id_accepts_url_safe_values() {
        let id = UploadId::parse("abc-DEF_123").unwrap();
        assert_eq!(id.as_str(), "abc-DEF_123");
        assert_eq!(&*id, "abc-DEF_123");
        assert!(UploadId::parse("1").is_ok());
        assert!(UploadId::parse("a".repeat(32)).is_ok());
    }

    #[test]
    fn upload_id_rejects_out_of_bound_values() {
        assert_eq!(
            UploadId::parse(""),
            Err(CoreError::InvalidUploadId(String::new()))
        );
        assert!(UploadId::parse("a".repeat(33)).is_err());
        assert!(UploadId::parse("../etc/passwd").is_err());
        assert!(UploadId::parse("has space").is_err());
        assert!(UploadId::parse("slash/inside").is_err());
    }

    #[test]
    fn upload_id_serde_is_transparent_and_validated() {
        let id = UploadId::parse("upload-1").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"upload-1\"");
        let back: UploadId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);

        let bad: Result<UploadId, _> = serde_json::from_str("\"\"");
        assert!(bad.is_err());
    }

    #[test]
    fn content_type_bounds() {
        assert!(ContentType::parse("image/png").is_ok());
        assert!(ContentType::parse("").is_err());
        assert!(ContentType::parse(format!("image/{}", "x".repeat(27))).is_err());
    }

    #[test]
    fn content_type_is_image() {
        assert!(ContentType::parse("image/jpeg").unwrap().is_image());
        assert!(!ContentType::parse("text/plain").unwrap().is_image());
    }
}
