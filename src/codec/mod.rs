//! Codec Module
//!
//! Turns caller values into byte payloads and payloads back into typed values.
//!
//! Encoding picks the first matching path, in this order:
//! 1. custom binary encoding ([`BinaryEncode`])
//! 2. text, stored as its UTF-8 bytes
//! 3. raw bytes, stored unchanged
//! 4. JSON via serde
//!
//! Nil values are rejected before any path is tried. Payloads are stored as-is,
//! without compression or framing.

mod value;


use std::borrow::Cow;

use serde::de::DeserializeOwned;

use crate::error::{CacheError, Result};

pub use value::{Binary, BinaryEncode, CacheValue, Json, StructuredEncode};

// == Encode Path ==
/// Which encoding path produced a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodePath {
    Binary,
    Text,
    Bytes,
    Structured,
}

// == Encoded Payload ==
/// Bytes ready to be handed to a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedPayload<'a> {
    bytes: Cow<'a, [u8]>,
    path: EncodePath,
}

impl<'a> EncodedPayload<'a> {
    pub fn path(&self) -> EncodePath {
        self.path
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes.into_owned()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

// == Encode ==
/// Encodes a value for storage.
///
/// Text and byte values are borrowed, not copied.
///
/// # Errors
/// - `NilValue` if the value is nil
/// - `SerializeValue` if the chosen encoder fails or the value exposes no
///   encoding capability at all
pub fn encode<V: CacheValue + ?Sized>(value: &V) -> Result<EncodedPayload<'_>> {
    if value.is_nil() {
        return Err(CacheError::NilValue);
    }

    if let Some(binary) = value.as_binary() {
        let bytes = binary.to_binary().map_err(CacheError::serialize)?;
        return Ok(EncodedPayload {
            bytes: Cow::Owned(bytes),
            path: EncodePath::Binary,
        });
    }

    if let Some(text) = value.as_text() {
        return Ok(EncodedPayload {
            bytes: Cow::Borrowed(text.as_bytes()),
            path: EncodePath::Text,
        });
    }

    if let Some(bytes) = CacheValue::as_bytes(value) {
        return Ok(EncodedPayload {
            bytes: Cow::Borrowed(bytes),
            path: EncodePath::Bytes,
        });
    }

    if let Some(structured) = value.as_structured() {
        let bytes = structured.to_json().map_err(CacheError::serialize)?;
        return Ok(EncodedPayload {
            bytes: Cow::Owned(bytes),
            path: EncodePath::Structured,
        });
    }

    Err(CacheError::serialize("value exposes no encoding capability"))
}

// == Decode ==
/// Decodes a payload stored under `key` into `T`.
///
/// The payload is parsed as JSON first. If that fails and the payload is
/// UTF-8 text, it is offered to `T` as a plain string, so values stored through
/// the text path decode into `String` unchanged. Text that is itself a JSON
/// string literal decodes to the literal's contents. On failure the JSON error
/// is reported as `Decode` with the key attached.
pub fn decode<T: DeserializeOwned>(key: &str, payload: &[u8]) -> Result<T> {
    match serde_json::from_slice(payload) {
        Ok(value) => Ok(value),
        Err(json_err) => std::str::from_utf8(payload)
            .ok()
            .and_then(|text| serde_json::from_value(serde_json::Value::String(text.to_owned())).ok())
            .ok_or_else(|| CacheError::decode(key, json_err)),
    }
}

/// Reads a payload as text, failing with `Decode` if it is not valid UTF-8.
pub fn decode_text(key: &str, payload: Vec<u8>) -> Result<String> {
    String::from_utf8(payload).map_err(|err| CacheError::decode(key, err))
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{BoxError, ErrorKind};
    use serde::{Deserialize, Serialize};
    use std::collections::HashMap;
    use std::sync::Arc;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct User {
        name: String,
    }

    impl CacheValue for User {
        fn as_structured(&self) -> Option<&dyn StructuredEncode> {
            Some(self)
        }
    }

    struct BinaryVal {
        data: String,
    }

    impl BinaryEncode for BinaryVal {
        fn to_binary(&self) -> std::result::Result<Vec<u8>, BoxError> {
            Ok(format!("bin:{}", self.data).into_bytes())
        }
    }

    struct BadBinary;

    impl BinaryEncode for BadBinary {
        fn to_binary(&self) -> std::result::Result<Vec<u8>, BoxError> {
            Err("custom binary marshal error".into())
        }
    }

    /// Exposes both binary and structured encodings.
    #[derive(Serialize)]
    struct Versioned {
        version: u32,
    }

    impl BinaryEncode for Versioned {
        fn to_binary(&self) -> std::result::Result<Vec<u8>, BoxError> {
            Ok(self.version.to_be_bytes().to_vec())
        }
    }

    impl CacheValue for Versioned {
        fn as_binary(&self) -> Option<&dyn BinaryEncode> {
            Some(self)
        }

        fn as_structured(&self) -> Option<&dyn StructuredEncode> {
            Some(self)
        }
    }

    /// Text and structured at once; text must win.
    #[derive(Serialize)]
    struct Label(String);

    impl CacheValue for Label {
        fn as_text(&self) -> Option<&str> {
            Some(&self.0)
        }

        fn as_structured(&self) -> Option<&dyn StructuredEncode> {
            Some(self)
        }
    }

    struct Opaque;

    impl CacheValue for Opaque {}

    #[test]
    fn test_encode_text_is_identity() {
        let payload = encode("hello").unwrap();
        assert_eq!(payload.path(), EncodePath::Text);
        assert_eq!(payload.as_bytes(), b"hello");

        let owned = String::from("hello");
        assert_eq!(encode(&owned).unwrap().as_bytes(), b"hello");
    }

    #[test]
    fn test_encode_bytes_is_identity() {
        let raw = br#"{"name":"daniel"}"#.to_vec();
        let payload = encode(&raw).unwrap();

        assert_eq!(payload.path(), EncodePath::Bytes);
        assert_eq!(payload.as_bytes(), raw.as_slice());
    }

    #[test]
    fn test_encode_structured_fallback() {
        let payload = encode(&5i32).unwrap();
        assert_eq!(payload.path(), EncodePath::Structured);
        assert_eq!(payload.as_bytes(), b"5");

        let user = User {
            name: "daniel".to_string(),
        };
        assert_eq!(encode(&user).unwrap().as_bytes(), br#"{"name":"daniel"}"#);
        assert_eq!(
            encode(&Json(vec![1, 2, 3])).unwrap().as_bytes(),
            b"[1,2,3]"
        );
    }

    #[test]
    fn test_encode_binary_capability() {
        let value = Binary(BinaryVal {
            data: "hello".to_string(),
        });
        let payload = encode(&value).unwrap();

        assert_eq!(payload.path(), EncodePath::Binary);
        assert_eq!(payload.as_bytes(), b"bin:hello");
    }

    #[test]
    fn test_encode_binary_failure_is_serialize_error() {
        let err = encode(&Binary(BadBinary)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SerializeValue);
        assert!(err.to_string().contains("custom binary marshal error"));
    }

    #[test]
    fn test_binary_wins_over_structured() {
        let payload = encode(&Versioned { version: 7 }).unwrap();
        assert_eq!(payload.path(), EncodePath::Binary);
        assert_eq!(payload.as_bytes(), &[0u8, 0, 0, 7]);
    }

    #[test]
    fn test_text_wins_over_structured() {
        let value = Label("plain".to_string());
        let payload = encode(&value).unwrap();
        assert_eq!(payload.path(), EncodePath::Text);
        assert_eq!(payload.as_bytes(), b"plain");
    }

    #[test]
    fn test_encode_nil_values() {
        assert_eq!(encode(&None::<String>).unwrap_err().kind(), ErrorKind::NilValue);
        assert_eq!(encode(&None::<User>).unwrap_err().kind(), ErrorKind::NilValue);
        assert_eq!(
            encode(&serde_json::Value::Null).unwrap_err().kind(),
            ErrorKind::NilValue
        );
        assert_eq!(
            encode(&Some(None::<Vec<u8>>)).unwrap_err().kind(),
            ErrorKind::NilValue
        );
    }

    #[test]
    fn test_encode_through_containers() {
        let some = Some("hello");
        assert_eq!(encode(&some).unwrap().as_bytes(), b"hello");

        let boxed: Box<str> = "boxed".into();
        assert_eq!(encode(&boxed).unwrap().path(), EncodePath::Text);

        let shared = Arc::new(User {
            name: "ann".to_string(),
        });
        assert_eq!(encode(&shared).unwrap().path(), EncodePath::Structured);
    }

    #[test]
    fn test_encode_without_capability() {
        let err = encode(&Opaque).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SerializeValue);
    }

    #[test]
    fn test_encode_structured_failure() {
        // JSON object keys must be strings
        let mut grid = HashMap::new();
        grid.insert((0, 1), "cell");

        let err = encode(&Json(grid)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SerializeValue);
    }

    #[test]
    fn test_decode_struct() {
        let user: User = decode("user:1", br#"{"name":"daniel"}"#).unwrap();
        assert_eq!(user.name, "daniel");
    }

    #[test]
    fn test_decode_plain_text_into_string() {
        let text: String = decode("greeting", b"hello").unwrap();
        assert_eq!(text, "hello");
    }

    #[test]
    fn test_decode_text_with_quotes() {
        let text: String = decode("q", br#"say "hi""#).unwrap();
        assert_eq!(text, r#"say "hi""#);

        // A whole JSON string literal decodes to its contents.
        let text: String = decode("q", br#""quoted""#).unwrap();
        assert_eq!(text, "quoted");
    }

    #[test]
    fn test_decode_mismatch_carries_key() {
        let err = decode::<User>("test:string", b"hello").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
        assert_eq!(err.key(), Some("test:string"));
    }

    #[test]
    fn test_decode_invalid_utf8() {
        let err = decode::<String>("blob", &[0xff, 0xfe]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);

        let err = decode_text("blob", vec![0xff]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }
}
