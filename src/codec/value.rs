//! Cache Value Module
//!
//! Capability traits describing how a caller value can be turned into bytes.

use std::borrow::Cow;
use std::sync::Arc;

use serde::Serialize;

use crate::error::BoxError;

// == Binary Encoding Capability ==
/// Custom binary encoding, preferred over every other encoding path.
pub trait BinaryEncode {
    fn to_binary(&self) -> Result<Vec<u8>, BoxError>;
}

// == Structured Encoding Capability ==
/// Object-safe view of a serde-serializable value.
pub trait StructuredEncode {
    fn to_json(&self) -> serde_json::Result<Vec<u8>>;
}

impl<T: Serialize + ?Sized> StructuredEncode for T {
    fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

// == Cache Value ==
/// A value that can be stored in the cache.
///
/// Each method probes one encoding capability. The codec asks them in a fixed
/// order (nil, binary, text, bytes, structured) and uses the first that
/// answers, so a type may expose several capabilities safely.
///
/// ```
/// use cachekit::codec::{encode, CacheValue, EncodePath, StructuredEncode};
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct User {
///     name: String,
/// }
///
/// impl CacheValue for User {
///     fn as_structured(&self) -> Option<&dyn StructuredEncode> {
///         Some(self)
///     }
/// }
///
/// let user = User { name: "daniel".into() };
/// let payload = encode(&user).unwrap();
/// assert_eq!(payload.path(), EncodePath::Structured);
/// assert_eq!(payload.as_bytes(), br#"{"name":"daniel"}"#);
/// ```
pub trait CacheValue {
    /// True for values that represent "nothing" and must never be stored.
    fn is_nil(&self) -> bool {
        false
    }

    fn as_binary(&self) -> Option<&dyn BinaryEncode> {
        None
    }

    fn as_text(&self) -> Option<&str> {
        None
    }

    fn as_bytes(&self) -> Option<&[u8]> {
        None
    }

    fn as_structured(&self) -> Option<&dyn StructuredEncode> {
        None
    }
}

// == Wrappers ==
/// Stores the inner value as JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Json<T>(pub T);

impl<T: Serialize> CacheValue for Json<T> {
    fn as_structured(&self) -> Option<&dyn StructuredEncode> {
        Some(&self.0)
    }
}

/// Stores the inner value through its [`BinaryEncode`] implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binary<T>(pub T);

impl<T: BinaryEncode> CacheValue for Binary<T> {
    fn as_binary(&self) -> Option<&dyn BinaryEncode> {
        Some(&self.0)
    }
}

// == Text ==
impl CacheValue for str {
    fn as_text(&self) -> Option<&str> {
        Some(self)
    }
}

impl CacheValue for String {
    fn as_text(&self) -> Option<&str> {
        Some(self.as_str())
    }
}

impl CacheValue for Cow<'_, str> {
    fn as_text(&self) -> Option<&str> {
        Some(self.as_ref())
    }
}

// == Bytes ==
impl CacheValue for [u8] {
    fn as_bytes(&self) -> Option<&[u8]> {
        Some(self)
    }
}

impl CacheValue for Vec<u8> {
    fn as_bytes(&self) -> Option<&[u8]> {
        Some(self.as_slice())
    }
}

impl<const N: usize> CacheValue for [u8; N] {
    fn as_bytes(&self) -> Option<&[u8]> {
        Some(self.as_slice())
    }
}

// == Structured Primitives ==
macro_rules! structured_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl CacheValue for $ty {
                fn as_structured(&self) -> Option<&dyn StructuredEncode> {
                    Some(self)
                }
            }
        )*
    };
}

structured_value!(bool, char, u8, i8, i16, i32, i64, i128, isize, u16, u32, u64, u128, usize, f32, f64);

impl CacheValue for serde_json::Value {
    fn is_nil(&self) -> bool {
        self.is_null()
    }

    fn as_structured(&self) -> Option<&dyn StructuredEncode> {
        Some(self)
    }
}

// == Containers ==
impl<T: CacheValue> CacheValue for Option<T> {
    fn is_nil(&self) -> bool {
        self.as_ref().map_or(true, CacheValue::is_nil)
    }

    fn as_binary(&self) -> Option<&dyn BinaryEncode> {
        self.as_ref().and_then(CacheValue::as_binary)
    }

    fn as_text(&self) -> Option<&str> {
        self.as_ref().and_then(CacheValue::as_text)
    }

    fn as_bytes(&self) -> Option<&[u8]> {
        self.as_ref().and_then(CacheValue::as_bytes)
    }

    fn as_structured(&self) -> Option<&dyn StructuredEncode> {
        self.as_ref().and_then(CacheValue::as_structured)
    }
}

macro_rules! delegate_value {
    ($($ptr:ident),*) => {
        $(
            impl<T: CacheValue + ?Sized> CacheValue for $ptr<T> {
                fn is_nil(&self) -> bool {
                    (**self).is_nil()
                }

                fn as_binary(&self) -> Option<&dyn BinaryEncode> {
                    (**self).as_binary()
                }

                fn as_text(&self) -> Option<&str> {
                    (**self).as_text()
                }

                fn as_bytes(&self) -> Option<&[u8]> {
                    (**self).as_bytes()
                }

                fn as_structured(&self) -> Option<&dyn StructuredEncode> {
                    (**self).as_structured()
                }
            }
        )*
    };
}

delegate_value!(Box, Arc);

impl<T: CacheValue + ?Sized> CacheValue for &T {
    fn is_nil(&self) -> bool {
        (**self).is_nil()
    }

    fn as_binary(&self) -> Option<&dyn BinaryEncode> {
        (**self).as_binary()
    }

    fn as_text(&self) -> Option<&str> {
        (**self).as_text()
    }

    fn as_bytes(&self) -> Option<&[u8]> {
        (**self).as_bytes()
    }

    fn as_structured(&self) -> Option<&dyn StructuredEncode> {
        (**self).as_structured()
    }
}
