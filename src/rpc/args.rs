//! Positional argument codec.
//!
//! Rebuilds a strongly-typed argument tuple from the weakly-typed JSON
//! argument array of a call envelope. Position `i` of the array feeds slot
//! `i` of the tuple. Decoding is permissive: a missing position or a value
//! that does not convert to the slot's type yields `Default::default()` for
//! that slot, never an error. Remote callers rely on partial-argument calls
//! succeeding.
//!
//! | Slot type                 | Accepted JSON                  | Otherwise |
//! |---------------------------|--------------------------------|-----------|
//! | `i8`..`i64`, `u8`..`u64`  | number in range (floats truncate) | `0`    |
//! | `f32`, `f64`              | any number                     | `0.0`     |
//! | `bool`                    | bool, number (non-zero = true) | `false`   |
//! | `String`, `heapless::String<N>` | string (fitting capacity) | empty   |
//! | `Option<T>`               | `null` → `None`, else `T`      | `None`    |
//! | `Vec<T>`                  | array, element-wise            | empty     |
//! | `serde_json::Value`       | anything                       | `null`    |

use serde::Serialize;
use serde_json::Value;

/// Conversion of one JSON value into an argument slot.
pub trait FromArg: Sized + Default {
    /// Strict conversion; `None` when the value does not fit the type.
    fn from_arg(value: &Value) -> Option<Self>;

    /// Permissive conversion used for argument slots.
    fn decode(value: Option<&Value>) -> Self {
        value.and_then(Self::from_arg).unwrap_or_default()
    }
}

macro_rules! impl_from_arg_int {
    ($($t:ty),*) => {
        $(
            impl FromArg for $t {
                fn from_arg(value: &Value) -> Option<Self> {
                    let Value::Number(n) = value else {
                        return None;
                    };
                    if let Some(i) = n.as_i64() {
                        return <$t>::try_from(i).ok();
                    }
                    if let Some(u) = n.as_u64() {
                        return <$t>::try_from(u).ok();
                    }
                    let f = n.as_f64()?;
                    let in_range = f > (<$t>::MIN as f64) - 1.0 && f < (<$t>::MAX as f64) + 1.0;
                    in_range.then(|| f as $t)
                }
            }
        )*
    };
}

impl_from_arg_int!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl FromArg for f64 {
    fn from_arg(value: &Value) -> Option<Self> {
        value.as_f64()
    }
}

impl FromArg for f32 {
    fn from_arg(value: &Value) -> Option<Self> {
        value.as_f64().map(|f| f as f32)
    }
}

impl FromArg for bool {
    fn from_arg(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => n.as_f64().map(|f| f != 0.0),
            _ => None,
        }
    }
}

impl FromArg for String {
    fn from_arg(value: &Value) -> Option<Self> {
        value.as_str().map(str::to_owned)
    }
}

impl<const N: usize> FromArg for heapless::String<N> {
    fn from_arg(value: &Value) -> Option<Self> {
        let mut s = heapless::String::new();
        s.push_str(value.as_str()?).ok()?;
        Some(s)
    }
}

impl<T: FromArg> FromArg for Option<T> {
    fn from_arg(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(None),
            other => T::from_arg(other).map(Some),
        }
    }
}

impl<T: FromArg> FromArg for Vec<T> {
    fn from_arg(value: &Value) -> Option<Self> {
        let items = value.as_array()?;
        Some(items.iter().map(|v| T::decode(Some(v))).collect())
    }
}

impl FromArg for Value {
    fn from_arg(value: &Value) -> Option<Self> {
        Some(value.clone())
    }
}

// ---------------------------------------------------------------------------
// Tuples
// ---------------------------------------------------------------------------

/// A tuple of argument slots decodable from a positional JSON array.
pub trait ArgTuple: Sized {
    /// Number of slots.
    const ARITY: usize;

    /// Decode exactly `ARITY` positions, independently of each other.
    fn decode(args: &[Value]) -> Self;
}

macro_rules! impl_arg_tuple {
    ($arity:expr; $($idx:tt $arg:ident),*) => {
        impl<$($arg: FromArg),*> ArgTuple for ($($arg,)*) {
            const ARITY: usize = $arity;

            #[allow(unused_variables, clippy::unused_unit)]
            fn decode(args: &[Value]) -> Self {
                ($(<$arg as FromArg>::decode(args.get($idx)),)*)
            }
        }
    };
}

impl_arg_tuple!(0;);
impl_arg_tuple!(1; 0 A1);
impl_arg_tuple!(2; 0 A1, 1 A2);
impl_arg_tuple!(3; 0 A1, 1 A2, 2 A3);
impl_arg_tuple!(4; 0 A1, 1 A2, 2 A3, 3 A4);
impl_arg_tuple!(5; 0 A1, 1 A2, 2 A3, 3 A4, 4 A5);
impl_arg_tuple!(6; 0 A1, 1 A2, 2 A3, 3 A4, 4 A5, 5 A6);

/// Decode an argument tuple from an envelope's `"a"` value.
/// Anything other than an array decodes as if no arguments were sent.
pub fn decode_args<T: ArgTuple>(args: Option<&Value>) -> T {
    match args {
        Some(Value::Array(items)) => T::decode(items),
        _ => T::decode(&[]),
    }
}

/// Canonical JSON encoding of a call result.
pub fn encode_result<R: Serialize>(result: &R) -> Result<Value, serde_json::Error> {
    serde_json::to_value(result)
}
