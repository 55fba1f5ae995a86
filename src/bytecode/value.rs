//! Runtime values for the bytecode VM.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

/// A host function exposed to the language.
pub type BuiltinFunction = fn(Vec<Rc<Value>>) -> Rc<Value>;

/// The closed sum of runtime values.
#[derive(Debug, Clone)]
pub enum Value {
    Integer(i64),
    Boolean(bool),
    Null,
    Str(Rc<String>),
    Array(Vec<Rc<Value>>),
    Hash(IndexMap<HashKey, HashPair>),
    CompiledFunction(Rc<CompiledFunction>),
    ReturnValue(Rc<Value>),
    Error(String),
    Builtin(BuiltinFunction),
}

impl Value {
    /// The type tag used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Integer(_) => "INTEGER",
            Value::Boolean(_) => "BOOLEAN",
            Value::Null => "NULL",
            Value::Str(_) => "STRING",
            Value::Array(_) => "ARRAY",
            Value::Hash(_) => "HASH",
            Value::CompiledFunction(_) => "COMPILED_FUNCTION",
            Value::ReturnValue(_) => "RETURN_VALUE",
            Value::Error(_) => "ERROR",
            Value::Builtin(_) => "BUILTIN",
        }
    }

    /// Only `false` and `null` are not truthy; every other value is,
    /// including zero and the empty string.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Boolean(b) => *b,
            Value::Null => false,
            _ => true,
        }
    }

    /// Derive the hash key for a hashable value: integers by their
    /// numeric value, booleans by 0/1, strings by an FNV-1a digest of
    /// their bytes. `None` for everything else.
    pub fn hash_key(&self) -> Option<HashKey> {
        match self {
            Value::Integer(n) => Some(HashKey {
                kind: self.kind(),
                value: *n as u64,
            }),
            Value::Boolean(b) => Some(HashKey {
                kind: self.kind(),
                value: u64::from(*b),
            }),
            Value::Str(s) => Some(HashKey {
                kind: self.kind(),
                value: fnv1a(s.as_bytes()),
            }),
            _ => None,
        }
    }
}

/// The inspect form.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "{}", n),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Null => write!(f, "null"),
            Value::Str(s) => write!(f, "{}", s),
            Value::Array(elements) => {
                write!(f, "[")?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", element)?;
                }
                write!(f, "]")
            }
            Value::Hash(pairs) => {
                write!(f, "{{")?;
                for (i, pair) in pairs.values().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", pair.key, pair.value)?;
                }
                write!(f, "}}")
            }
            Value::CompiledFunction(func) => {
                write!(f, "CompiledFunction[{:p}]", Rc::as_ptr(func))
            }
            Value::ReturnValue(value) => write!(f, "{}", value),
            Value::Error(message) => write!(f, "ERROR: {}", message),
            Value::Builtin(_) => write!(f, "builtin function"),
        }
    }
}

/// The key of a hash entry: the value's type tag plus a 64-bit
/// digest. Two values index the same entry iff their keys match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HashKey {
    pub kind: &'static str,
    pub value: u64,
}

/// One hash entry. The original key object is kept so inspect output
/// can print it.
#[derive(Debug, Clone)]
pub struct HashPair {
    pub key: Rc<Value>,
    pub value: Rc<Value>,
}

/// A function lowered to bytecode, together with the stack space its
/// frame reserves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledFunction {
    pub instructions: Vec<u8>,
    pub num_locals: usize,
    pub num_parameters: usize,
}

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u64::from(*byte)).wrapping_mul(FNV_PRIME)
    })
}

thread_local! {
    static TRUE: Rc<Value> = Rc::new(Value::Boolean(true));
    static FALSE: Rc<Value> = Rc::new(Value::Boolean(false));
    static NULL: Rc<Value> = Rc::new(Value::Null);
}

/// The shared `true` singleton.
pub fn true_value() -> Rc<Value> {
    TRUE.with(Rc::clone)
}

/// The shared `false` singleton.
pub fn false_value() -> Rc<Value> {
    FALSE.with(Rc::clone)
}

/// The shared `null` singleton.
pub fn null_value() -> Rc<Value> {
    NULL.with(Rc::clone)
}

/// Booleans must route through here so identity equality holds.
pub fn bool_value(b: bool) -> Rc<Value> {
    if b {
        true_value()
    } else {
        false_value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_hash_keys() {
        let hello1 = Value::Str(Rc::new("Hello World".to_string()));
        let hello2 = Value::Str(Rc::new("Hello World".to_string()));
        let diff = Value::Str(Rc::new("My name is johnny".to_string()));

        assert_eq!(hello1.hash_key(), hello2.hash_key());
        assert_ne!(hello1.hash_key(), diff.hash_key());
    }

    #[test]
    fn test_scalar_hash_keys() {
        assert_eq!(
            Value::Integer(1).hash_key(),
            Some(HashKey {
                kind: "INTEGER",
                value: 1
            })
        );
        assert_eq!(
            Value::Boolean(true).hash_key(),
            Some(HashKey {
                kind: "BOOLEAN",
                value: 1
            })
        );
        assert_eq!(
            Value::Boolean(false).hash_key(),
            Some(HashKey {
                kind: "BOOLEAN",
                value: 0
            })
        );
    }

    #[test]
    fn test_integer_and_boolean_keys_do_not_collide() {
        assert_ne!(Value::Integer(1).hash_key(), Value::Boolean(true).hash_key());
    }

    #[test]
    fn test_unhashable_values() {
        assert_eq!(Value::Array(vec![]).hash_key(), None);
        assert_eq!(Value::Null.hash_key(), None);
    }

    #[test]
    fn test_truthiness() {
        assert!(Value::Boolean(true).is_truthy());
        assert!(!Value::Boolean(false).is_truthy());
        assert!(!Value::Null.is_truthy());
        assert!(Value::Integer(0).is_truthy());
        assert!(Value::Str(Rc::new(String::new())).is_truthy());
    }

    #[test]
    fn test_singleton_identity() {
        assert!(Rc::ptr_eq(&true_value(), &true_value()));
        assert!(Rc::ptr_eq(&false_value(), &false_value()));
        assert!(Rc::ptr_eq(&null_value(), &null_value()));
        assert!(!Rc::ptr_eq(&true_value(), &false_value()));
        assert!(Rc::ptr_eq(&bool_value(true), &true_value()));
    }

    #[test]
    fn test_inspect_forms() {
        let array = Value::Array(vec![
            Rc::new(Value::Integer(1)),
            Rc::new(Value::Str(Rc::new("two".to_string()))),
            null_value(),
        ]);
        assert_eq!(array.to_string(), "[1, two, null]");

        let mut pairs = IndexMap::new();
        let key = Rc::new(Value::Str(Rc::new("k".to_string())));
        pairs.insert(
            key.hash_key().unwrap(),
            HashPair {
                key,
                value: Rc::new(Value::Integer(1)),
            },
        );
        assert_eq!(Value::Hash(pairs).to_string(), "{k: 1}");

        assert_eq!(Value::Error("boom".to_string()).to_string(), "ERROR: boom");
    }

    #[test]
    fn test_fnv1a_reference_vector() {
        // Standard FNV-1a test vectors.
        assert_eq!(fnv1a(b""), 0xcbf2_9ce4_8422_2325);
        assert_eq!(fnv1a(b"a"), 0xaf63_dc4c_8601_ec8c);
    }
}
