use crate::cache::cache::ValueType;

pub fn from_string(val: &str) -> ValueType {
    ValueType::copy_from_slice(val.as_bytes())
}
