//! Typed access to extension payloads. Every getter returns `Ok(None)` when the key is
//! absent and `InvalidValue` when it is present with the wrong shape.

use serde_json::{Map, Value};

use super::decode::Err;

pub(crate) type Object = Map<String, Value>;

fn invalid(name: &str) -> Err {
    Err::InvalidValue(format!("Invalid {}.", name))
}

/// Interprets `value` as a JSON object.
pub(crate) fn as_object<'a>(value: &'a Value, name: &str) -> Result<&'a Object, Err> {
    value.as_object().ok_or_else(|| invalid(name))
}

/// Turns a missing required entry into `InvalidValue`.
pub(crate) fn required<T>(value: Option<T>, name: &str) -> Result<T, Err> {
    value.ok_or_else(|| Err::InvalidValue(format!("Missing {}.", name)))
}

pub(crate) fn get_object<'a>(object: &'a Object, name: &str) -> Result<Option<&'a Object>, Err> {
    object.get(name).map(|v| as_object(v, name)).transpose()
}

pub(crate) fn get_array<'a>(object: &'a Object, name: &str) -> Result<Option<&'a Vec<Value>>, Err> {
    object.get(name)
        .map(|v| v.as_array().ok_or_else(|| invalid(name)))
        .transpose()
}

pub(crate) fn get_string(object: &Object, name: &str) -> Result<Option<String>, Err> {
    object.get(name)
        .map(|v| v.as_str().map(str::to_owned).ok_or_else(|| invalid(name)))
        .transpose()
}

pub(crate) fn get_i64(object: &Object, name: &str) -> Result<Option<i64>, Err> {
    object.get(name)
        .map(|v| v.as_i64().ok_or_else(|| invalid(name)))
        .transpose()
}

pub(crate) fn get_i32(object: &Object, name: &str) -> Result<Option<i32>, Err> {
    get_i64(object, name)?
        .map(|v| i32::try_from(v).map_err(|_| invalid(name)))
        .transpose()
}

/// Reads a non-negative integer, typically an index.
pub(crate) fn get_usize(object: &Object, name: &str) -> Result<Option<usize>, Err> {
    get_i64(object, name)?
        .map(|v| usize::try_from(v).map_err(|_| invalid(name)))
        .transpose()
}

pub(crate) fn get_f64(object: &Object, name: &str) -> Result<Option<f64>, Err> {
    object.get(name)
        .map(|v| v.as_f64().ok_or_else(|| invalid(name)))
        .transpose()
}

pub(crate) fn get_f32(object: &Object, name: &str) -> Result<Option<f32>, Err> {
    Ok(get_f64(object, name)?.map(|v| v as f32))
}

pub(crate) fn get_f64_array<const N: usize>(object: &Object, name: &str) -> Result<Option<[f64; N]>, Err> {
    let Some(values) = get_array(object, name)? else {
        return Ok(None);
    };
    if values.len() != N {
        return Err(invalid(name));
    }
    let mut out = [0.0; N];
    for (o, v) in out.iter_mut().zip(values) {
        *o = v.as_f64().ok_or_else(|| invalid(name))?;
    }
    Ok(Some(out))
}

pub(crate) fn get_vec3(object: &Object, name: &str) -> Result<Option<[f32; 3]>, Err> {
    Ok(get_f64_array::<3>(object, name)?.map(|v| v.map(|c| c as f32)))
}

pub(crate) fn get_i32_array(object: &Object, name: &str) -> Result<Option<Vec<i32>>, Err> {
    let Some(values) = get_array(object, name)? else {
        return Ok(None);
    };
    values.iter()
        .map(|v| v.as_i64().and_then(|i| i32::try_from(i).ok()).ok_or_else(|| invalid(name)))
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}
