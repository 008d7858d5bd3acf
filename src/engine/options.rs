// src/engine/options.rs
//
// Option resolution: loosely typed options object -> TransformRequest.
//
// Every numeric field that is present is validated, even when a higher
// priority selector wins, so a bad `percent` next to a good `scale` is still
// rejected. Nothing here touches the codec.

use crate::error::{CimgresError, Result};
use crate::ops::{Transform, TransformRequest};
use serde_json::{Map, Value};

/// Resolve `options` into exactly one transform plus encoding overrides.
pub fn resolve(options: &Value) -> Result<TransformRequest> {
    let fields = options.as_object().ok_or_else(|| {
        CimgresError::invalid_options(format!("expected an object, got {}", kind_of(options)))
    })?;

    let width = positive_integer(fields, "width")?;
    let height = positive_integer(fields, "height")?;
    let scale = positive_real(fields, "scale")?;
    let percent = positive_integer(fields, "percent")?;

    let transform = match (width, height, scale, percent) {
        (Some(width), Some(height), _, _) => Transform::Resize { width, height },
        (_, _, Some(factor), _) => Transform::ScaleFactor { factor },
        (_, _, _, Some(percent)) => Transform::ScalePercent { percent },
        _ => return Err(CimgresError::missing_transform()),
    };

    let mut request = TransformRequest::new(transform);
    if let Some(format) = format_override(fields)? {
        request = request.with_format(format);
    }
    if let Some(quality) = quality(fields)? {
        request = request.with_quality(quality);
    }
    Ok(request)
}

/// Look up a field, treating `null` as absent.
fn field<'a>(fields: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    fields.get(name).filter(|value| !value.is_null())
}

fn number(name: &'static str, value: &Value) -> Result<f64> {
    value.as_f64().ok_or_else(|| {
        CimgresError::invalid_argument(
            name,
            value.to_string(),
            format!("must be a number, got {}", kind_of(value)),
        )
    })
}

fn positive_real(fields: &Map<String, Value>, name: &'static str) -> Result<Option<f64>> {
    let Some(value) = field(fields, name) else {
        return Ok(None);
    };
    let n = number(name, value)?;
    if !n.is_finite() || n <= 0.0 {
        return Err(CimgresError::invalid_argument(
            name,
            value.to_string(),
            "must be a finite number greater than zero",
        ));
    }
    Ok(Some(n))
}

fn positive_integer(fields: &Map<String, Value>, name: &'static str) -> Result<Option<u32>> {
    let Some(n) = positive_real(fields, name)? else {
        return Ok(None);
    };
    if n.fract() != 0.0 || n > u32::MAX as f64 {
        return Err(CimgresError::invalid_argument(
            name,
            n.to_string(),
            "must be a whole number no larger than 4294967295",
        ));
    }
    Ok(Some(n as u32))
}

fn format_override(fields: &Map<String, Value>) -> Result<Option<String>> {
    match field(fields, "format") {
        None => Ok(None),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(CimgresError::invalid_argument(
            "format",
            other.to_string(),
            format!("must be a string, got {}", kind_of(other)),
        )),
    }
}

fn quality(fields: &Map<String, Value>) -> Result<Option<u8>> {
    let Some(value) = field(fields, "quality") else {
        return Ok(None);
    };
    let n = number("quality", value)?;
    if n.fract() != 0.0 || !(1.0..=100.0).contains(&n) {
        return Err(CimgresError::invalid_argument(
            "quality",
            value.to_string(),
            "must be a whole number between 1 and 100",
        ));
    }
    Ok(Some(n as u8))
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
