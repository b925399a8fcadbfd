//! Field adapters for the persisted store layout.
//!
//! Stores written by earlier tooling mix numbers and numeric strings and
//! use `"N/A"` for absent values. Readers here accept both spellings;
//! writers emit one canonical form.

use chrono::NaiveDateTime;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serializer};

/// Sentinel for "no value" in stores and displays.
pub const NOT_APPLICABLE: &str = "N/A";

const TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(u64),
    Text(String),
}

impl NumberOrString {
    fn into_u64<E: serde::de::Error>(self) -> Result<u64, E> {
        match self {
            NumberOrString::Number(n) => Ok(n),
            NumberOrString::Text(s) => s
                .trim()
                .parse::<u64>()
                .map_err(|e| E::custom(format!("invalid quantity {:?}: {}", s, e))),
        }
    }
}

/// Number or numeric string as u64.
pub fn lenient_u64<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
    NumberOrString::deserialize(d)?.into_u64()
}

/// Number or numeric string as u32.
pub fn lenient_u32<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
    let n = lenient_u64(d)?;
    u32::try_from(n).map_err(|_| D::Error::custom(format!("{} does not fit in u32", n)))
}

/// u64 written as a decimal string, read leniently.
pub mod quantity_string {
    use super::*;

    pub fn serialize<S: Serializer>(value: &u64, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
        lenient_u64(d)
    }
}

/// Calendar year written as a string (`"2019"`), read leniently.
pub mod year_string {
    use super::*;

    pub fn serialize<S: Serializer>(value: &i32, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<i32, D::Error> {
        let n = lenient_u64(d)?;
        i32::try_from(n).map_err(|_| D::Error::custom(format!("year {} out of range", n)))
    }
}

/// `Option<Beer>` as the beer's full name or `"N/A"`.
pub mod beer_or_na {
    use super::*;
    use crate::domain::Beer;

    pub fn serialize<S: Serializer>(value: &Option<Beer>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(value.map(Beer::name).unwrap_or(NOT_APPLICABLE))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Beer>, D::Error> {
        let raw = String::deserialize(d)?;
        if raw.trim() == NOT_APPLICABLE {
            return Ok(None);
        }
        raw.parse::<Beer>().map(Some).map_err(D::Error::custom)
    }
}

/// `Option<NaiveDateTime>` as `YYYY-MM-DD HH:MM:SS.ffffff` or `"N/A"`.
pub mod timestamp_or_na {
    use super::*;

    pub fn serialize<S: Serializer>(
        value: &Option<NaiveDateTime>,
        s: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(ts) => s.serialize_str(&ts.format(TIMESTAMP_FORMATS[0]).to_string()),
            None => s.serialize_str(NOT_APPLICABLE),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<Option<NaiveDateTime>, D::Error> {
        let raw = String::deserialize(d)?;
        let raw = raw.trim();
        if raw == NOT_APPLICABLE {
            return Ok(None);
        }
        TIMESTAMP_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("invalid timestamp {:?}", raw)))
    }
}
