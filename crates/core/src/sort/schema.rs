//! Per-position typed decoding of sort arrays

use super::value::{self, Rejection};
use super::{SortDecodeError, SortValue, SortValues};
use serde_json::value::RawValue;
use std::convert::Infallible;
use std::str::FromStr;

/// Declared kind of one sort position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortKind {
    /// `i`
    Int,
    /// `f`
    Float,
    /// `s`
    Str,
    /// any other letter, decoded with the sniffing classifier
    Any,
}

impl SortKind {
    pub fn from_code(code: char) -> Self {
        match code {
            'i' => Self::Int,
            'f' => Self::Float,
            's' => Self::Str,
            _ => Self::Any,
        }
    }

    fn decode(self, raw: &str) -> Result<SortValue, Rejection> {
        let raw = raw.trim();
        if raw == "null" {
            return Ok(SortValue::Null);
        }
        match self {
            Self::Int => value::parse_int(raw).map(SortValue::Int),
            Self::Float => value::parse_float(raw).map(SortValue::Float),
            Self::Str => value::decode_string(raw).map(SortValue::Str),
            Self::Any => value::classify(raw),
        }
    }
}

/// Static type signature for a sort tuple, e.g. `"isf"`
///
/// Positions past the end of the signature fall back to [`SortKind::Any`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortSchema {
    kinds: Vec<SortKind>,
}

impl SortSchema {
    pub fn parse(signature: &str) -> Self {
        Self {
            kinds: signature.chars().map(SortKind::from_code).collect(),
        }
    }

    pub fn kinds(&self) -> &[SortKind] {
        &self.kinds
    }

    pub fn kind_at(&self, index: usize) -> SortKind {
        self.kinds.get(index).copied().unwrap_or(SortKind::Any)
    }

    /// Decodes a JSON array according to the signature
    pub fn decode(&self, json: &str) -> Result<SortValues, SortDecodeError> {
        let raws: Vec<&RawValue> =
            serde_json::from_str(json).map_err(SortDecodeError::NotAnArray)?;
        raws.iter()
            .enumerate()
            .map(|(index, raw)| {
                self.kind_at(index)
                    .decode(raw.get())
                    .map_err(|reason| SortDecodeError::element(index, raw.get(), reason))
            })
            .collect()
    }

    /// Decodes a sort array captured verbatim from a search hit
    pub fn decode_raw(&self, raw: &RawValue) -> Result<SortValues, SortDecodeError> {
        self.decode(raw.get())
    }
}

impl FromStr for SortSchema {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sort::SortValueKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_signature() {
        let schema = SortSchema::parse("isf_");
        assert_eq!(
            schema.kinds(),
            &[SortKind::Int, SortKind::Str, SortKind::Float, SortKind::Any]
        );
        assert_eq!(schema.kind_at(10), SortKind::Any);
    }

    #[test]
    fn test_decode_by_position() {
        let schema: SortSchema = "isf".parse().unwrap();
        let values = schema
            .decode(r#"[1676432653945685122, "88.999", 7]"#)
            .unwrap();

        assert_eq!(
            values.values(),
            &[
                SortValue::Int(1_676_432_653_945_685_122),
                SortValue::Str("88.999".to_string()),
                SortValue::Float(7.0),
            ]
        );
    }

    #[test]
    fn test_float_position_keeps_integral_literal_as_float() {
        let schema = SortSchema::parse("f");
        let values = schema.decode("[12]").unwrap();
        assert_eq!(values.values()[0].kind(), SortValueKind::Float);
    }

    #[test]
    fn test_positions_beyond_signature_are_sniffed() {
        let schema = SortSchema::parse("s");
        let values = schema.decode(r#"["a", 2, 2.5, true, [1]]"#).unwrap();
        let kinds: Vec<_> = values.iter().map(SortValue::kind).collect();
        assert_eq!(
            kinds,
            vec![
                SortValueKind::Str,
                SortValueKind::Int,
                SortValueKind::Float,
                SortValueKind::Bool,
                SortValueKind::Nested,
            ]
        );
    }

    #[test]
    fn test_null_accepted_at_any_position() {
        let schema = SortSchema::parse("isf");
        let values = schema.decode("[null, null, null]").unwrap();
        assert!(values.iter().all(SortValue::is_null));
    }

    #[test]
    fn test_kind_mismatch_is_reported() {
        let schema = SortSchema::parse("is");
        let err = schema.decode(r#"[1.5, "x"]"#).unwrap_err();
        assert_eq!(err.index(), Some(0));

        let err = schema.decode(r#"[1, 2]"#).unwrap_err();
        assert_eq!(err.index(), Some(1));
        assert!(err.to_string().contains("is not a string"), "{err}");
    }

    #[test]
    fn test_decode_raw() {
        let raw = RawValue::from_string("[42, \"b\"]".to_string()).unwrap();
        let values = SortSchema::parse("is").decode_raw(&raw).unwrap();
        assert_eq!(values.len(), 2);
        assert_eq!(values.get(0), Some(&SortValue::Int(42)));
    }
}
