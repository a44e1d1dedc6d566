//! Precision-safe sort values for `search_after` pagination
//!
//! Search hits carry their sort key as a JSON array such as
//! `[1676432653945685122, "21432243", "88.999", true, 3.14, null]`.
//! Decoding that through a float-first JSON reader silently rounds integers
//! above 2^53, which breaks the cursor sent back in the next page request.
//!
//! [`SortValues`] keeps every numeric element as raw text until it has decided
//! what it is:
//!
//! - a literal with `.`, `e` or `E` is an `f64`
//! - a literal of digits only is an `i64` (falling back to `f64` on overflow)
//! - quoted strings stay strings, even when they look numeric
//! - nested arrays and objects are preserved as opaque JSON
//!
//! A large integral value written with an exponent (`1.6764326539456851e+18`)
//! therefore decodes as a float. That is the documented policy, not a bug.
//!
//! When the sort signature is known up front, [`SortSchema`] decodes each
//! position straight to its declared kind instead.

mod schema;
mod value;

pub use schema::{SortKind, SortSchema};
pub use value::{SortValue, SortValueKind};

use serde::de::{Deserialize, Deserializer, Error as _};
use serde::ser::{Serialize, SerializeSeq, Serializer};
use serde_json::value::RawValue;
use thiserror::Error;

/// Failure while decoding a sort array
#[derive(Error, Debug)]
pub enum SortDecodeError {
    /// The input was not a JSON array at all
    #[error("sort values must be a JSON array: {0}")]
    NotAnArray(#[source] serde_json::Error),

    /// One element could not be classified
    #[error("unmarshal sort data index={index} value={raw} {reason}")]
    Element {
        index: usize,
        raw: String,
        reason: String,
    },
}

impl SortDecodeError {
    pub(crate) fn element(index: usize, raw: &str, reason: value::Rejection) -> Self {
        Self::Element {
            index,
            raw: value::excerpt(raw),
            reason: reason.0,
        }
    }

    /// Index of the offending element, if the failure was element-specific
    pub fn index(&self) -> Option<usize> {
        match self {
            Self::NotAnArray(_) => None,
            Self::Element { index, .. } => Some(*index),
        }
    }
}

/// Ordered sort tuple of one search hit
///
/// Order is significant: it mirrors the sort clauses of the query and is
/// replayed verbatim as `search_after`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SortValues {
    values: Vec<SortValue>,
}

impl SortValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes a JSON array of sort values
    pub fn from_json(json: &str) -> Result<Self, SortDecodeError> {
        let raws: Vec<Box<RawValue>> =
            serde_json::from_str(json).map_err(SortDecodeError::NotAnArray)?;
        Self::from_raw_elements(&raws)
    }

    fn from_raw_elements(raws: &[Box<RawValue>]) -> Result<Self, SortDecodeError> {
        let values = raws
            .iter()
            .enumerate()
            .map(|(index, raw)| {
                value::classify(raw.get())
                    .map_err(|reason| SortDecodeError::element(index, raw.get(), reason))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { values })
    }

    /// All decoded values, empty when nothing has been decoded or pushed
    pub fn values(&self) -> &[SortValue] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&SortValue> {
        self.values.get(index)
    }

    pub fn last(&self) -> Option<&SortValue> {
        self.values.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SortValue> {
        self.values.iter()
    }

    /// Appends a value, used when building a cursor by hand
    ///
    /// A NaN or infinite float makes [`to_json`](Self::to_json) and any
    /// request carrying this cursor fail to encode.
    pub fn push(&mut self, value: impl Into<SortValue>) -> &mut Self {
        self.values.push(value.into());
        self
    }

    /// Owned variant of [`push`](Self::push) for one-expression construction
    pub fn with(mut self, value: impl Into<SortValue>) -> Self {
        self.values.push(value.into());
        self
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn into_inner(self) -> Vec<SortValue> {
        self.values
    }

    /// Encodes the sequence as a JSON array
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl From<Vec<SortValue>> for SortValues {
    fn from(values: Vec<SortValue>) -> Self {
        Self { values }
    }
}

impl FromIterator<SortValue> for SortValues {
    fn from_iter<I: IntoIterator<Item = SortValue>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for SortValues {
    type Item = SortValue;
    type IntoIter = std::vec::IntoIter<SortValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

impl<'a> IntoIterator for &'a SortValues {
    type Item = &'a SortValue;
    type IntoIter = std::slice::Iter<'a, SortValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

impl Serialize for SortValues {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.values.len()))?;
        for value in &self.values {
            seq.serialize_element(value)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for SortValues {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raws = Vec::<Box<RawValue>>::deserialize(deserializer)?;
        Self::from_raw_elements(&raws).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_empty_array() {
        let sort = SortValues::from_json("[]").unwrap();
        assert!(sort.is_empty());
        assert_eq!(sort.len(), 0);
        assert!(sort.values().is_empty());
    }

    #[test]
    fn test_new_is_empty() {
        let sort = SortValues::new();
        assert!(sort.values().is_empty());
        assert_eq!(sort.last(), None);
    }

    #[test]
    fn test_not_an_array() {
        let err = SortValues::from_json(r#"{"a": 1}"#).unwrap_err();
        assert!(matches!(err, SortDecodeError::NotAnArray(_)));
        assert_eq!(err.index(), None);
    }

    #[test]
    fn test_element_error_names_index_and_text() {
        let err = SortValues::from_json(r#"[1, "a", 1e999]"#).unwrap_err();
        assert_eq!(err.index(), Some(2));
        let message = err.to_string();
        assert!(message.contains("index=2"), "{message}");
        assert!(message.contains("1e999"), "{message}");
    }

    #[test]
    fn test_push_is_chainable() {
        let mut sort = SortValues::new();
        sort.push(1_676_432_653_945_685_122_i64)
            .push("xxxxx@,\\xxx")
            .push(true)
            .push(2.5);

        assert_eq!(sort.len(), 4);
        assert_eq!(
            sort.to_json().unwrap(),
            r#"[1676432653945685122,"xxxxx@,\\xxx",true,2.5]"#
        );
    }

    #[test]
    fn test_non_finite_float_does_not_encode() {
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let mut sort = SortValues::new();
            sort.push(1_i64).push(bad);
            assert_eq!(sort.len(), 2);

            let err = sort.to_json().unwrap_err();
            assert!(err.to_string().contains("not a finite number"), "{err}");
            assert!(serde_json::to_value(&sort).is_err());
        }
    }

    #[test]
    fn test_with_builder() {
        let sort = SortValues::new().with(1463538857_i64).with("654323");
        assert_eq!(serde_json::to_value(&sort).unwrap(), json!([1463538857, "654323"]));
    }

    #[test]
    fn test_nested_field_in_struct() {
        #[derive(serde::Deserialize)]
        struct Hit {
            sort: SortValues,
        }

        let hit: Hit =
            serde_json::from_str(r#"{"sort": [9007199254740993, "tie"]}"#).unwrap();
        assert_eq!(hit.sort.get(0), Some(&SortValue::Int(9_007_199_254_740_993)));
    }

    #[test]
    fn test_element_error_propagates_through_serde() {
        #[derive(Debug, serde::Deserialize)]
        struct Hit {
            #[allow(dead_code)]
            sort: SortValues,
        }

        let err = serde_json::from_str::<Hit>(r#"{"sort": [1, -1e999]}"#).unwrap_err();
        assert!(err.to_string().contains("index=1"), "{err}");
    }

    #[test]
    fn test_clear_and_into_inner() {
        let mut sort = SortValues::from_json("[1, 2]").unwrap();
        assert_eq!(
            sort.clone().into_inner(),
            vec![SortValue::Int(1), SortValue::Int(2)]
        );
        sort.clear();
        assert!(sort.is_empty());
    }
}
