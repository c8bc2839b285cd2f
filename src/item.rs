//! Item parameters and response records.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ensure_finite, CatError, Result};

/// Identifier of an item within one bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u32);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An immutable 3PL item: discrimination `a > 0`, difficulty `b`, guessing `c` in `[0, 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawItem")]
pub struct Item {
    id: ItemId,
    a: f64,
    b: f64,
    c: f64,
}

#[derive(Deserialize)]
struct RawItem {
    id: ItemId,
    a: f64,
    b: f64,
    c: f64,
}

impl TryFrom<RawItem> for Item {
    type Error = CatError;

    fn try_from(raw: RawItem) -> Result<Self> {
        Item::new(raw.id, raw.a, raw.b, raw.c)
    }
}

impl Item {
    pub fn new(id: ItemId, a: f64, b: f64, c: f64) -> Result<Self> {
        let invalid = |reason: String| CatError::InvalidItem { id, reason };
        if !a.is_finite() || a <= 0.0 {
            return Err(invalid(format!("discrimination must be positive, got {a}")));
        }
        if !b.is_finite() {
            return Err(invalid(format!("difficulty must be finite, got {b}")));
        }
        if !c.is_finite() || !(0.0..1.0).contains(&c) {
            return Err(invalid(format!("guessing must lie in [0, 1), got {c}")));
        }
        Ok(Self { id, a, b, c })
    }

    #[inline]
    pub fn id(&self) -> ItemId {
        self.id
    }

    #[inline]
    pub fn a(&self) -> f64 {
        self.a
    }

    #[inline]
    pub fn b(&self) -> f64 {
        self.b
    }

    #[inline]
    pub fn c(&self) -> f64 {
        self.c
    }
}

/// What the estimator needs to know about one administered item.
///
/// Records are validated when built, so likelihood evaluation never has to
/// re-check item parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawResponseRecord")]
pub struct ResponseRecord {
    a: f64,
    b: f64,
    c: f64,
    answered_correctly: bool,
}

#[derive(Deserialize)]
struct RawResponseRecord {
    a: Option<f64>,
    b: Option<f64>,
    c: Option<f64>,
    answered_correctly: Option<bool>,
}

impl TryFrom<RawResponseRecord> for ResponseRecord {
    type Error = CatError;

    fn try_from(raw: RawResponseRecord) -> Result<Self> {
        let missing = |field: &str| CatError::InvalidResponse {
            reason: format!("missing field `{field}`"),
        };
        ResponseRecord::new(
            raw.a.ok_or_else(|| missing("a"))?,
            raw.b.ok_or_else(|| missing("b"))?,
            raw.c.ok_or_else(|| missing("c"))?,
            raw.answered_correctly
                .ok_or_else(|| missing("answered_correctly"))?,
        )
    }
}

impl ResponseRecord {
    pub fn new(a: f64, b: f64, c: f64, answered_correctly: bool) -> Result<Self> {
        ensure_finite("a", a)?;
        ensure_finite("b", b)?;
        ensure_finite("c", c)?;
        if a <= 0.0 {
            return Err(CatError::InvalidResponse {
                reason: format!("discrimination must be positive, got {a}"),
            });
        }
        if !(0.0..=1.0).contains(&c) {
            return Err(CatError::GuessingOutOfRange(c));
        }
        Ok(Self {
            a,
            b,
            c,
            answered_correctly,
        })
    }

    /// Record a response to a bank item. Bank items are already valid.
    pub fn from_item(item: &Item, answered_correctly: bool) -> Self {
        Self {
            a: item.a,
            b: item.b,
            c: item.c,
            answered_correctly,
        }
    }

    #[inline]
    pub fn a(&self) -> f64 {
        self.a
    }

    #[inline]
    pub fn b(&self) -> f64 {
        self.b
    }

    #[inline]
    pub fn c(&self) -> f64 {
        self.c
    }

    #[inline]
    pub fn answered_correctly(&self) -> bool {
        self.answered_correctly
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_rejects_bad_parameters() {
        let id = ItemId(7);
        assert!(Item::new(id, 1.0, 0.0, 0.2).is_ok());
        assert!(Item::new(id, 0.0, 0.0, 0.2).is_err());
        assert!(Item::new(id, -1.0, 0.0, 0.2).is_err());
        assert!(Item::new(id, 1.0, f64::NAN, 0.2).is_err());
        assert!(Item::new(id, 1.0, 0.0, 1.0).is_err());
        assert!(Item::new(id, 1.0, 0.0, -0.1).is_err());
    }

    #[test]
    fn response_record_classifies_failures() {
        assert!(matches!(
            ResponseRecord::new(f64::NAN, 0.0, 0.2, true),
            Err(CatError::NonNumeric { name: "a", .. })
        ));
        assert_eq!(
            ResponseRecord::new(1.0, 0.0, 1.5, true),
            Err(CatError::GuessingOutOfRange(1.5))
        );
        assert!(matches!(
            ResponseRecord::new(0.0, 0.0, 0.2, false),
            Err(CatError::InvalidResponse { .. })
        ));
    }

    #[test]
    fn response_record_deserialization_requires_every_field() {
        let ok: ResponseRecord =
            serde_json::from_str(r#"{"a":1.2,"b":-0.5,"c":0.2,"answered_correctly":true}"#)
                .unwrap();
        assert!(ok.answered_correctly());

        let err = serde_json::from_str::<ResponseRecord>(r#"{"a":1.2,"b":-0.5,"c":0.2}"#)
            .unwrap_err();
        assert!(err.to_string().contains("answered_correctly"));
    }

    #[test]
    fn item_deserialization_is_validated() {
        let err = serde_json::from_str::<Item>(r#"{"id":3,"a":-1.0,"b":0.0,"c":0.2}"#)
            .unwrap_err();
        assert!(err.to_string().contains("discrimination"));
    }
}
