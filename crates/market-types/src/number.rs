// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Coerced numeric values
//!
//! Upstream counters arrive as JSON numbers, numeric strings, percent-suffixed
//! strings or sentinels such as `"-"`. After coercion a value is either an
//! integer or a finite float, mirroring whether the source carried a decimal point.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A finite number produced by safe-number coercion
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Number {
    /// Value parsed without a decimal point
    Int(i64),
    /// Value parsed with a decimal point
    Float(f64),
}

impl Number {
    /// Zero as an integer, the default for missing counters
    pub const ZERO: Self = Self::Int(0);

    /// Build a float, rejecting NaN and infinities
    pub fn finite(value: f64) -> Option<Self> {
        value.is_finite().then_some(Self::Float(value))
    }

    /// Whether this number was parsed as an integer
    pub fn is_int(&self) -> bool {
        matches!(self, Self::Int(_))
    }

    /// The value as a float
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> f64 {
        match *self {
            Self::Int(value) => value as f64,
            Self::Float(value) => value,
        }
    }

    /// The value as an integer, truncating any fractional part
    #[allow(clippy::cast_possible_truncation)]
    pub fn as_i64(&self) -> i64 {
        match *self {
            Self::Int(value) => value,
            Self::Float(value) => value.trunc() as i64,
        }
    }

    /// Whether the value is non-zero
    pub fn is_truthy(&self) -> bool {
        match *self {
            Self::Int(value) => value != 0,
            Self::Float(value) => value != 0.0,
        }
    }
}

impl Default for Number {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
        }
    }
}
