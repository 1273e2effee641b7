// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Product ranking orders
//!
//! The Open API orders by field name while the Web API expects a numeric
//! `"<column>,<direction>"` code. Both are derived from [`SortBy`].

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Supported product ranking orders, always descending
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    /// Units sold over the last 7 days
    #[default]
    Day7UnitsSold,
    /// GMV over the last 7 days
    Day7Gmv,
    /// Lifetime units sold
    TotalUnitsSold,
    /// Lifetime GMV
    TotalGmv,
    /// Affiliate commission rate
    CommissionRate,
    /// Number of creators promoting the product
    CreatorCount,
}

impl SortBy {
    /// Field name used in Open API `orderby` objects
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Day7UnitsSold => "day7_units_sold",
            Self::Day7Gmv => "day7_gmv",
            Self::TotalUnitsSold => "total_units_sold",
            Self::TotalGmv => "total_gmv",
            Self::CommissionRate => "commission_rate",
            Self::CreatorCount => "creator_count",
        }
    }

    /// Web API `order` parameter
    pub const fn web_order_code(self) -> &'static str {
        match self {
            Self::Day7UnitsSold => "2,2",
            Self::Day7Gmv => "3,2",
            Self::TotalUnitsSold => "4,2",
            Self::TotalGmv => "5,2",
            Self::CommissionRate => "6,2",
            Self::CreatorCount => "7,2",
        }
    }

    /// Returns all supported orders
    pub const fn all() -> &'static [Self] {
        &[
            Self::Day7UnitsSold,
            Self::Day7Gmv,
            Self::TotalUnitsSold,
            Self::TotalGmv,
            Self::CommissionRate,
            Self::CreatorCount,
        ]
    }

    /// Parse a caller-supplied order, falling back to [`SortBy::Day7UnitsSold`]
    pub fn from_param(value: &str) -> Self {
        value.parse().unwrap_or_default()
    }
}

impl fmt::Display for SortBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortBy {
    type Err = SortByParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|sort| sort.as_str() == s.trim())
            .ok_or_else(|| SortByParseError(s.to_string()))
    }
}

/// Error type for sort order parsing
#[derive(Debug, thiserror::Error)]
#[error("unsupported sort order: {0}")]
pub struct SortByParseError(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn web_order_codes() {
        assert_eq!(SortBy::Day7UnitsSold.web_order_code(), "2,2");
        assert_eq!(SortBy::Day7Gmv.web_order_code(), "3,2");
        assert_eq!(SortBy::CreatorCount.web_order_code(), "7,2");
    }

    #[test]
    fn parse_round_trips_every_order() {
        for &sort in SortBy::all() {
            assert_eq!(sort.as_str().parse::<SortBy>().unwrap(), sort);
        }
    }

    #[test]
    fn unknown_order_defaults_to_day7_units_sold() {
        assert!("gmv_per_view".parse::<SortBy>().is_err());
        assert_eq!(SortBy::from_param("gmv_per_view"), SortBy::Day7UnitsSold);
        assert_eq!(SortBy::from_param(""), SortBy::Day7UnitsSold);
    }

    #[test]
    fn serde_uses_field_names() {
        assert_eq!(
            serde_json::to_string(&SortBy::TotalGmv).unwrap(),
            "\"total_gmv\""
        );
    }
}
