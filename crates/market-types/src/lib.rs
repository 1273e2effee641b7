// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Canonical types for TikTok Shop market analytics
//!
//! Every upstream response, whichever interface produced it, is mapped into the
//! types of this crate before it leaves the aggregation layer. Numeric fields are
//! always coerced numbers, never raw upstream strings.

pub mod canonical;
pub mod number;
pub mod sort;

pub use canonical::{
    CanonicalCreator, CanonicalProduct, CanonicalVideo, CreatorPage, ProductPage, VideoPage,
};
pub use number::Number;
pub use sort::{SortBy, SortByParseError};
