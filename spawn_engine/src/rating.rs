//! Seller rating aggregation.
//!
//! A seller's rating is a running average over every rating buyers have left. Only the average and the number of
//! ratings are stored, so a new rating is folded in without revisiting the history.
use std::fmt::Display;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MIN_STARS: u8 = 1;
pub const MAX_STARS: u8 = 5;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("A rating must be between {MIN_STARS} and {MAX_STARS} stars, but got {0}")]
pub struct InvalidRating(pub i64);

/// A single buyer's rating of a seller, in whole stars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct StarRating(u8);

impl StarRating {
    pub fn value(&self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for StarRating {
    type Error = InvalidRating;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if (i64::from(MIN_STARS)..=i64::from(MAX_STARS)).contains(&value) {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            Ok(Self(value as u8))
        } else {
            Err(InvalidRating(value))
        }
    }
}

impl Display for StarRating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}★", self.0)
    }
}

/// The aggregate rating of a seller.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SellerRating {
    pub average: f64,
    pub count: i64,
}

impl SellerRating {
    pub fn new(average: f64, count: i64) -> Self {
        Self { average, count }
    }

    /// Returns the aggregate after adding `rating`.
    #[allow(clippy::cast_precision_loss)]
    pub fn fold(&self, rating: StarRating) -> Self {
        let count = self.count + 1;
        let average = (self.average * self.count as f64 + f64::from(rating.value())) / count as f64;
        Self { average, count }
    }
}

impl Display for SellerRating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2} ({} ratings)", self.average, self.count)
    }
}
