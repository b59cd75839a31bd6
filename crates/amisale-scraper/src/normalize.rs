//! Conversion from [`RawItem`] display text to a validated [`NormalizedRecord`].

use std::fmt;

use amisale_core::{NormalizedRecord, RawItem};
use thiserror::Error;

/// Which price column a parse failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceField {
    Discounted,
    Original,
}

impl fmt::Display for PriceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Discounted => f.write_str("discounted price"),
            Self::Original => f.write_str("original price"),
        }
    }
}

/// Why a raw item was dropped. Rejections are counted, never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("{field} \"{text}\" is not a whole yen amount")]
    UnparseablePrice { field: PriceField, text: String },

    #[error("original price is zero")]
    ZeroOriginalPrice,

    #[error("discounted price {discounted} exceeds original price {original}")]
    DiscountExceedsOriginal { discounted: u64, original: u64 },
}

/// Parses display text such as `"1,980"`, `"1,980 JPY"` or `"¥1,980"` into
/// whole yen. Separators and currency markers are dropped; anything else
/// left over makes the text unparseable.
#[must_use]
pub fn parse_price(text: &str) -> Option<u64> {
    let stripped = text
        .trim()
        .trim_end_matches("JPY")
        .trim_end_matches('円')
        .trim_start_matches(['¥', '￥']);
    let digits: String = stripped
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// `(original - discounted) / original * 100`, rounded to 2 decimal places
/// with ties to even. `None` when `original` is zero.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn discount_percent(discounted: u64, original: u64) -> Option<f64> {
    if original == 0 {
        return None;
    }
    let raw = (original as f64 - discounted as f64) / original as f64 * 100.0;
    Some(round_hundredths(raw))
}

/// Rounds to 2 decimal places, ties to even, judged on the exact binary
/// value of `value`. `16.075_f64` is stored just below the tie and rounds
/// down to `16.07`; scaling by 100 first would round it up.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_precision_loss
)]
fn round_hundredths(value: f64) -> f64 {
    if value == 0.0 || !value.is_finite() {
        return value;
    }
    let bits = value.abs().to_bits();
    let biased_exp = ((bits >> 52) & 0x7ff) as i32;
    let fraction = bits & ((1_u64 << 52) - 1);
    let (mantissa, exp) = if biased_exp == 0 {
        (fraction, -1074)
    } else {
        (fraction | (1_u64 << 52), biased_exp - 1075)
    };
    if exp >= 0 {
        return value;
    }

    // value * 100 == scaled / 2^shift exactly.
    let shift = exp.unsigned_abs();
    let hundredths = if shift >= 120 {
        0
    } else {
        let scaled = u128::from(mantissa) * 100;
        let whole = scaled >> shift;
        let rem = scaled - (whole << shift);
        let half = 1_u128 << (shift - 1);
        if rem > half || (rem == half && whole % 2 == 1) {
            whole + 1
        } else {
            whole
        }
    };
    (hundredths as f64 / 100.0).copysign(value)
}

/// Validates one raw item.
///
/// # Errors
///
/// Returns a [`Rejection`] when a price fails to parse or when the pair is
/// inconsistent (zero original, discounted above original).
pub fn normalize(item: RawItem) -> Result<NormalizedRecord, Rejection> {
    let discounted_price =
        parse_price(&item.discounted_price_text).ok_or_else(|| Rejection::UnparseablePrice {
            field: PriceField::Discounted,
            text: item.discounted_price_text.clone(),
        })?;
    let original_price =
        parse_price(&item.original_price_text).ok_or_else(|| Rejection::UnparseablePrice {
            field: PriceField::Original,
            text: item.original_price_text.clone(),
        })?;

    let discount_percent =
        discount_percent(discounted_price, original_price).ok_or(Rejection::ZeroOriginalPrice)?;
    if discounted_price > original_price {
        return Err(Rejection::DiscountExceedsOriginal {
            discounted: discounted_price,
            original: original_price,
        });
    }

    Ok(NormalizedRecord {
        condition: item.condition,
        title: item.title,
        detail_link: item.detail_link,
        image_url: item.image_url,
        discounted_price,
        original_price,
        discount_percent,
    })
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
