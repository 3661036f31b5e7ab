//! Presentation helpers shared by every front end

use crate::types::{Category, Product};
use rust_decimal::{Decimal, RoundingStrategy};

/// Currency used when none is given
pub const DEFAULT_CURRENCY: &str = "USD";

/// Format a price with two fraction digits and thousands separators
///
/// ```
/// use rust_decimal::Decimal;
/// use storefront_core::format::format_price;
///
/// assert_eq!(format_price(Decimal::new(123_456_7, 1), "USD"), "$123,456.70");
/// assert_eq!(format_price(Decimal::from(5), "CHF"), "CHF 5.00");
/// ```
#[must_use]
pub fn format_price(price: Decimal, currency: &str) -> String {
    let rounded = price.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let digits = format!("{:.2}", rounded.abs());
    let (whole, fraction) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
    let prefix = if currency == DEFAULT_CURRENCY {
        "$".to_string()
    } else {
        format!("{currency} ")
    };

    format!("{sign}{prefix}{grouped}.{fraction}")
}

/// Alt text for a product image
#[must_use]
pub fn image_alt(product: &Product) -> String {
    let category = if product.category.name.is_empty() {
        "product"
    } else {
        product.category.name.as_str()
    };
    format!("Image of {} - {}", product.title, category)
}

/// Alt text for a category image
#[must_use]
pub fn category_image_alt(category: &Category) -> String {
    format!("Image of {} category", category.name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CategoryId, ProductId};

    #[test]
    fn pads_to_two_digits() {
        assert_eq!(format_price(Decimal::from(10), DEFAULT_CURRENCY), "$10.00");
        assert_eq!(format_price(Decimal::new(5, 1), DEFAULT_CURRENCY), "$0.50");
    }

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(format_price(Decimal::new(1005, 3), DEFAULT_CURRENCY), "$1.01");
    }

    #[test]
    fn groups_thousands() {
        assert_eq!(format_price(Decimal::from(1_234_567), DEFAULT_CURRENCY), "$1,234,567.00");
        assert_eq!(format_price(Decimal::from(999), DEFAULT_CURRENCY), "$999.00");
    }

    #[test]
    fn negative_amounts_lead_with_sign() {
        assert_eq!(format_price(Decimal::new(-12_50, 2), DEFAULT_CURRENCY), "-$12.50");
    }

    #[test]
    fn other_currencies_use_code_prefix() {
        assert_eq!(format_price(Decimal::new(12_50, 2), "EUR"), "EUR 12.50");
        assert_eq!(format_price(Decimal::from(1_000), "GBP"), "GBP 1,000.00");
    }

    #[test]
    fn alt_text_falls_back_to_product() {
        let product = Product::new(
            ProductId(1),
            "Lamp",
            Decimal::ONE,
            Category::new(CategoryId(2), "", ""),
        );
        assert_eq!(image_alt(&product), "Image of Lamp - product");

        let category = Category::new(CategoryId(2), "Furniture", "");
        assert_eq!(category_image_alt(&category), "Image of Furniture category");
    }
}
