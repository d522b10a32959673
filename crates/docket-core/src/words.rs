//! # Amount in Words
//!
//! Spells a rupee amount in the Indian numbering system, as printed under
//! the grand total: `12345.50` → "Twelve Thousand Three Hundred and Forty
//! Five Rupees and Fifty Paise Only".
//!
//! ```text
//! 12,34,56,789  →  [12] Crore  [34] Lakh  [56] Thousand  [789]
//!                                                        Seven Hundred and Eighty Nine
//! ```
//! Counts above 99 crore recurse into the crore group ("One Hundred Crore").

use crate::money::Money;

const ONES: [&str; 20] = [
    "Zero", "One", "Two", "Three", "Four", "Five", "Six", "Seven", "Eight", "Nine", "Ten",
    "Eleven", "Twelve", "Thirteen", "Fourteen", "Fifteen", "Sixteen", "Seventeen", "Eighteen",
    "Nineteen",
];

const TENS: [&str; 10] = [
    "", "", "Twenty", "Thirty", "Forty", "Fifty", "Sixty", "Seventy", "Eighty", "Ninety",
];

const CRORE: u128 = 10_000_000;
const LAKH: u128 = 100_000;
const THOUSAND: u128 = 1_000;

/// Spells `amount` (rounded to paise) in words.
///
/// ```rust
/// use docket_core::money::Money;
/// use docket_core::words::amount_in_words;
///
/// assert_eq!(amount_in_words(Money::from_paise(45)), "Zero Rupees and Forty Five Paise Only");
/// ```
pub fn amount_in_words(amount: Money) -> String {
    let rupees = amount.rupees_part();
    let paise = amount.paise_part();

    let mut out = String::new();
    if amount.round_paise().is_negative() {
        out.push_str("Minus ");
    }
    out.push_str(&integer_in_words(rupees));
    out.push_str(" Rupees");
    if paise > 0 {
        out.push_str(" and ");
        out.push_str(&below_hundred(paise as u128));
        out.push_str(" Paise");
    }
    out.push_str(" Only");
    out
}

/// Integer part in Indian grouping. `0` is "Zero".
pub fn integer_in_words(n: u128) -> String {
    if n == 0 {
        return ONES[0].to_string();
    }

    let mut parts: Vec<String> = Vec::new();

    let crores = n / CRORE;
    if crores > 0 {
        parts.push(format!("{} Crore", integer_in_words(crores)));
    }

    let lakhs = (n % CRORE) / LAKH;
    if lakhs > 0 {
        parts.push(format!("{} Lakh", below_hundred(lakhs)));
    }

    let thousands = (n % LAKH) / THOUSAND;
    if thousands > 0 {
        parts.push(format!("{} Thousand", below_hundred(thousands)));
    }

    let rest = n % THOUSAND;
    if rest > 0 {
        parts.push(below_thousand(rest));
    }

    parts.join(" ")
}

/// 1..=999; "and" joins the hundreds to a non-zero remainder.
fn below_thousand(n: u128) -> String {
    let hundreds = n / 100;
    let rest = n % 100;

    match (hundreds, rest) {
        (0, r) => below_hundred(r),
        (h, 0) => format!("{} Hundred", ONES[h as usize]),
        (h, r) => format!("{} Hundred and {}", ONES[h as usize], below_hundred(r)),
    }
}

/// 1..=99
fn below_hundred(n: u128) -> String {
    let n = n as usize;
    if n < 20 {
        return ONES[n].to_string();
    }
    match n % 10 {
        0 => TENS[n / 10].to_string(),
        ones => format!("{} {}", TENS[n / 10], ONES[ones]),
    }
}
