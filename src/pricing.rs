//! Discount and loyalty arithmetic applied when an order is settled.
//!
//! Amounts are whole-currency prices held in `f64`. Every discount is
//! floored, so a total never carries a fractional part the menu did not have.

use chrono::{Datelike, NaiveDate};

use crate::models::Badge;

pub const BIRTHDAY_DISCOUNT_PERCENT: u32 = 15;
pub const GOLD_POINTS: i64 = 500;
pub const SILVER_POINTS: i64 = 200;
pub const GOLD_DISCOUNT_PERCENT: u32 = 10;
pub const SILVER_DISCOUNT_PERCENT: u32 = 5;
/// One loyalty point per this much spent.
pub const SPEND_PER_POINT: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quote {
    pub subtotal: f64,
    pub birthday_discount: f64,
    pub loyalty_discount: f64,
    pub total: f64,
}

impl Quote {
    pub fn discount(&self) -> f64 {
        self.birthday_discount + self.loyalty_discount
    }
}

pub fn loyalty_discount_percent(points: i64) -> u32 {
    if points >= GOLD_POINTS {
        GOLD_DISCOUNT_PERCENT
    } else if points >= SILVER_POINTS {
        SILVER_DISCOUNT_PERCENT
    } else {
        0
    }
}

pub fn badge_for(points: i64) -> Badge {
    if points >= GOLD_POINTS {
        Badge::Gold
    } else if points >= SILVER_POINTS {
        Badge::Silver
    } else {
        Badge::Bronze
    }
}

/// True when `birthday` (`YYYY-MM-DD`) falls on the same month and day as `today`.
/// A Feb 29 birthday is celebrated on Feb 28 in non-leap years.
/// Unparseable birthdays never match.
pub fn is_birthday(birthday: Option<&str>, today: NaiveDate) -> bool {
    let Some(birthday) = birthday.and_then(|b| NaiveDate::parse_from_str(b, "%Y-%m-%d").ok())
    else {
        return false;
    };

    let (month, day) = match (birthday.month(), birthday.day()) {
        (2, 29) if NaiveDate::from_ymd_opt(today.year(), 2, 29).is_none() => (2, 28),
        other => other,
    };
    month == today.month() && day == today.day()
}

fn percent_of(amount: f64, percent: u32) -> f64 {
    (amount * f64::from(percent) / 100.0).floor()
}

/// Prices a cart. The birthday and loyalty discounts stack, each computed
/// on the undiscounted subtotal.
pub fn quote(subtotal: f64, points: i64, birthday: Option<&str>, today: NaiveDate) -> Quote {
    let birthday_discount = if is_birthday(birthday, today) {
        percent_of(subtotal, BIRTHDAY_DISCOUNT_PERCENT)
    } else {
        0.0
    };
    let loyalty_discount = percent_of(subtotal, loyalty_discount_percent(points));

    Quote {
        subtotal,
        birthday_discount,
        loyalty_discount,
        total: subtotal - birthday_discount - loyalty_discount,
    }
}

pub fn points_earned(total: f64) -> i64 {
    if total <= 0.0 {
        return 0;
    }
    (total / SPEND_PER_POINT).floor() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_tier_thresholds() {
        assert_eq!(loyalty_discount_percent(0), 0);
        assert_eq!(loyalty_discount_percent(199), 0);
        assert_eq!(loyalty_discount_percent(200), 5);
        assert_eq!(loyalty_discount_percent(499), 5);
        assert_eq!(loyalty_discount_percent(500), 10);

        assert_eq!(badge_for(100), Badge::Bronze);
        assert_eq!(badge_for(200), Badge::Silver);
        assert_eq!(badge_for(750), Badge::Gold);
    }

    #[test]
    fn test_birthday_matches_month_and_day_only() {
        let today = day(2026, 3, 14);
        assert!(is_birthday(Some("2004-03-14"), today));
        assert!(!is_birthday(Some("2004-03-15"), today));
        assert!(!is_birthday(Some("not-a-date"), today));
        assert!(!is_birthday(None, today));
    }

    #[test]
    fn test_leap_day_birthday_falls_back_to_feb_28() {
        assert!(is_birthday(Some("2004-02-29"), day(2026, 2, 28)));
        assert!(!is_birthday(Some("2004-02-29"), day(2026, 3, 1)));
        assert!(is_birthday(Some("2004-02-29"), day(2028, 2, 29)));
        assert!(!is_birthday(Some("2004-02-29"), day(2028, 2, 28)));
    }

    #[test]
    fn test_quote_without_discounts() {
        let q = quote(130.0, 100, None, day(2026, 1, 1));
        assert_eq!(q.total, 130.0);
        assert_eq!(q.discount(), 0.0);
    }

    #[test]
    fn test_loyalty_discount_is_floored() {
        // 5% of 130 = 6.5 -> 6
        let q = quote(130.0, 250, None, day(2026, 1, 1));
        assert_eq!(q.loyalty_discount, 6.0);
        assert_eq!(q.total, 124.0);
    }

    #[test]
    fn test_birthday_and_gold_discounts_stack() {
        // 15% of 90 = 13.5 -> 13, 10% of 90 = 9
        let q = quote(90.0, 600, Some("2001-07-04"), day(2026, 7, 4));
        assert_eq!(q.birthday_discount, 13.0);
        assert_eq!(q.loyalty_discount, 9.0);
        assert_eq!(q.total, 68.0);
    }

    #[test]
    fn test_points_earned() {
        assert_eq!(points_earned(0.0), 0);
        assert_eq!(points_earned(9.0), 0);
        assert_eq!(points_earned(40.0), 4);
        assert_eq!(points_earned(129.0), 12);
    }
}
