/// Digits kept after the decimal point when printing a number.
pub const FRACTION_DIGITS: usize = 9;

/// Upper bound on the length of [`fmt_number`]'s output for any `f64`.
pub(crate) const MAX_NUMBER_TEXT: usize = 309 + 1 + 1 + FRACTION_DIGITS;

/// Formats `x` the way traces and results print it: fixed point, at most
/// [`FRACTION_DIGITS`] decimals, no trailing zeros, no negative zero.
pub fn fmt_number(x: f64) -> String {
    if !x.is_finite() {
        return x.to_string();
    }
    let mut s = format!("{:.*}", FRACTION_DIGITS, x);
    if s.contains('.') {
        let trimmed = s.trim_end_matches('0').trim_end_matches('.').len();
        s.truncate(trimmed);
    }
    if s == "-0" {
        s.remove(0);
    }
    s
}

/// Longest text [`fmt_number`] can produce for a value with `|x| <= max_abs`.
pub(crate) fn number_text_bound(max_abs: f64) -> usize {
    if !max_abs.is_finite() {
        return MAX_NUMBER_TEXT;
    }
    // sign, decimal point and one digit of rounding carry
    let integral = format!("{:.0}", max_abs.abs()).len();
    (integral + 3 + FRACTION_DIGITS).min(MAX_NUMBER_TEXT)
}

/// Decimal digits of `x`.
pub(crate) fn digits(mut x: u64) -> usize {
    let mut n = 1;
    while x >= 10 {
        x /= 10;
        n += 1;
    }
    n
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fmt_number() {
        assert_eq!(fmt_number(14.0), "14");
        assert_eq!(fmt_number(-3.0), "-3");
        assert_eq!(fmt_number(2.5), "2.5");
        assert_eq!(fmt_number(1.0 / 3.0), "0.333333333");
        assert_eq!(fmt_number(2.0 / 3.0), "0.666666667");
        assert_eq!(fmt_number(100.0), "100");
        assert_eq!(fmt_number(0.0000000001), "0");
        assert_eq!(fmt_number(-0.0), "0");
        assert_eq!(fmt_number(-0.0000000001), "0");
        assert_eq!(fmt_number(f64::INFINITY), "inf");
        assert_eq!(fmt_number(f64::NEG_INFINITY), "-inf");
        assert_eq!(fmt_number(f64::NAN), "NaN");
    }

    #[test]
    fn test_number_text_bound() {
        for x in [0.0, 0.5, 9.9999999999, 12.125, -1234.5, 1e15, f64::MAX] {
            assert!(fmt_number(x).len() <= number_text_bound(x.abs()), "{}", x);
        }
        assert_eq!(fmt_number(-f64::MAX).len(), MAX_NUMBER_TEXT - FRACTION_DIGITS - 1);
        assert_eq!(number_text_bound(f64::INFINITY), MAX_NUMBER_TEXT);
    }

    #[test]
    fn test_digits() {
        assert_eq!(digits(0), 1);
        assert_eq!(digits(9), 1);
        assert_eq!(digits(10), 2);
        assert_eq!(digits(u64::MAX), 20);
    }
}
