//! Text measurement and label formatting.

/// Measures how wide a string renders, in pixels.
pub trait TextMeasure: Send + Sync {
    fn width(&self, text: &str, size: f64, bold: bool) -> f64;
}

/// Advance widths from the Helvetica AFM tables (1/1000 em).
///
/// Badges are drawn with `'Helvetica Neue', Arial, sans-serif`; Arial shares
/// Helvetica's metrics, so these widths match what viewers actually render
/// closely enough for layout decisions.
#[derive(Debug, Clone, Copy, Default)]
pub struct HelveticaMetrics;

impl HelveticaMetrics {
    fn advance(c: char, bold: bool) -> u32 {
        match (c, bold) {
            ('0'..='9', _) => 556,
            (' ', _) | (',', _) | ('.', _) | ('/', _) => 278,
            (':', false) | (';', false) | ('!', false) => 278,
            (':', true) | (';', true) | ('!', true) => 333,
            ('%', _) => 889,
            ('-', _) | ('(', _) | (')', _) => 333,
            ('£', _) | ('$', _) | ('€', _) | ('#', _) => 556,
            ('&', false) => 667,
            ('&', true) => 722,
            ('?', false) => 556,
            ('?', true) => 611,
            ('\'', false) => 191,
            ('\'', true) => 238,

            ('I', _) => 278,
            ('J', false) => 500,
            ('J', true) => 556,
            ('L', false) => 556,
            ('L', true) => 611,
            ('M', _) => 833,
            ('W', _) => 944,
            ('C' | 'D' | 'H' | 'N' | 'R' | 'U', _) => 722,
            ('G' | 'O' | 'Q', _) => 778,
            ('A' | 'B' | 'K', false) => 667,
            ('A' | 'B' | 'K', true) => 722,
            ('F' | 'T' | 'Z', _) => 611,
            ('A'..='Z', _) => 667,

            ('i' | 'j' | 'l', false) => 222,
            ('i' | 'j' | 'l', true) => 278,
            ('f' | 't', false) => 278,
            ('f' | 't', true) => 333,
            ('r', false) => 333,
            ('r', true) => 389,
            ('m', false) => 833,
            ('m', true) => 889,
            ('w', false) => 722,
            ('w', true) => 778,
            ('c' | 'k' | 's' | 'v' | 'x' | 'y' | 'z', false) => 500,
            ('z', true) => 500,
            ('c' | 'k' | 's' | 'v' | 'x' | 'y', true) => 556,
            ('a' | 'e', _) => 556,
            ('a'..='z', false) => 556,
            ('a'..='z', true) => 611,

            (_, false) => 556,
            (_, true) => 611,
        }
    }
}

impl TextMeasure for HelveticaMetrics {
    fn width(&self, text: &str, size: f64, bold: bool) -> f64 {
        let units: u32 = text.chars().map(|c| Self::advance(c, bold)).sum();
        f64::from(units) * size / 1000.0
    }
}

/// Format a currency amount as whole units with `,` thousands separators,
/// e.g. `£50,000`.
///
/// Fractions are rounded to the nearest unit; negative and non-finite input
/// renders as zero. Amounts beyond `u64::MAX` are capped there.
pub fn format_money(amount: f64, symbol: &str) -> String {
    let units = if amount.is_finite() && amount > 0.0 {
        amount.round().min(u64::MAX as f64) as u64
    } else {
        0
    };
    format!("{symbol}{}", group_thousands(units))
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Escape text for inclusion in XML character data or attribute values.
pub fn xml_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn money_has_separators_and_no_decimals() {
        assert_eq!(format_money(50_000.0, "£"), "£50,000");
        assert_eq!(format_money(1_234_567.0, "£"), "£1,234,567");
        assert_eq!(format_money(999.0, "£"), "£999");
        assert_eq!(format_money(1_000.0, "$"), "$1,000");
        assert_eq!(format_money(0.0, "£"), "£0");
    }

    #[test]
    fn money_rounds_to_whole_units() {
        assert_eq!(format_money(1_499.49, "£"), "£1,499");
        assert_eq!(format_money(1_499.5, "£"), "£1,500");
        assert_eq!(format_money(-20.0, "£"), "£0");
        assert_eq!(format_money(f64::NAN, "£"), "£0");
    }

    #[test]
    fn money_is_capped_at_u64_max() {
        assert_eq!(format_money(1e20, "£"), "£18,446,744,073,709,551,615");
        assert_eq!(format_money(f64::INFINITY, "£"), "£0");
    }

    #[test]
    fn digit_widths_scale_with_size() {
        let m = HelveticaMetrics;
        assert!((m.width("100%", 16.0, true) - 40.912).abs() < 1e-9);
        assert!((m.width("10", 10.0, false) - 11.12).abs() < 1e-9);
        assert_eq!(m.width("", 32.0, true), 0.0);
    }

    #[test]
    fn bold_is_never_narrower() {
        let m = HelveticaMetrics;
        let sample = "Campaign Ended: 9d 23h 59m (£50,000 raised!)";
        assert!(m.width(sample, 20.0, true) >= m.width(sample, 20.0, false));
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(xml_escape("A & B <c> \"d\""), "A &amp; B &lt;c&gt; &quot;d&quot;");
    }
}
