//! Field normalization shared by every site adapter.
//!
//! All functions are pure and total: `None`, empty and whitespace-only
//! input map to `None`, and malformed input is cleaned as far as possible
//! rather than rejected.

/// Labels that prefix a price on some cards ("Condomínio R$ 450").
const PRICE_LABELS: [&str; 4] = ["Condomínio", "Condominio", "Cond.", "IPTU"];

/// Reduce a price line to its first amount.
///
/// Labels and the currency symbol are dropped, then the leading run of
/// digits, thousands dots and decimal comma is kept without the dots:
/// `"R$ 350.000"` becomes `"350000"` and `"IPTU R$ 120 Condomínio R$ 450"`
/// becomes `"120"`. A line without digits ("Sob consulta") is returned
/// trimmed. Reapplying to a cleaned value is a no-op.
pub fn clean_price(raw: Option<&str>) -> Option<String> {
    let raw = raw?.trim();
    let mut text = raw.to_string();
    // Removing a label can splice a new one together; stop at the fixed point.
    loop {
        let next = strip_price_noise(&text);
        if next == text {
            break;
        }
        text = next;
    }

    let Some(start) = text.find(|c: char| c.is_ascii_digit()) else {
        return if text.trim().is_empty() {
            None
        } else {
            non_empty(raw.to_string())
        };
    };
    let amount: String = text[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .filter(|c| *c != '.')
        .collect();
    non_empty(amount.trim_end_matches(',').to_string())
}

fn strip_price_noise(text: &str) -> String {
    let mut out = text.to_string();
    for label in PRICE_LABELS {
        out = out.replace(label, "");
    }
    out.replace("R$", "")
}

/// Keep the neighborhood: the text before the first comma.
///
/// `"Meireles, Fortaleza - CE"` becomes `"Meireles"`; a line without a
/// comma is returned unchanged apart from trimming.
pub fn truncate_address(raw: Option<&str>) -> Option<String> {
    let text = raw?;
    let head = text.split(',').next().unwrap_or(text);
    non_empty(head.trim().to_string())
}

/// Reduce an area label such as `"120 m²"` to its leading figure.
pub fn clean_area(raw: Option<&str>) -> Option<String> {
    let text = raw?.replace("m²", " ");
    let first = text.split_whitespace().next()?;
    non_empty(first.to_string())
}

/// Collapse runs of whitespace and trim.
pub fn clean_text(raw: Option<&str>) -> Option<String> {
    let joined = raw?.split_whitespace().collect::<Vec<_>>().join(" ");
    non_empty(joined)
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() { None } else { Some(s) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_and_empty_inputs() {
        for f in [clean_price, truncate_address, clean_area, clean_text] {
            assert_eq!(f(None), None);
            assert_eq!(f(Some("")), None);
            assert_eq!(f(Some("   ")), None);
        }
    }

    #[test]
    fn test_clean_price() {
        assert_eq!(clean_price(Some("R$ 350.000")).as_deref(), Some("350000"));
        assert_eq!(clean_price(Some("R$\u{a0}1.250.000")).as_deref(), Some("1250000"));
        assert_eq!(clean_price(Some("Condomínio R$ 450")).as_deref(), Some("450"));
        assert_eq!(clean_price(Some("Cond. R$ 1.200")).as_deref(), Some("1200"));
        assert_eq!(clean_price(Some("R$")), None);
        assert_eq!(clean_price(Some("R$ 1.200,50")).as_deref(), Some("1200,50"));
    }

    #[test]
    fn test_clean_price_keeps_first_amount_only() {
        assert_eq!(
            clean_price(Some("IPTU R$ 120 Condomínio R$ 450")).as_deref(),
            Some("120")
        );
        assert_eq!(
            clean_price(Some("Cond. R$ 800 • IPTU R$ 120")).as_deref(),
            Some("800")
        );
    }

    #[test]
    fn test_clean_price_without_digits_is_trimmed_text() {
        assert_eq!(
            clean_price(Some("  Sob consulta ")).as_deref(),
            Some("Sob consulta")
        );
        let once = clean_price(Some("Sob consulta"));
        assert_eq!(clean_price(once.as_deref()), once);
    }

    #[test]
    fn test_clean_price_idempotent() {
        let once = clean_price(Some("R$ 350.000"));
        assert_eq!(clean_price(once.as_deref()), once);
        assert_eq!(clean_price(Some("350000")).as_deref(), Some("350000"));
    }

    #[test]
    fn test_truncate_address() {
        assert_eq!(
            truncate_address(Some("Meireles, Fortaleza - CE")).as_deref(),
            Some("Meireles")
        );
        assert_eq!(truncate_address(Some("Meireles")).as_deref(), Some("Meireles"));
        assert_eq!(truncate_address(Some(", Fortaleza")), None);
    }

    #[test]
    fn test_clean_area() {
        assert_eq!(clean_area(Some("120 m²")).as_deref(), Some("120"));
        assert_eq!(clean_area(Some("85m²")).as_deref(), Some("85"));
        assert_eq!(clean_area(Some("300 metros quadrados")).as_deref(), Some("300"));
    }

    #[test]
    fn test_clean_text() {
        assert_eq!(
            clean_text(Some("  Casa com\n   3 quartos ")).as_deref(),
            Some("Casa com 3 quartos")
        );
    }
}
