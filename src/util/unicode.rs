use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// Display width in terminal cells. Tabs count as 4 cells.
pub fn display_width(s: &str) -> usize {
    s.split('\t')
        .enumerate()
        .map(|(i, part)| {
            let w = UnicodeWidthStr::width(part);
            if i > 0 { w + 4 } else { w }
        })
        .sum()
}

/// Truncate a string to fit within `max_cells` terminal cells, appending `…` if truncated.
pub fn truncate_to_width(s: &str, max_cells: usize) -> String {
    if max_cells == 0 {
        return String::new();
    }
    if display_width(s) <= max_cells {
        return s.to_string();
    }
    if max_cells <= 1 {
        return "\u{2026}".to_string();
    }
    let budget = max_cells - 1; // reserve 1 cell for '…'
    let mut width = 0;
    let mut result = String::new();
    for grapheme in s.graphemes(true) {
        let gw = grapheme_display_width(grapheme);
        if width + gw > budget {
            break;
        }
        width += gw;
        result.push_str(grapheme);
    }
    result.push('\u{2026}');
    result
}

/// Left-align `s` in a column of `cells` terminal cells, truncating if needed
pub fn pad_to_width(s: &str, cells: usize) -> String {
    let cut = truncate_to_width(s, cells);
    let w = display_width(&cut);
    format!("{}{}", cut, " ".repeat(cells.saturating_sub(w)))
}

/// Right-align `s` in a column of `cells` terminal cells
pub fn pad_left_to_width(s: &str, cells: usize) -> String {
    let w = display_width(s);
    format!("{}{}", " ".repeat(cells.saturating_sub(w)), s)
}

fn grapheme_display_width(g: &str) -> usize {
    if g == "\t" {
        return 4;
    }
    UnicodeWidthStr::width(g)
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── display_width ──────────────────────────────────────────────

    #[test]
    fn display_width_ascii() {
        assert_eq!(display_width("hello"), 5);
    }

    #[test]
    fn display_width_cyrillic() {
        assert_eq!(display_width("Мост"), 4);
    }

    #[test]
    fn display_width_combining() {
        // й written as и + combining breve
        assert_eq!(display_width("и\u{0306}"), 1);
    }

    #[test]
    fn display_width_tab() {
        assert_eq!(display_width("a\tb"), 6);
    }

    // ── truncate_to_width ──────────────────────────────────────────

    #[test]
    fn truncate_exact_fit() {
        assert_eq!(truncate_to_width("Мост", 4), "Мост");
    }

    #[test]
    fn truncate_cyrillic() {
        assert_eq!(truncate_to_width("Водоснабжение", 6), "Водос\u{2026}");
    }

    #[test]
    fn truncate_keeps_combining_marks_together() {
        let s = "Краи\u{0306} света";
        let cut = truncate_to_width(s, 5);
        assert_eq!(cut, "Краи\u{0306}\u{2026}");
    }

    #[test]
    fn truncate_zero_and_one() {
        assert_eq!(truncate_to_width("hello", 0), "");
        assert_eq!(truncate_to_width("hello", 1), "\u{2026}");
    }

    // ── padding ────────────────────────────────────────────────────

    #[test]
    fn pad_fills_and_truncates() {
        assert_eq!(pad_to_width("М-12", 6), "М-12  ");
        assert_eq!(pad_to_width("Реконструкция", 5), "Реко\u{2026}");
        assert_eq!(pad_left_to_width("67", 4), "  67");
    }
}
