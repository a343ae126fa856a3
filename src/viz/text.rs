//! Text measurement and truncation utilities.

/// Heuristic: estimate pixel width of text (Plotters has no built-in text measuring).
pub fn estimate_text_width_px(text: &str, font_px: u32) -> u32 {
    ((text.chars().count() as f32) * (font_px as f32) * 0.60).ceil() as u32
}

/// Truncate to fit `max_px` and add a single ellipsis if needed.
pub fn truncate_to_width(text: &str, font_px: u32, max_px: u32) -> String {
    if estimate_text_width_px(text, font_px) <= max_px {
        return text.to_string();
    }
    let mut out = String::new();
    for ch in text.chars() {
        let candidate = format!("{out}{ch}…");
        if estimate_text_width_px(&candidate, font_px) > max_px {
            break;
        }
        out.push(ch);
    }
    out.push('…');
    out
}

/// Left edge for a label centered on `center_x`, kept inside `[0, total_w]`.
pub fn centered_label_x(label: &str, font_px: u32, center_x: i32, total_w: i32) -> i32 {
    let w = estimate_text_width_px(label, font_px) as i32;
    (center_x - w / 2).clamp(0, (total_w - w).max(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_untouched() {
        assert_eq!(truncate_to_width("Chad", 10, 200), "Chad");
    }

    #[test]
    fn long_text_gets_single_ellipsis() {
        let s = truncate_to_width("Democratic Republic of the Congo", 10, 60);
        assert!(s.ends_with('…'));
        assert_eq!(s.matches('…').count(), 1);
        assert!(estimate_text_width_px(&s, 10) <= 60);
    }

    #[test]
    fn labels_stay_on_canvas() {
        assert_eq!(centered_label_x("-12.3°C", 12, 0, 400), 0);
        let right = centered_label_x("+12.3%", 12, 400, 400);
        assert!(right + estimate_text_width_px("+12.3%", 12) as i32 <= 400);
    }
}
