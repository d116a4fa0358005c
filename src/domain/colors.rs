//! Event color palette and the category → color defaults.

use crate::domain::models::EventCategory;

pub const BLUE: &str = "#3b82f6";
pub const PURPLE: &str = "#8b5cf6";
pub const ORANGE: &str = "#f97316";
pub const GREEN: &str = "#10b981";
pub const PINK: &str = "#ec4899";
pub const RED: &str = "#ef4444";
pub const YELLOW: &str = "#eab308";
pub const TEAL: &str = "#14b8a6";
pub const INDIGO: &str = "#6366f1";

/// Color used for due-dated tasks shown on the calendar.
pub const TASK_ENTRY_COLOR: &str = INDIGO;

pub const PALETTE: &[&str] = &[BLUE, PURPLE, ORANGE, GREEN, PINK, RED, YELLOW, TEAL, INDIGO];

pub fn default_color_for(category: &str) -> &'static str {
    match category.trim().to_ascii_lowercase().as_str() {
        "school" => BLUE,
        "personal" => PURPLE,
        "work" => ORANGE,
        "meeting" => GREEN,
        "other" => PINK,
        _ => BLUE,
    }
}

/// Looks a color up in the palette, ignoring case.
pub fn palette_color(value: &str) -> Option<&'static str> {
    let value = value.trim();
    PALETTE
        .iter()
        .copied()
        .find(|candidate| candidate.eq_ignore_ascii_case(value))
}

/// Picks the color an event ends up with.
///
/// A category change always recolors to the category default. Otherwise an
/// explicit (already palette-checked) color wins, then the stored one, then
/// the default.
pub fn resolve_color(
    category: EventCategory,
    explicit: Option<&'static str>,
    previous: Option<&str>,
    category_changed: bool,
) -> &'static str {
    if category_changed {
        return category.default_color();
    }
    explicit
        .or_else(|| previous.and_then(palette_color))
        .unwrap_or_else(|| category.default_color())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_category_table() {
        assert_eq!(default_color_for("School"), BLUE);
        assert_eq!(default_color_for("Personal"), PURPLE);
        assert_eq!(default_color_for("Work"), ORANGE);
        assert_eq!(default_color_for("Meeting"), GREEN);
        assert_eq!(default_color_for("Other"), PINK);
    }

    #[test]
    fn unknown_category_defaults_to_blue() {
        assert_eq!(default_color_for("Gardening"), BLUE);
        assert_eq!(default_color_for(""), BLUE);
    }

    #[test]
    fn palette_lookup_ignores_case() {
        assert_eq!(palette_color("#EF4444"), Some(RED));
        assert_eq!(palette_color("#123456"), None);
    }

    #[test]
    fn explicit_color_overrides_default() {
        assert_eq!(resolve_color(EventCategory::Work, Some(TEAL), None, false), TEAL);
        assert_eq!(resolve_color(EventCategory::Work, None, None, false), ORANGE);
    }

    #[test]
    fn stored_color_survives_edits_without_category_change() {
        assert_eq!(resolve_color(EventCategory::Work, None, Some(RED), false), RED);
    }

    #[test]
    fn category_change_forces_recolor() {
        assert_eq!(
            resolve_color(EventCategory::Meeting, Some(TEAL), Some(RED), true),
            GREEN
        );
    }
}
