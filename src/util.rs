use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

pub const SHORT_NAME_MAX_CHARS: usize = 30;

/// Caps a display name at [`SHORT_NAME_MAX_CHARS`] characters, appending an
/// ellipsis when anything was cut.
pub fn short_name(name: &str) -> String {
    if name.chars().count() <= SHORT_NAME_MAX_CHARS {
        return name.to_owned();
    }

    let mut truncated = name
        .chars()
        .take(SHORT_NAME_MAX_CHARS)
        .collect::<String>();
    truncated.push('…');
    truncated
}

pub fn stable_hash(id: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    id.hash(&mut hasher);
    hasher.finish()
}

pub fn format_percent(scale: f32) -> String {
    format!("{:.0}%", scale * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_names_pass_through_untouched() {
        assert_eq!(short_name("Alpha Miner"), "Alpha Miner");
        let exact = "x".repeat(SHORT_NAME_MAX_CHARS);
        assert_eq!(short_name(&exact), exact);
    }

    #[test]
    fn long_names_are_cut_on_char_boundaries() {
        let name = "Ä".repeat(40);
        let short = short_name(&name);
        assert_eq!(short.chars().count(), SHORT_NAME_MAX_CHARS + 1);
        assert!(short.ends_with('…'));
    }

    #[test]
    fn percent_rounds_to_whole_numbers() {
        assert_eq!(format_percent(1.0), "100%");
        assert_eq!(format_percent(0.456), "46%");
    }
}
