//! Physical keypad layout: three rotary encoders followed by fifteen keys.

pub const ENCODER_COUNT: usize = 3;
pub const KEY_COUNT: usize = 15;
pub const SLOT_COUNT: usize = ENCODER_COUNT + KEY_COUNT;

/// Label for a slot index, e.g. `Enc 2` or `Key 7`
#[must_use]
pub fn slot_label(index: usize) -> Option<String> {
    if index < ENCODER_COUNT {
        Some(format!("Enc {}", index + 1))
    } else if index < SLOT_COUNT {
        Some(format!("Key {}", index - ENCODER_COUNT + 1))
    } else {
        None
    }
}

#[must_use]
pub fn slot_labels() -> Vec<String> {
    (0..SLOT_COUNT).filter_map(slot_label).collect()
}

/// Resolve a slot identifier to its index.
///
/// Accepts a zero-based index (`"4"`) or a label compared case-insensitively
/// with whitespace ignored (`"key 2"`, `"KEY2"`).
#[must_use]
pub fn resolve_slot(id: &str) -> Option<usize> {
    let id = id.trim();
    if id.is_empty() {
        return None;
    }

    if let Ok(index) = id.parse::<usize>() {
        return (index < SLOT_COUNT).then_some(index);
    }

    let wanted = normalize(id);
    (0..SLOT_COUNT)
        .find(|&index| slot_label(index).is_some_and(|label| normalize(&label) == wanted))
}

fn normalize(label: &str) -> String {
    label
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_labels() {
        let labels = slot_labels();
        assert_eq!(labels.len(), 18);
        assert_eq!(labels[0], "Enc 1");
        assert_eq!(labels[2], "Enc 3");
        assert_eq!(labels[3], "Key 1");
        assert_eq!(labels[17], "Key 15");
        assert!(slot_label(18).is_none());
    }

    #[test]
    fn test_resolve_slot_by_index() {
        assert_eq!(resolve_slot("0"), Some(0));
        assert_eq!(resolve_slot(" 17 "), Some(17));
        assert_eq!(resolve_slot("18"), None);
    }

    #[test]
    fn test_resolve_slot_by_label() {
        assert_eq!(resolve_slot("Enc 1"), Some(0));
        assert_eq!(resolve_slot("key 1"), Some(3));
        assert_eq!(resolve_slot("KEY15"), Some(17));
        assert_eq!(resolve_slot("Key 16"), None);
        assert_eq!(resolve_slot(""), None);
        assert_eq!(resolve_slot("knob"), None);
    }
}
