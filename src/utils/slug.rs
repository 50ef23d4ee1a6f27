pub fn to_slug(val: &str) -> String {
    val.trim()
        .to_lowercase()
        .replace(|c: char| !c.is_ascii_alphanumeric() && c != ' ' && c != '_' && c != '-', "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

pub fn is_slug(val: &str) -> bool {
    !val.is_empty()
        && val
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_slug() {
        assert_eq!(to_slug("  Favourite Drink! "), "favourite-drink");
        assert_eq!(to_slug("t-shirt_size"), "t-shirt_size");
        assert!(is_slug(&to_slug("Diet (vegan?)")));
    }

    #[test]
    fn test_is_slug() {
        assert!(is_slug("drink"));
        assert!(is_slug("plus_one-2"));
        assert!(!is_slug("Drink"));
        assert!(!is_slug("two words"));
        assert!(!is_slug(""));
    }
}
