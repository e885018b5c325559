use proptest::prelude::*;
use stylist_fs::NormalizedPath;

proptest! {
    #[test]
    fn test_clean_is_idempotent(s in "[a-z./]{0,24}") {
        let once = NormalizedPath::new(&s).clean();
        let twice = once.clean();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn test_clean_has_no_empty_or_dot_segments(s in "[a-z./]{0,24}") {
        let cleaned = NormalizedPath::new(&s).clean();
        let text = cleaned.as_str();
        prop_assert!(!text.contains("//"));
        prop_assert!(!text.contains("/./"));
        prop_assert!(!text.ends_with("/.") || text == "/.");
    }
}
