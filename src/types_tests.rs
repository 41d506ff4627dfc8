//! Tests for core types

#[cfg(test)]
mod tests {
    use crate::types::{ItemRef, ListingPage};
    use std::collections::HashSet;

    #[test]
    fn item_ref_equality_is_by_exact_url() {
        let a = ItemRef::new("https://item.mercari.com/jp/m111/");
        let b = ItemRef::new("https://item.mercari.com/jp/m111/");
        assert_eq!(a, b);

        // No normalization: a stray query parameter makes a distinct ref.
        let tagged = ItemRef::new("https://item.mercari.com/jp/m111/?ref=x");
        assert_ne!(a, tagged);
    }

    #[test]
    fn item_ref_hashes_by_value() {
        let mut set = HashSet::new();
        set.insert(ItemRef::new("a"));
        set.insert(ItemRef::new("a"));
        set.insert(ItemRef::new("b"));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn item_ref_displays_the_url() {
        let r = ItemRef::new("https://item.fril.jp/abc");
        assert_eq!(r.to_string(), "https://item.fril.jp/abc");
        assert_eq!(r.as_str(), "https://item.fril.jp/abc");
    }

    #[test]
    fn default_page_is_empty_and_open_ended() {
        let page = ListingPage::default();
        assert!(page.items.is_empty());
        assert_eq!(page.has_more, None);
    }
}
