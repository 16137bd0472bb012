//! Tests for the excluded-slot bitset

#[cfg(test)]
mod tests {
    use tilemosaic::algorithm::mask::TileMask;

    // Verifies inserted slots are excluded and others stay admitted
    // Verified by setting the bit after the inserted slot
    #[test]
    fn test_mask_insert_and_contains() {
        let mut mask = TileMask::new(10);
        mask.insert(7);
        mask.insert(2);
        mask.insert(7);

        assert!(!mask.is_empty());
        assert!(mask.contains(2));
        assert!(mask.contains(7));
        assert!(!mask.contains(3));
        assert!(!mask.contains(8));
    }

    // Out-of-range slots are ignored
    #[test]
    fn test_mask_ignores_out_of_range() {
        let mut mask = TileMask::new(3);
        mask.insert(3);
        mask.insert(100);
        assert!(mask.is_empty());
        assert!(!mask.contains(100));
    }

    // Tests clear re-admits every slot so the mask can be reused
    // Verified by leaving the bits set on clear
    #[test]
    fn test_mask_clear() {
        let mut mask = TileMask::new(5);
        mask.insert(1);
        mask.insert(4);
        mask.clear();

        assert!(mask.is_empty());
        assert!(!mask.contains(1));
        assert!(!mask.contains(4));

        mask.insert(4);
        assert!(mask.contains(4));
        assert!(!mask.contains(1));
    }
}
