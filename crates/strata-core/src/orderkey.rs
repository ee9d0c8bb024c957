//! Order-preserving key encodings.
//!
//! Every conversion here is a strictly monotonic bijection from a value's
//! natural ordering onto unsigned-integer ordering, so that composite sort
//! keys can be compared branch-free as plain integers. [`KeyCombine`] packs
//! mixed-width fields into a single 64-bit word, and [`KeyBuilder`] chains
//! up to three such words into a 192-bit [`Key3`].

// ---------------------------------------------------------------------------
// Scalar conversions
// ---------------------------------------------------------------------------

/// Map an `f64` to a `u64` that orders the same way.
///
/// Handles negatives, signed zero and infinities. `-0.0` sorts just below
/// `+0.0` (the mapping is a bijection on bit patterns).
///
/// # Panics
///
/// Panics if `v` is NaN — NaN has no position in a total order.
#[inline]
pub fn key_from_f64(v: f64) -> u64 {
    assert!(!v.is_nan(), "cannot build an order key from NaN");
    let bits = v.to_bits();
    if bits & (1 << 63) != 0 { !bits } else { bits | (1 << 63) }
}

/// Map an `f32` to a `u32` that orders the same way.
///
/// # Panics
///
/// Panics if `v` is NaN.
#[inline]
pub fn key_from_f32(v: f32) -> u32 {
    assert!(!v.is_nan(), "cannot build an order key from NaN");
    let bits = v.to_bits();
    if bits & (1 << 31) != 0 { !bits } else { bits | (1 << 31) }
}

/// Map an `i64` to a `u64` that orders the same way.
#[inline]
pub const fn key_from_i64(v: i64) -> u64 {
    (v as u64) ^ (1 << 63)
}

/// Map an `i32` to a `u32` that orders the same way.
#[inline]
pub const fn key_from_i32(v: i32) -> u32 {
    (v as u32) ^ (1 << 31)
}

/// Pack two 64-bit order keys into one 128-bit key, `primary` in the high
/// bits. The result orders by `primary` first, then `secondary`.
#[inline]
pub const fn combine(primary: u64, secondary: u64) -> u128 {
    ((primary as u128) << 64) | secondary as u128
}

// ---------------------------------------------------------------------------
// KeyCombine
// ---------------------------------------------------------------------------

/// A 64-bit accumulator that packs fields most-significant-first.
///
/// Fields are appended in declaration order at decreasing bit offsets, so
/// the finished word compares like the tuple of its fields. The accumulator
/// tracks how many bits have been filled; capacity is 64.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyCombine {
    word: u64,
    used: u32,
}

impl KeyCombine {
    /// Bit capacity of one word.
    pub const CAPACITY: u32 = 64;

    /// Create an empty accumulator.
    pub const fn new() -> Self {
        Self { word: 0, used: 0 }
    }

    /// Append the low `width` bits of `field`.
    ///
    /// # Panics
    ///
    /// Panics when `width` is not in `1..=64`, when `field` has bits set
    /// above `width`, or when the append would exceed the 64-bit capacity.
    pub fn append(&mut self, field: u64, width: u32) {
        check_field(field, width);
        assert!(
            self.used + width <= Self::CAPACITY,
            "order-key capacity exceeded: {} bits used, {width} more requested",
            self.used
        );
        self.push_bits(field, width);
    }

    /// Append a single-bit boolean field.
    pub fn append_bool(&mut self, flag: bool) {
        self.append(flag as u64, 1);
    }

    /// Append a field, spilling into a fresh word on overflow.
    ///
    /// When the field does not fit, the current word is topped up with the
    /// field's high bits and returned, and the accumulator restarts with
    /// the field's remaining low bits. A sequence of words produced this
    /// way still compares in field order.
    pub fn append_spilling(&mut self, field: u64, width: u32) -> Option<u64> {
        check_field(field, width);
        let remaining = Self::CAPACITY - self.used;
        if width <= remaining {
            self.push_bits(field, width);
            return None;
        }
        let spill = width - remaining;
        if remaining > 0 {
            self.push_bits(field >> spill, remaining);
        }
        let full = self.word;
        self.word = 0;
        self.used = 0;
        let low = if spill == 64 { field } else { field & ((1 << spill) - 1) };
        self.push_bits(low, spill);
        Some(full)
    }

    /// Number of bits filled so far.
    #[inline]
    pub const fn len(&self) -> u32 {
        self.used
    }

    /// Whether no bits have been filled.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.used == 0
    }

    /// The accumulated word. Unfilled low bits are zero.
    #[inline]
    pub const fn word(&self) -> u64 {
        self.word
    }

    /// Reset to empty.
    pub fn clear(&mut self) {
        self.word = 0;
        self.used = 0;
    }

    #[inline]
    fn push_bits(&mut self, field: u64, width: u32) {
        self.used += width;
        self.word |= field << (Self::CAPACITY - self.used);
    }
}

fn check_field(field: u64, width: u32) {
    assert!(
        (1..=64).contains(&width),
        "field width must be between 1 and 64, got {width}"
    );
    assert!(
        width == 64 || field >> width == 0,
        "field {field:#x} does not fit in {width} bits"
    );
}

// ---------------------------------------------------------------------------
// KeyBuilder / Key3
// ---------------------------------------------------------------------------

/// A 192-bit composite order key: three 64-bit words compared
/// lexicographically, most significant first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Key3(pub [u64; 3]);

/// Builds a [`Key3`] from an ordered list of mixed-width fields.
///
/// Fields are packed through [`KeyCombine::append_spilling`], so a field
/// may straddle a word boundary; the resulting key still compares
/// field-by-field against keys built with the same field layout.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyBuilder {
    words: [u64; 3],
    filled: usize,
    acc: KeyCombine,
}

impl KeyBuilder {
    /// Create an empty builder.
    pub const fn new() -> Self {
        Self {
            words: [0; 3],
            filled: 0,
            acc: KeyCombine::new(),
        }
    }

    /// Append the low `width` bits of `field`.
    ///
    /// # Panics
    ///
    /// Panics when the total appended width would exceed 192 bits, or on
    /// the same field/width violations as [`KeyCombine::append`].
    pub fn append(&mut self, field: u64, width: u32) {
        if let Some(full) = self.acc.append_spilling(field, width) {
            assert!(
                self.filled < 2,
                "composite key capacity exceeded: more than 192 bits appended"
            );
            self.words[self.filled] = full;
            self.filled += 1;
        }
    }

    /// Append a single-bit boolean field.
    pub fn append_bool(&mut self, flag: bool) {
        self.append(flag as u64, 1);
    }

    /// Number of bits appended so far.
    pub const fn len(&self) -> u32 {
        self.filled as u32 * KeyCombine::CAPACITY + self.acc.len()
    }

    /// Whether no bits have been appended.
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Finalize into a [`Key3`]. Unfilled trailing bits are zero.
    pub fn finish(self) -> Key3 {
        let mut words = self.words;
        if self.filled < 3 && !self.acc.is_empty() {
            words[self.filled] = self.acc.word();
        }
        Key3(words)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn f64_keys_are_monotonic() {
        let ordered = [
            f64::NEG_INFINITY,
            -1e300,
            -3.5,
            -1.0,
            -1e-300,
            -0.0,
            0.0,
            1e-300,
            1.0,
            2.5,
            1e300,
            f64::INFINITY,
        ];
        for pair in ordered.windows(2) {
            assert!(
                key_from_f64(pair[0]) < key_from_f64(pair[1]),
                "{} should key below {}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    #[should_panic(expected = "NaN")]
    fn f64_nan_is_rejected() {
        key_from_f64(f64::NAN);
    }

    #[test]
    #[should_panic(expected = "NaN")]
    fn f32_nan_is_rejected() {
        key_from_f32(f32::NAN);
    }

    #[test]
    fn f32_keys_are_monotonic() {
        let ordered = [f32::NEG_INFINITY, -2.5, -0.0, 0.0, 1.5, f32::INFINITY];
        for pair in ordered.windows(2) {
            assert!(key_from_f32(pair[0]) < key_from_f32(pair[1]));
        }
    }

    #[test]
    fn integer_keys_are_monotonic() {
        let ordered = [i64::MIN, -77, -1, 0, 1, 42, i64::MAX];
        for pair in ordered.windows(2) {
            assert!(key_from_i64(pair[0]) < key_from_i64(pair[1]));
        }
        let ordered = [i32::MIN, -5, 0, 7, i32::MAX];
        for pair in ordered.windows(2) {
            assert!(key_from_i32(pair[0]) < key_from_i32(pair[1]));
        }
    }

    #[test]
    fn combine_orders_primary_first() {
        assert!(combine(1, u64::MAX) < combine(2, 0));
        assert!(combine(1, 3) < combine(1, 4));
        assert_eq!(combine(7, 9), combine(7, 9));
    }

    #[test]
    fn eight_full_bytes_fill_the_word() {
        let mut kc = KeyCombine::new();
        for _ in 0..8 {
            kc.append(0xFF, 8);
        }
        assert_eq!(kc.word(), u64::MAX);
        assert_eq!(kc.len(), 64);
    }

    #[test]
    #[should_panic(expected = "capacity exceeded")]
    fn ninth_byte_overflows() {
        let mut kc = KeyCombine::new();
        for _ in 0..8 {
            kc.append(0xFF, 8);
        }
        kc.append(0, 1);
    }

    #[test]
    #[should_panic(expected = "does not fit")]
    fn oversized_field_is_rejected() {
        let mut kc = KeyCombine::new();
        kc.append(0x1FF, 8);
    }

    #[test]
    fn packed_words_order_like_field_tuples() {
        let pack = |a: u64, b: u64| {
            let mut kc = KeyCombine::new();
            kc.append(a, 16);
            kc.append(b, 16);
            kc.word()
        };
        assert!(pack(1, 2) < pack(1, 3));
        assert!(pack(1, 0xFFFF) < pack(2, 0));
        assert_eq!(pack(5, 5), pack(5, 5));
    }

    #[test]
    fn bool_fields_pack_most_significant_first() {
        let mut kc = KeyCombine::new();
        kc.append_bool(true);
        kc.append_bool(false);
        assert_eq!(kc.word(), 1 << 63);
        assert_eq!(kc.len(), 2);
    }

    #[test]
    fn clear_resets_the_accumulator() {
        let mut kc = KeyCombine::new();
        kc.append(0xAB, 8);
        kc.clear();
        assert!(kc.is_empty());
        assert_eq!(kc.word(), 0);
    }

    #[test]
    fn spilling_append_splits_across_words() {
        let mut kc = KeyCombine::new();
        assert_eq!(kc.append_spilling(0xAAAA, 40), None);
        // 40 bits used; a 40-bit field spills 16 bits into a fresh word.
        let full = kc.append_spilling(0xFF_FFFF_FFFF, 40).expect("should spill");
        assert_eq!(full, (0xAAAA_u64 << 24) | 0xFF_FFFF);
        assert_eq!(kc.len(), 16);
        assert_eq!(kc.word() >> 48, 0xFFFF);
    }

    #[test]
    fn spilling_on_a_full_word_hands_it_back_whole() {
        let mut kc = KeyCombine::new();
        kc.append(u64::MAX, 64);
        let full = kc.append_spilling(0b101, 3).expect("word was full");
        assert_eq!(full, u64::MAX);
        assert_eq!(kc.len(), 3);
        assert_eq!(kc.word() >> 61, 0b101);
    }

    #[test]
    fn builder_keys_order_like_field_sequences() {
        let build = |a: u64, b: u64, c: u64| {
            let mut kb = KeyBuilder::new();
            kb.append(a, 64);
            kb.append(b, 64);
            kb.append(c, 64);
            kb.finish()
        };
        assert!(build(1, 0, 0) < build(1, 0, 1));
        assert!(build(1, u64::MAX, u64::MAX) < build(2, 0, 0));
        assert_eq!(build(3, 4, 5), build(3, 4, 5));
    }

    #[test]
    fn builder_handles_fields_straddling_word_boundaries() {
        let build = |fields: &[(u64, u32)]| {
            let mut kb = KeyBuilder::new();
            for &(f, w) in fields {
                kb.append(f, w);
            }
            kb.finish()
        };
        // 50 + 50 bits: the second field straddles the first word boundary.
        let lo = build(&[(7, 50), (100, 50)]);
        let hi = build(&[(7, 50), (101, 50)]);
        assert!(lo < hi);
        let bigger_first = build(&[(8, 50), (0, 50)]);
        assert!(hi < bigger_first);
    }

    #[test]
    #[should_panic(expected = "192 bits")]
    fn builder_overflow_panics() {
        let mut kb = KeyBuilder::new();
        for _ in 0..4 {
            kb.append(0, 64);
        }
    }

    #[test]
    fn builder_length_tracks_total_bits() {
        let mut kb = KeyBuilder::new();
        assert!(kb.is_empty());
        kb.append(1, 30);
        kb.append(1, 40);
        assert_eq!(kb.len(), 70);
    }
}
