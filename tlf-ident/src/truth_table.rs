// SPDX-License-Identifier: Apache-2.0

//! Complete single-output Boolean function truth tables.
//!
//! Bit `i` of a table holds the output value on the input assignment encoded
//! by `i`: variable `j` takes the value `(i >> j) & 1`. That is, variable 0 is
//! the least-significant selector bit and toggles fastest.
//!
//! Storage is a vector of `u64` words. Tables over fewer than six variables
//! live in the low `2^n` bits of a single word and the bits above `2^n` are
//! kept zero.

use std::fmt;
use std::ops::{BitAnd, BitOr, BitXor, Not};

/// Largest variable count a table may carry (`2^24` bits, 2 MiB of words).
pub const MAX_VARS: usize = 24;

/// Projection masks for the variables that toggle within a single word.
pub(crate) const VAR_MASKS: [u64; 6] = [
    0xAAAA_AAAA_AAAA_AAAA,
    0xCCCC_CCCC_CCCC_CCCC,
    0xF0F0_F0F0_F0F0_F0F0,
    0xFF00_FF00_FF00_FF00,
    0xFFFF_0000_FFFF_0000,
    0xFFFF_FFFF_0000_0000,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TruthTableError {
    TooManyVars {
        num_vars: usize,
    },
    WordCountMismatch {
        num_vars: usize,
        expected: usize,
        got: usize,
    },
    StrayBits {
        num_vars: usize,
    },
    NotPowerOfTwo {
        len: usize,
    },
    LengthMismatch {
        num_vars: usize,
        expected: usize,
        got: usize,
    },
    InvalidDigit {
        digit: char,
        position: usize,
    },
}

impl fmt::Display for TruthTableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooManyVars { num_vars } => write!(
                f,
                "truth table has {} variables; at most {} are supported",
                num_vars, MAX_VARS
            ),
            Self::WordCountMismatch {
                num_vars,
                expected,
                got,
            } => write!(
                f,
                "truth table over {} variables needs {} words, got {}",
                num_vars, expected, got
            ),
            Self::StrayBits { num_vars } => write!(
                f,
                "truth table over {} variables has bits set above 2^{}",
                num_vars, num_vars
            ),
            Self::NotPowerOfTwo { len } => {
                write!(f, "truth table length {} is not a power of two", len)
            }
            Self::LengthMismatch {
                num_vars,
                expected,
                got,
            } => write!(
                f,
                "truth table string for {} variables needs {} digits, got {}",
                num_vars, expected, got
            ),
            Self::InvalidDigit { digit, position } => {
                write!(f, "invalid digit {:?} at position {}", digit, position)
            }
        }
    }
}

impl std::error::Error for TruthTableError {}

/// Number of `u64` words backing a table over `num_vars` variables.
#[inline]
pub fn word_count(num_vars: usize) -> usize {
    if num_vars <= 6 {
        1
    } else {
        1usize << (num_vars - 6)
    }
}

/// Mask of the bits that may be set in each word of a table over `num_vars`
/// variables.
#[inline]
pub fn valid_mask(num_vars: usize) -> u64 {
    if num_vars >= 6 {
        u64::MAX
    } else {
        (1u64 << (1u32 << num_vars)) - 1
    }
}

/// Splits a flat assignment index into its `(word, bit offset)` address.
#[inline]
pub fn word_and_offset(index: usize) -> (usize, u32) {
    (index >> 6, (index & 63) as u32)
}

/// Checks that `words` is a well-formed backing store for `num_vars`
/// variables.
pub fn check_layout(num_vars: usize, words: &[u64]) -> Result<(), TruthTableError> {
    if num_vars > MAX_VARS {
        return Err(TruthTableError::TooManyVars { num_vars });
    }
    let expected = word_count(num_vars);
    if words.len() != expected {
        return Err(TruthTableError::WordCountMismatch {
            num_vars,
            expected,
            got: words.len(),
        });
    }
    let mask = valid_mask(num_vars);
    if words.iter().any(|w| w & !mask != 0) {
        return Err(TruthTableError::StrayBits { num_vars });
    }
    Ok(())
}

/// Read-only access to a complete truth table.
///
/// Implementors promise nothing about layout; consumers that need the word
/// layout invariants call [`check_layout`] first.
pub trait CompleteTruthTable {
    fn num_vars(&self) -> usize;

    fn words(&self) -> &[u64];

    fn num_bits(&self) -> usize {
        1usize << self.num_vars()
    }

    fn get_bit(&self, index: usize) -> bool {
        assert!(
            index < self.num_bits(),
            "assignment index {} out of range for {} variables",
            index,
            self.num_vars()
        );
        let (word, offset) = word_and_offset(index);
        (self.words()[word] >> offset) & 1 != 0
    }
}

/// A borrowed truth table given as a variable count plus backing words.
///
/// No validation happens on construction, so this is the shape in which
/// externally produced tables arrive.
#[derive(Debug, Clone, Copy)]
pub struct RawTruthTable<'a> {
    num_vars: usize,
    words: &'a [u64],
}

impl<'a> RawTruthTable<'a> {
    pub fn new(num_vars: usize, words: &'a [u64]) -> Self {
        Self { num_vars, words }
    }
}

impl CompleteTruthTable for RawTruthTable<'_> {
    fn num_vars(&self) -> usize {
        self.num_vars
    }

    fn words(&self) -> &[u64] {
        self.words
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TruthTable {
    num_vars: usize,
    words: Vec<u64>,
}

impl TruthTable {
    /// Returns the constant-0 table over `num_vars` variables.
    ///
    /// Panics if `num_vars > MAX_VARS`.
    pub fn new(num_vars: usize) -> Self {
        assert!(
            num_vars <= MAX_VARS,
            "TruthTable::new: {} variables exceeds MAX_VARS={}",
            num_vars,
            MAX_VARS
        );
        Self {
            num_vars,
            words: vec![0; word_count(num_vars)],
        }
    }

    pub fn constant(num_vars: usize, value: bool) -> Self {
        let mut tt = Self::new(num_vars);
        if value {
            let mask = valid_mask(num_vars);
            tt.words.iter_mut().for_each(|w| *w = mask);
        }
        tt
    }

    pub fn from_words(num_vars: usize, words: Vec<u64>) -> Result<Self, TruthTableError> {
        check_layout(num_vars, &words)?;
        Ok(Self { num_vars, words })
    }

    /// Copies any complete truth table into an owned, validated buffer.
    pub fn from_view<T: CompleteTruthTable + ?Sized>(view: &T) -> Result<Self, TruthTableError> {
        check_layout(view.num_vars(), view.words())?;
        Ok(Self {
            num_vars: view.num_vars(),
            words: view.words().to_vec(),
        })
    }

    /// Builds a table from its output bits, `bits[i]` being the output on
    /// assignment `i`.
    pub fn from_bits(bits: &[bool]) -> Result<Self, TruthTableError> {
        if !bits.len().is_power_of_two() {
            return Err(TruthTableError::NotPowerOfTwo { len: bits.len() });
        }
        let num_vars = bits.len().trailing_zeros() as usize;
        if num_vars > MAX_VARS {
            return Err(TruthTableError::TooManyVars { num_vars });
        }
        Ok(Self::from_fn(num_vars, |i| bits[i]))
    }

    pub fn from_fn(num_vars: usize, mut f: impl FnMut(usize) -> bool) -> Self {
        let mut tt = Self::new(num_vars);
        for i in 0..tt.num_bits() {
            if f(i) {
                tt.set_bit(i, true);
            }
        }
        tt
    }

    /// Returns the projection function `f(x) = x[var]`.
    pub fn nth_var(num_vars: usize, var: usize) -> Self {
        assert!(
            var < num_vars,
            "TruthTable::nth_var: variable {} out of range for {} variables",
            var,
            num_vars
        );
        let mut tt = Self::new(num_vars);
        if var < 6 {
            tt.words[0] = VAR_MASKS[var] & valid_mask(num_vars);
            let first = tt.words[0];
            tt.words.iter_mut().for_each(|w| *w = first);
        } else {
            let stride = 1usize << (var - 6);
            for (i, w) in tt.words.iter_mut().enumerate() {
                if (i / stride) & 1 == 1 {
                    *w = u64::MAX;
                }
            }
        }
        tt
    }

    /// Parses a hexadecimal table, most significant assignment first.
    ///
    /// An optional `0x` prefix is accepted. Tables over fewer than two
    /// variables use a single digit.
    pub fn from_hex_str(num_vars: usize, s: &str) -> Result<Self, TruthTableError> {
        if num_vars > MAX_VARS {
            return Err(TruthTableError::TooManyVars { num_vars });
        }
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let expected = if num_vars < 2 {
            1
        } else {
            1usize << (num_vars - 2)
        };
        if digits.chars().count() != expected {
            return Err(TruthTableError::LengthMismatch {
                num_vars,
                expected,
                got: digits.chars().count(),
            });
        }
        let mut tt = Self::new(num_vars);
        for (position, digit) in digits.chars().enumerate() {
            let value = digit
                .to_digit(16)
                .ok_or(TruthTableError::InvalidDigit { digit, position })?
                as u64;
            let nibble = expected - 1 - position;
            let (word, offset) = word_and_offset(nibble * 4);
            tt.words[word] |= value << offset;
        }
        check_layout(num_vars, &tt.words)?;
        Ok(tt)
    }

    /// Parses a binary table, most significant assignment first.
    pub fn from_binary_str(num_vars: usize, s: &str) -> Result<Self, TruthTableError> {
        if num_vars > MAX_VARS {
            return Err(TruthTableError::TooManyVars { num_vars });
        }
        let expected = 1usize << num_vars;
        if s.chars().count() != expected {
            return Err(TruthTableError::LengthMismatch {
                num_vars,
                expected,
                got: s.chars().count(),
            });
        }
        let mut tt = Self::new(num_vars);
        for (position, digit) in s.chars().enumerate() {
            match digit {
                '0' => {}
                '1' => tt.set_bit(expected - 1 - position, true),
                _ => return Err(TruthTableError::InvalidDigit { digit, position }),
            }
        }
        Ok(tt)
    }

    pub fn to_hex_string(&self) -> String {
        let num_digits = if self.num_vars < 2 {
            1
        } else {
            1usize << (self.num_vars - 2)
        };
        (0..num_digits)
            .rev()
            .map(|nibble| {
                let (word, offset) = word_and_offset(nibble * 4);
                let value = (self.words[word] >> offset) & 0xF;
                std::char::from_digit(value as u32, 16).unwrap_or('?')
            })
            .collect()
    }

    pub fn to_binary_string(&self) -> String {
        (0..self.num_bits())
            .rev()
            .map(|i| if self.get_bit(i) { '1' } else { '0' })
            .collect()
    }

    #[inline]
    pub fn num_vars(&self) -> usize {
        self.num_vars
    }

    #[inline]
    pub fn num_bits(&self) -> usize {
        1usize << self.num_vars
    }

    #[inline]
    pub fn words(&self) -> &[u64] {
        &self.words
    }

    #[inline]
    pub fn get_bit(&self, index: usize) -> bool {
        self.check_index(index);
        let (word, offset) = word_and_offset(index);
        (self.words[word] >> offset) & 1 != 0
    }

    #[inline]
    pub fn set_bit(&mut self, index: usize, value: bool) {
        self.check_index(index);
        let (word, offset) = word_and_offset(index);
        let mask = 1u64 << offset;
        if value {
            self.words[word] |= mask;
        } else {
            self.words[word] &= !mask;
        }
    }

    #[inline]
    pub fn flip_bit(&mut self, index: usize) {
        self.check_index(index);
        let (word, offset) = word_and_offset(index);
        self.words[word] ^= 1u64 << offset;
    }

    /// Substitutes `!x[var]` for `x[var]`, i.e. swaps the two cofactors of
    /// `var` in place.
    pub fn complement_var(&mut self, var: usize) {
        assert!(
            var < self.num_vars,
            "complement_var: variable {} out of range for {} variables",
            var,
            self.num_vars
        );
        if var < 6 {
            let mask = VAR_MASKS[var];
            let shift = 1u32 << var;
            for w in self.words.iter_mut() {
                *w = ((*w & mask) >> shift) | ((*w << shift) & mask);
            }
        } else {
            let stride = 1usize << (var - 6);
            for block in self.words.chunks_mut(2 * stride) {
                let (lo, hi) = block.split_at_mut(stride);
                lo.swap_with_slice(hi);
            }
        }
    }

    pub fn count_ones(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    fn check_index(&self, index: usize) {
        assert!(
            index < self.num_bits(),
            "assignment index {} out of range for {} variables",
            index,
            self.num_vars
        );
    }

    fn zip_with(mut self, rhs: &Self, op: impl Fn(u64, u64) -> u64) -> Self {
        assert_eq!(
            self.num_vars, rhs.num_vars,
            "binary operation on truth tables of different sizes"
        );
        for (lhs, rhs) in self.words.iter_mut().zip(rhs.words.iter()) {
            *lhs = op(*lhs, *rhs);
        }
        self
    }
}

impl CompleteTruthTable for TruthTable {
    fn num_vars(&self) -> usize {
        self.num_vars
    }

    fn words(&self) -> &[u64] {
        &self.words
    }
}

impl fmt::Display for TruthTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex_string())
    }
}

impl Not for TruthTable {
    type Output = TruthTable;

    fn not(mut self) -> Self::Output {
        let mask = valid_mask(self.num_vars);
        self.words.iter_mut().for_each(|w| *w = !*w & mask);
        self
    }
}

impl BitAnd for TruthTable {
    type Output = TruthTable;

    fn bitand(self, rhs: Self) -> Self::Output {
        self.zip_with(&rhs, |a, b| a & b)
    }
}

impl BitOr for TruthTable {
    type Output = TruthTable;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.zip_with(&rhs, |a, b| a | b)
    }
}

impl BitXor for TruthTable {
    type Output = TruthTable;

    fn bitxor(self, rhs: Self) -> Self::Output {
        self.zip_with(&rhs, |a, b| a ^ b)
    }
}
