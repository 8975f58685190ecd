//! Index types.

use std::fmt;

pub use index_vec::*;

/// A 32-bit index backed by a `NonZeroU32`, so that `Option<BaseIndex32>` is still 4 bytes.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct BaseIndex32 {
    value: std::num::NonZeroU32,
}

impl fmt::Display for BaseIndex32 {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.get().fmt(f)
    }
}

impl fmt::Debug for BaseIndex32 {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.get().fmt(f)
    }
}

impl Idx for BaseIndex32 {
    #[inline]
    fn from_usize(value: usize) -> Self {
        assert!(value <= Self::MAX_AS as usize);
        Self::new(value as u32)
    }

    #[inline]
    fn index(self) -> usize {
        self.get() as usize
    }
}

impl BaseIndex32 {
    /// The maximum raw index value.
    pub const MAX_AS: u32 = 0xFFFF_FF00;

    /// The maximum index value.
    pub const MAX: Self = Self::new(Self::MAX_AS);

    /// Creates a new index from the given `value`.
    ///
    /// # Panics
    ///
    /// Panics if `value` exceeds `MAX`.
    #[inline]
    pub const fn new(value: u32) -> Self {
        assert!(value <= Self::MAX_AS);
        match std::num::NonZeroU32::new(value + 1) {
            Some(value) => Self { value },
            None => panic!("index overflowed"),
        }
    }

    /// Gets the underlying index value.
    #[inline]
    pub const fn get(self) -> u32 {
        self.value.get() - 1
    }
}

/// Creates new index types backed by [`BaseIndex32`].
///
/// ```
/// jmmc_data_structures::newtype_index! {
///     /// An example index.
///     pub struct ExampleId;
/// }
///
/// let id = ExampleId::from_usize(3);
/// assert_eq!(id.index(), 3);
/// ```
#[macro_export]
macro_rules! newtype_index {
    () => {};
    ($(#[$attr:meta])* $vis:vis struct $name:ident; $($rest:tt)*) => {
        $(#[$attr])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[repr(transparent)]
        $vis struct $name($crate::index::BaseIndex32);

        impl $crate::index::Idx for $name {
            #[inline]
            fn from_usize(value: usize) -> Self {
                Self(<$crate::index::BaseIndex32 as $crate::index::Idx>::from_usize(value))
            }

            #[inline]
            fn index(self) -> usize {
                self.0.get() as usize
            }
        }

        #[allow(dead_code)]
        impl $name {
            /// Creates a new index from a `u32`.
            #[inline]
            $vis const fn new(value: u32) -> Self {
                Self($crate::index::BaseIndex32::new(value))
            }

            /// Creates a new index from a `usize`.
            #[inline]
            $vis fn from_usize(value: usize) -> Self {
                <Self as $crate::index::Idx>::from_usize(value)
            }

            /// Returns the underlying `u32`.
            #[inline]
            $vis const fn get(self) -> u32 {
                self.0.get()
            }

            /// Returns the index as a `usize`.
            #[inline]
            $vis fn index(self) -> usize {
                self.0.get() as usize
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}({})", stringify!($name), self.get())
            }
        }

        $crate::newtype_index! { $($rest)* }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    newtype_index! {
        struct TestId;
    }

    #[test]
    fn base_index_roundtrips_through_non_zero() {
        let idx = BaseIndex32::new(0);
        assert_eq!(idx.get(), 0);
        assert_eq!(BaseIndex32::MAX.get(), BaseIndex32::MAX_AS);
        assert_eq!(std::mem::size_of::<Option<BaseIndex32>>(), 4);
    }

    #[test]
    fn newtype_index_in_vec() {
        let mut vec = IndexVec::<TestId, &str>::new();
        let a = vec.push("a");
        let b = vec.push("b");
        assert_eq!(a, TestId::new(0));
        assert_eq!(b.index(), 1);
        assert_eq!(vec[b], "b");
        assert_eq!(format!("{a:?}"), "TestId(0)");
    }
}
