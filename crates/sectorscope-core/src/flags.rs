//! Bit sets stored in wall and flat records.

macro_rules! flag_set {
    ($name:ident { $($flag:ident = $bit:expr),* $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        pub struct $name(pub u16);

        impl $name {
            $(pub const $flag: Self = Self(1 << $bit);)*

            pub fn contains(self, other: Self) -> bool {
                self.0 & other.0 == other.0
            }
        }

        impl std::ops::BitOr for $name {
            type Output = Self;

            fn bitor(self, rhs: Self) -> Self {
                Self(self.0 | rhs.0)
            }
        }
    };
}

flag_set!(WallFlags {
    SOLID = 0,
    BOTTOM_SWAPPED = 1,
    BOTTOM_ALIGN = 2,
    FLIP_X = 3,
    MASKING = 4,
    ONE_WAY = 5,
    BLOCKING = 6,
    TRANSPARENT = 7,
    FLIP_Y = 8,
    INVERSE_TRANSPARENT = 9,
});

flag_set!(FlatFlags {
    PARALLAX = 0,
    SLOPED = 1,
    SWAP_COORDS = 2,
    LARGE_TEXTURE = 3,
    FLIP_X = 4,
    FLIP_Y = 5,
    ALIGN_TO_FIRST_WALL = 6,
});
