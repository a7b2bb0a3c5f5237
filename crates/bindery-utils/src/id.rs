// Id { u32 }
//
// Ids index into arenas, so they are created from the arena length and never
// reused. Crates invoking the macro need `serde` as a dependency.
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
        )]
        pub struct $name {
            id: u32,
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}({})", stringify!($name), self.id)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.id)
            }
        }

        impl $name {
            pub const fn new(id: u32) -> Self {
                Self { id }
            }

            /// The id for the arena slot at `index`, `None` past `u32::MAX`.
            pub fn try_from_usize(index: usize) -> Option<Self> {
                u32::try_from(index).ok().map(Self::new)
            }

            /// Creates the id for the arena slot at `index`.
            ///
            /// # Panics
            ///
            /// Panics when the arena has outgrown the `u32` id space.
            pub fn from_usize(index: usize) -> Self {
                match Self::try_from_usize(index) {
                    Some(id) => id,
                    None => panic!(
                        "{} arena exceeded {} entries",
                        stringify!($name),
                        u32::MAX
                    ),
                }
            }

            pub fn as_usize(&self) -> usize {
                self.id as usize
            }

            pub fn id(&self) -> u32 {
                self.id
            }
        }
    };
}
