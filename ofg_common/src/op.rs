//! A tiny macro for deriving arithmetic operators on single-field newtypes.

#[macro_export]
macro_rules! op {
    (binary $type:ty, $trait:ident, $method:ident) => {
        impl std::ops::$trait for $type {
            type Output = Self;

            fn $method(self, rhs: Self) -> Self::Output {
                Self(std::ops::$trait::$method(self.0, rhs.0))
            }
        }
    };
    (inplace $type:ty, $trait:ident, $method:ident) => {
        impl std::ops::$trait for $type {
            fn $method(&mut self, rhs: Self) {
                std::ops::$trait::$method(&mut self.0, rhs.0)
            }
        }
    };
    (unary $type:ty, $trait:ident, $method:ident) => {
        impl std::ops::$trait for $type {
            type Output = Self;

            fn $method(self) -> Self::Output {
                Self(std::ops::$trait::$method(self.0))
            }
        }
    };
}
