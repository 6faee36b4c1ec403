//! Operator boilerplate for transparent numeric newtypes.
//!
//! `op!(binary Money, Add, add)` expands to the `Add` impl that forwards to the inner value.
//! The `inplace` and `unary` forms cover the `XAssign` and single-operand traits. The trait
//! being implemented must be in scope at the call site.

#[macro_export]
macro_rules! op {
    (binary $name:ident, $trait:ident, $method:ident) => {
        impl $trait for $name {
            type Output = Self;

            fn $method(self, rhs: Self) -> Self::Output {
                Self(self.0.$method(rhs.0))
            }
        }
    };
    (inplace $name:ident, $trait:ident, $method:ident) => {
        impl $trait for $name {
            fn $method(&mut self, rhs: Self) {
                self.0.$method(rhs.0);
            }
        }
    };
    (unary $name:ident, $trait:ident, $method:ident) => {
        impl $trait for $name {
            type Output = Self;

            fn $method(self) -> Self::Output {
                Self(self.0.$method())
            }
        }
    };
}
