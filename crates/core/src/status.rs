//! Text-backed enums for the `CHECK`-constrained status columns.
//!
//! Each variant's string form matches the value stored in the database, so
//! rows keep plain `String` columns and handlers parse them with
//! [`std::str::FromStr`] when they need to branch.

use crate::error::CoreError;

macro_rules! define_text_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $val:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[$( $name::$variant ),+];

            /// Return the database string value.
            pub fn as_str(self) -> &'static str {
                match self {
                    $( $name::$variant => $val ),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $val => Ok($name::$variant), )+
                    other => Err(CoreError::Validation(format!(
                        "Invalid {} '{other}'. Must be one of: {}",
                        stringify!($name),
                        [$( $val ),+].join(", "),
                    ))),
                }
            }
        }
    };
}

define_text_enum! {
    /// Lifecycle of a payment row (course, file, or form payment).
    PaymentStatus {
        Pending = "pending",
        Success = "success",
        Failed = "failed",
    }
}

define_text_enum! {
    /// Course publication status.
    CourseStatus {
        Draft = "draft",
        Published = "published",
        Archived = "archived",
    }
}

define_text_enum! {
    /// Whether a course is sold or given away.
    PricingModel {
        Free = "free",
        Paid = "paid",
    }
}

impl PaymentStatus {
    /// Payments only ever leave `pending`; `success` and `failed` are terminal.
    pub fn can_transition_to(self, next: PaymentStatus) -> bool {
        matches!(
            (self, next),
            (PaymentStatus::Pending, PaymentStatus::Success)
                | (PaymentStatus::Pending, PaymentStatus::Failed)
        )
    }
}
