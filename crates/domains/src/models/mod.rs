//! # Domain Models
//!
//! These structs represent the core entities of the help desk.
//! Identities are integer keys assigned by the persistence collaborator.

mod actor;
mod comment;
mod ticket;
mod user;

pub use actor::*;
pub use comment::*;
pub use ticket::*;
pub use user::*;

macro_rules! integer_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
            serde::Serialize, serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            pub fn new(id: i64) -> Self {
                Self(id)
            }

            pub fn value(self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.parse().map(Self)
            }
        }
    };
}

integer_id!(
    /// Primary key of a user-directory entry; also the identity of an [`Actor`].
    UserId
);
integer_id!(TicketId);
integer_id!(CommentId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_serialize_as_bare_integers() {
        let json = serde_json::to_string(&TicketId::new(42)).unwrap();
        assert_eq!(json, "42");
        let back: UserId = serde_json::from_str("7").unwrap();
        assert_eq!(back, UserId(7));
    }

    #[test]
    fn ids_parse_from_path_segments() {
        assert_eq!("15".parse::<CommentId>().unwrap(), CommentId(15));
        assert!("abc".parse::<TicketId>().is_err());
    }
}
