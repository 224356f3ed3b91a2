//! Domain primitives shared by the services and the HTTP layer.
//!
//! Nothing in here touches the database: the authorization policy, the
//! rating mean and the title filter criteria are all pure values and
//! functions so they can be exercised without a store.

pub mod filter;
pub mod policy;
pub mod rating;
pub mod validation;

use serde::{Deserialize, Deserializer, Serialize};

pub use crate::entities::users::Role;
pub use filter::TitleFilter;
pub use policy::{Action, Decision, Denial, Owner, Resource, authorize, require};
pub use rating::recompute_rating;
pub use validation::FieldError;

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Moderator => "moderator",
            Self::Admin => "admin",
        }
    }

    /// Moderators and admins may edit content they did not author.
    #[must_use]
    pub const fn is_staff(self) -> bool {
        matches!(self, Self::Moderator | Self::Admin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An authenticated, active user as seen by the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub user_id: i32,
    pub role: Role,
}

/// Whoever issued the current request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Actor {
    #[default]
    Anonymous,
    User(Principal),
}

impl Actor {
    #[must_use]
    pub const fn user(user_id: i32, role: Role) -> Self {
        Self::User(Principal { user_id, role })
    }

    #[must_use]
    pub const fn principal(&self) -> Option<&Principal> {
        match self {
            Self::Anonymous => None,
            Self::User(principal) => Some(principal),
        }
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::User(_))
    }

    #[must_use]
    pub fn user_id(&self) -> Option<i32> {
        self.principal().map(|p| p.user_id)
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.principal().is_some_and(|p| p.role == Role::Admin)
    }
}

/// A request parameter that may arrive either as a single value or as a list.
///
/// Normalised once at the boundary; business code only ever sees
/// [`OneOrMany::into_vec`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    #[must_use]
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::One(value) => vec![value],
            Self::Many(values) => values,
        }
    }
}

impl<T> Default for OneOrMany<T> {
    fn default() -> Self {
        Self::Many(Vec::new())
    }
}

impl<'de, T> Deserialize<'de> for OneOrMany<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw<T> {
            One(T),
            Many(Vec<T>),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::One(value) => Self::One(value),
            Raw::Many(values) => Self::Many(values),
        })
    }
}

impl OneOrMany<String> {
    /// Splits comma separated entries (`?genre=a,b`) and drops blanks.
    #[must_use]
    pub fn into_slugs(self) -> Vec<String> {
        self.into_vec()
            .iter()
            .flat_map(|raw| raw.split(','))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToString::to_string)
            .collect()
    }
}

/// Distinguishes an absent field from an explicit `null` in a patch body:
/// absent stays `None`, `null` becomes `Some(None)`.
pub fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_or_many_accepts_both_shapes() {
        let one: OneOrMany<String> = serde_json::from_str(r#""sci-fi""#).unwrap();
        assert_eq!(one.into_vec(), vec!["sci-fi".to_string()]);

        let many: OneOrMany<String> = serde_json::from_str(r#"["sci-fi", "drama"]"#).unwrap();
        assert_eq!(
            many.into_vec(),
            vec!["sci-fi".to_string(), "drama".to_string()]
        );
    }

    #[test]
    fn test_into_slugs_splits_commas() {
        let value = OneOrMany::Many(vec!["sci-fi, action".to_string(), " ".to_string()]);
        assert_eq!(value.into_slugs(), vec!["sci-fi", "action"]);
    }

    #[test]
    fn test_nullable_distinguishes_null_from_absent() {
        #[derive(Deserialize)]
        struct Patch {
            #[serde(default, deserialize_with = "nullable")]
            category: Option<Option<String>>,
        }

        let absent: Patch = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.category, None);

        let cleared: Patch = serde_json::from_str(r#"{"category": null}"#).unwrap();
        assert_eq!(cleared.category, Some(None));

        let set: Patch = serde_json::from_str(r#"{"category": "movie"}"#).unwrap();
        assert_eq!(set.category, Some(Some("movie".to_string())));
    }

    #[test]
    fn test_actor_helpers() {
        let anon = Actor::Anonymous;
        assert!(!anon.is_authenticated());
        assert_eq!(anon.user_id(), None);

        let admin = Actor::user(7, Role::Admin);
        assert!(admin.is_admin());
        assert_eq!(admin.user_id(), Some(7));
        assert!(Role::Moderator.is_staff());
        assert!(!Role::User.is_staff());
    }
}
