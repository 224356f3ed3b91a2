//! Centralized access policy.
//!
//! Every permission question in the service layer goes through
//! [`authorize`]. The rules live in a single table keyed by resource,
//! action and subject; deny rules take precedence over allow rules and
//! anything unmatched is denied.

use super::{Actor, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    List,
    Retrieve,
    Create,
    Update,
    Delete,
}

impl Action {
    #[must_use]
    pub const fn is_read(self) -> bool {
        matches!(self, Self::List | Self::Retrieve)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Title,
    Category,
    Genre,
    Review,
    Comment,
    UserAccount,
}

/// Owner of a specific instance: the author of a review or comment, or the
/// account holder of a user record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Owner(pub i32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    #[must_use]
    pub const fn is_allowed(self) -> bool {
        matches!(self, Self::Allow)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Subject {
    Anyone,
    Authenticated,
    Owner,
    Staff,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Effect {
    Allow,
    Deny,
}

struct Rule {
    resources: &'static [Resource],
    actions: &'static [Action],
    subject: Subject,
    effect: Effect,
}

const CONTENT: &[Resource] = &[
    Resource::Title,
    Resource::Category,
    Resource::Genre,
    Resource::Review,
    Resource::Comment,
];
const CATALOG: &[Resource] = &[Resource::Title, Resource::Category, Resource::Genre];
const FEEDBACK: &[Resource] = &[Resource::Review, Resource::Comment];
const ACCOUNT: &[Resource] = &[Resource::UserAccount];

const READ: &[Action] = &[Action::List, Action::Retrieve];
const WRITE: &[Action] = &[Action::Create, Action::Update, Action::Delete];
const MUTATE: &[Action] = &[Action::Update, Action::Delete];
const ALL: &[Action] = &[
    Action::List,
    Action::Retrieve,
    Action::Create,
    Action::Update,
    Action::Delete,
];

const RULES: &[Rule] = &[
    // Nobody deletes their own account, admins included.
    Rule {
        resources: ACCOUNT,
        actions: &[Action::Delete],
        subject: Subject::Owner,
        effect: Effect::Deny,
    },
    Rule {
        resources: CONTENT,
        actions: READ,
        subject: Subject::Anyone,
        effect: Effect::Allow,
    },
    Rule {
        resources: FEEDBACK,
        actions: &[Action::Create],
        subject: Subject::Authenticated,
        effect: Effect::Allow,
    },
    Rule {
        resources: FEEDBACK,
        actions: MUTATE,
        subject: Subject::Owner,
        effect: Effect::Allow,
    },
    Rule {
        resources: FEEDBACK,
        actions: MUTATE,
        subject: Subject::Staff,
        effect: Effect::Allow,
    },
    Rule {
        resources: CATALOG,
        actions: WRITE,
        subject: Subject::Admin,
        effect: Effect::Allow,
    },
    Rule {
        resources: ACCOUNT,
        actions: &[Action::Retrieve, Action::Update],
        subject: Subject::Owner,
        effect: Effect::Allow,
    },
    Rule {
        resources: ACCOUNT,
        actions: ALL,
        subject: Subject::Admin,
        effect: Effect::Allow,
    },
];

impl Rule {
    fn applies(&self, resource: Resource, action: Action) -> bool {
        self.resources.contains(&resource) && self.actions.contains(&action)
    }

    fn matches(&self, actor: &Actor, owner: Option<Owner>) -> bool {
        match self.subject {
            Subject::Anyone => true,
            Subject::Authenticated => actor.is_authenticated(),
            Subject::Staff => actor.principal().is_some_and(|p| p.role.is_staff()),
            Subject::Admin => actor.principal().is_some_and(|p| p.role == Role::Admin),
            Subject::Owner => match (actor.principal(), owner) {
                (Some(p), Some(Owner(id))) => p.user_id == id,
                // Class-level check: any authenticated actor may own some
                // instance, so only allow rules pass here.
                (Some(_), None) => self.effect == Effect::Allow,
                (None, _) => false,
            },
        }
    }
}

/// Decides whether `actor` may perform `action` on `resource`.
///
/// Without `owner` this is the class-level check ("may this actor update
/// reviews at all"); with it, the instance-level check against the owner of
/// the specific record. Pure: never fails, never mutates.
#[must_use]
pub fn authorize(
    actor: &Actor,
    action: Action,
    resource: Resource,
    owner: Option<Owner>,
) -> Decision {
    let mut allowed = false;

    for rule in RULES.iter().filter(|r| r.applies(resource, action)) {
        if !rule.matches(actor, owner) {
            continue;
        }
        match rule.effect {
            Effect::Deny => return Decision::Deny,
            Effect::Allow => allowed = true,
        }
    }

    if allowed {
        Decision::Allow
    } else {
        Decision::Deny
    }
}

/// Why a request was refused: anonymous callers are asked to authenticate,
/// authenticated ones are told they lack the permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    Unauthenticated,
    Forbidden,
}

/// [`authorize`] as a `Result`, for use with `?` in the services.
pub fn require(
    actor: &Actor,
    action: Action,
    resource: Resource,
    owner: Option<Owner>,
) -> Result<(), Denial> {
    match authorize(actor, action, resource, owner) {
        Decision::Allow => Ok(()),
        Decision::Deny if actor.is_authenticated() => Err(Denial::Forbidden),
        Decision::Deny => Err(Denial::Unauthenticated),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE: i32 = 1;
    const BOB: i32 = 2;

    fn user() -> Actor {
        Actor::user(ALICE, Role::User)
    }

    fn moderator() -> Actor {
        Actor::user(10, Role::Moderator)
    }

    fn admin() -> Actor {
        Actor::user(20, Role::Admin)
    }

    fn allowed(actor: &Actor, action: Action, resource: Resource, owner: Option<i32>) -> bool {
        authorize(actor, action, resource, owner.map(Owner)).is_allowed()
    }

    #[test]
    fn test_anonymous_reads_content_only() {
        let anon = Actor::Anonymous;
        for resource in CONTENT {
            assert!(allowed(&anon, Action::List, *resource, None));
            assert!(allowed(&anon, Action::Retrieve, *resource, None));
            for action in WRITE {
                assert!(!allowed(&anon, *action, *resource, None));
                assert!(!allowed(&anon, *action, *resource, Some(BOB)));
            }
        }
        for action in ALL {
            assert!(!allowed(&anon, *action, Resource::UserAccount, None));
        }
    }

    #[test]
    fn test_user_creates_feedback_but_not_catalog() {
        let actor = user();
        assert!(allowed(&actor, Action::Create, Resource::Review, None));
        assert!(allowed(&actor, Action::Create, Resource::Comment, None));
        assert!(!allowed(&actor, Action::Create, Resource::Title, None));
        assert!(!allowed(&actor, Action::Delete, Resource::Category, None));
        assert!(!allowed(&actor, Action::Update, Resource::Genre, None));
    }

    #[test]
    fn test_review_mutation_by_author_staff_only() {
        for action in MUTATE {
            assert!(allowed(&user(), *action, Resource::Review, Some(ALICE)));
            assert!(!allowed(&user(), *action, Resource::Review, Some(BOB)));
            assert!(allowed(&moderator(), *action, Resource::Review, Some(BOB)));
            assert!(allowed(&admin(), *action, Resource::Review, Some(BOB)));
            assert!(allowed(&moderator(), *action, Resource::Comment, Some(BOB)));
            assert!(!allowed(&user(), *action, Resource::Comment, Some(BOB)));
        }
    }

    #[test]
    fn test_moderator_has_no_catalog_or_account_rights() {
        let actor = moderator();
        assert!(!allowed(&actor, Action::Create, Resource::Title, None));
        assert!(!allowed(&actor, Action::Delete, Resource::Genre, None));
        assert!(!allowed(&actor, Action::List, Resource::UserAccount, None));
        assert!(!allowed(&actor, Action::Update, Resource::UserAccount, Some(BOB)));
    }

    #[test]
    fn test_admin_manages_catalog_and_accounts() {
        let actor = admin();
        for resource in CATALOG {
            for action in ALL {
                assert!(allowed(&actor, *action, *resource, None));
            }
        }
        assert!(allowed(&actor, Action::List, Resource::UserAccount, None));
        assert!(allowed(&actor, Action::Create, Resource::UserAccount, None));
        assert!(allowed(&actor, Action::Delete, Resource::UserAccount, Some(BOB)));
    }

    #[test]
    fn test_own_account_access() {
        let actor = user();
        assert!(allowed(&actor, Action::Retrieve, Resource::UserAccount, Some(ALICE)));
        assert!(allowed(&actor, Action::Update, Resource::UserAccount, Some(ALICE)));
        assert!(!allowed(&actor, Action::Retrieve, Resource::UserAccount, Some(BOB)));
        assert!(!allowed(&actor, Action::List, Resource::UserAccount, None));
        assert!(!allowed(&actor, Action::Create, Resource::UserAccount, None));
    }

    #[test]
    fn test_self_deletion_denied_for_everyone() {
        assert!(!allowed(&user(), Action::Delete, Resource::UserAccount, Some(ALICE)));
        assert!(!allowed(&admin(), Action::Delete, Resource::UserAccount, Some(20)));
        // Class-level check does not trip the self-deletion rule.
        assert!(allowed(&admin(), Action::Delete, Resource::UserAccount, None));
    }

    #[test]
    fn test_require_distinguishes_denials() {
        assert_eq!(
            require(&Actor::Anonymous, Action::Create, Resource::Review, None),
            Err(Denial::Unauthenticated)
        );
        assert_eq!(
            require(&user(), Action::Create, Resource::Title, None),
            Err(Denial::Forbidden)
        );
        assert_eq!(require(&admin(), Action::Create, Resource::Title, None), Ok(()));
    }

    #[test]
    fn test_class_level_mutation_is_open_to_authenticated() {
        assert!(allowed(&user(), Action::Update, Resource::Review, None));
        assert!(!allowed(&Actor::Anonymous, Action::Update, Resource::Review, None));
    }
}
