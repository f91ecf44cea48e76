use serde::de::{SeqAccess, Visitor};
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Pull,
    Push,
    Delete,
    Catalog,
    Wildcard,
}

impl Action {
    /// Canonical serialization order.
    pub const ALL: [Action; 5] = [
        Action::Pull,
        Action::Push,
        Action::Delete,
        Action::Catalog,
        Action::Wildcard,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Action::Pull => "pull",
            Action::Push => "push",
            Action::Delete => "delete",
            Action::Catalog => "catalog",
            Action::Wildcard => "*",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Action {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pull" => Ok(Action::Pull),
            "push" => Ok(Action::Push),
            "delete" => Ok(Action::Delete),
            "catalog" => Ok(Action::Catalog),
            "*" => Ok(Action::Wildcard),
            _ => Err(()),
        }
    }
}

/// Set of registry actions over the fixed vocabulary.
///
/// Unknown tokens are dropped when building a set from strings, both when
/// parsing scopes and when deserializing stored permissions. `*` is a plain
/// member of the set: intersecting `{*}` with `{pull}` yields the empty set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ActionSet {
    pull: bool,
    push: bool,
    delete: bool,
    catalog: bool,
    wildcard: bool,
}

impl ActionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::new();
        set.extend_tokens(tokens);
        set
    }

    pub fn extend_tokens<I, S>(&mut self, tokens: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for token in tokens {
            if let Ok(action) = token.as_ref().parse::<Action>() {
                self.insert(action);
            }
        }
    }

    pub fn insert(&mut self, action: Action) {
        *self.flag_mut(action) = true;
    }

    pub fn contains(&self, action: Action) -> bool {
        match action {
            Action::Pull => self.pull,
            Action::Push => self.push,
            Action::Delete => self.delete,
            Action::Catalog => self.catalog,
            Action::Wildcard => self.wildcard,
        }
    }

    pub fn union(&self, other: &ActionSet) -> ActionSet {
        ActionSet {
            pull: self.pull || other.pull,
            push: self.push || other.push,
            delete: self.delete || other.delete,
            catalog: self.catalog || other.catalog,
            wildcard: self.wildcard || other.wildcard,
        }
    }

    pub fn intersect(&self, other: &ActionSet) -> ActionSet {
        ActionSet {
            pull: self.pull && other.pull,
            push: self.push && other.push,
            delete: self.delete && other.delete,
            catalog: self.catalog && other.catalog,
            wildcard: self.wildcard && other.wildcard,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Members in canonical order: pull, push, delete, catalog, `*`.
    pub fn iter(&self) -> impl Iterator<Item = Action> + '_ {
        Action::ALL
            .into_iter()
            .filter(move |action| self.contains(*action))
    }

    pub fn to_vec(&self) -> Vec<&'static str> {
        self.iter().map(Action::as_str).collect()
    }

    fn flag_mut(&mut self, action: Action) -> &mut bool {
        match action {
            Action::Pull => &mut self.pull,
            Action::Push => &mut self.push,
            Action::Delete => &mut self.delete,
            Action::Catalog => &mut self.catalog,
            Action::Wildcard => &mut self.wildcard,
        }
    }
}

impl FromIterator<Action> for ActionSet {
    fn from_iter<T: IntoIterator<Item = Action>>(iter: T) -> Self {
        let mut set = ActionSet::new();
        for action in iter {
            set.insert(action);
        }
        set
    }
}

impl fmt::Display for ActionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_vec().join(","))
    }
}

impl Serialize for ActionSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for action in self.iter() {
            seq.serialize_element(action.as_str())?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for ActionSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ActionSetVisitor;

        impl<'de> Visitor<'de> for ActionSetVisitor {
            type Value = ActionSet;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a sequence of action names")
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<ActionSet, A::Error> {
                let mut set = ActionSet::new();
                while let Some(token) = seq.next_element::<String>()? {
                    set.extend_tokens([token]);
                }
                Ok(set)
            }
        }

        deserializer.deserialize_seq(ActionSetVisitor)
    }
}
