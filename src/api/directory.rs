//! Roster of the homes and groups.

use std::{fmt::Formatter, fs, marker::PhantomData, path::Path};

use serde::{
    Deserialize,
    Deserializer,
    de::{DeserializeOwned, MapAccess, Visitor},
};

use crate::{core::sample::EntityId, prelude::*};

pub trait Directory {
    /// All the homes, in the roster order.
    fn list_entities(&self) -> Vec<EntityId>;

    /// Phase channel names of the home, in the order of the phase columns.
    fn list_channels(&self, entity_id: &EntityId) -> Result<Vec<String>>;

    fn list_groups(&self) -> Vec<EntityId>;

    fn list_group_members(&self, group_id: &EntityId) -> Result<Vec<EntityId>>;

    /// Human-readable group description.
    fn caption(&self, group_id: &EntityId) -> Option<String>;

    /// Groups which the home belongs to.
    fn groups_of(&self, entity_id: &EntityId) -> Vec<EntityId> {
        self.list_groups()
            .into_iter()
            .filter(|group_id| {
                self.list_group_members(group_id)
                    .is_ok_and(|members| members.contains(entity_id))
            })
            .collect()
    }
}

/// Directory backed by a TOML file:
///
/// ```toml
/// [homes.CDB001]
/// channels = ["phase0", "phase1", "phase2"]
///
/// [groups.GRP01]
/// caption = "Street lights"
/// members = ["CDB001", "CDB002"]
/// ```
#[must_use]
#[derive(Debug, Default, Deserialize)]
pub struct Roster {
    #[serde(default)]
    pub homes: Entries<Home>,

    #[serde(default)]
    pub groups: Entries<Group>,
}

impl Roster {
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn read_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read the roster from `{}`", path.display()))?;
        let roster = Self::from_toml(&contents)
            .with_context(|| format!("failed to parse the roster `{}`", path.display()))?;
        debug!(n_homes = roster.homes.0.len(), n_groups = roster.groups.0.len(), "loaded");
        Ok(roster)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    fn home(&self, entity_id: &EntityId) -> Result<&Home> {
        self.homes
            .get(entity_id)
            .with_context(|| format!("home `{entity_id}` is not in the roster"))
    }

    fn group(&self, group_id: &EntityId) -> Result<&Group> {
        self.groups
            .get(group_id)
            .with_context(|| format!("group `{group_id}` is not in the roster"))
    }
}

impl Directory for Roster {
    fn list_entities(&self) -> Vec<EntityId> {
        self.homes.ids().cloned().collect()
    }

    fn list_channels(&self, entity_id: &EntityId) -> Result<Vec<String>> {
        Ok(self.home(entity_id)?.channels.clone())
    }

    fn list_groups(&self) -> Vec<EntityId> {
        self.groups.ids().cloned().collect()
    }

    fn list_group_members(&self, group_id: &EntityId) -> Result<Vec<EntityId>> {
        Ok(self.group(group_id)?.members.clone())
    }

    fn caption(&self, group_id: &EntityId) -> Option<String> {
        self.groups.get(group_id)?.caption.clone()
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Home {
    #[serde(default)]
    pub channels: Vec<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Group {
    pub caption: Option<String>,

    #[serde(default)]
    pub members: Vec<EntityId>,
}

/// Table entries in the file order.
#[derive(Debug)]
pub struct Entries<T>(pub Vec<(EntityId, T)>);

impl<T> Default for Entries<T> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<T> Entries<T> {
    pub fn get(&self, id: &EntityId) -> Option<&T> {
        self.0.iter().find_map(|(entry_id, value)| (entry_id == id).then_some(value))
    }

    pub fn ids(&self) -> impl Iterator<Item = &EntityId> {
        self.0.iter().map(|(id, _)| id)
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Entries<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntriesVisitor<T>(PhantomData<T>);

        impl<'de, T: DeserializeOwned> Visitor<'de> for EntriesVisitor<T> {
            type Value = Vec<(EntityId, T)>;

            fn expecting(&self, formatter: &mut Formatter) -> std::fmt::Result {
                write!(formatter, "a table of identifiers to entries")
            }

            fn visit_map<MA: MapAccess<'de>>(
                self,
                mut map_access: MA,
            ) -> Result<Self::Value, MA::Error> {
                let mut inner = Vec::with_capacity(map_access.size_hint().unwrap_or_default());
                while let Some(entry) = map_access.next_entry()? {
                    inner.push(entry);
                }
                Ok(inner)
            }
        }

        Ok(Self(deserializer.deserialize_map(EntriesVisitor(PhantomData))?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // language=TOML
    const ROSTER: &str = r#"
        [homes.CDB002]
        channels = ["L1", "L2"]

        [homes.CDB001]
        channels = ["phase0", "phase1", "phase2"]

        [homes.ECHASP]

        [groups.GRP02]
        members = ["CDB001"]

        [groups.GRP01]
        caption = "Street lights"
        members = ["CDB002", "CDB001"]
    "#;

    #[test]
    fn test_file_order_is_preserved() -> Result {
        let roster = Roster::from_toml(ROSTER)?;
        assert_eq!(
            roster.list_entities(),
            [EntityId::from("CDB002"), EntityId::from("CDB001"), EntityId::from("ECHASP")],
        );
        assert_eq!(roster.list_groups(), [EntityId::from("GRP02"), EntityId::from("GRP01")]);
        Ok(())
    }

    #[test]
    fn test_lookups() -> Result {
        let roster = Roster::from_toml(ROSTER)?;
        assert_eq!(roster.list_channels(&EntityId::from("CDB002"))?, ["L1", "L2"]);
        assert!(roster.list_channels(&EntityId::from("ECHASP"))?.is_empty());
        assert_eq!(
            roster.list_group_members(&EntityId::from("GRP01"))?,
            [EntityId::from("CDB002"), EntityId::from("CDB001")],
        );
        assert_eq!(roster.caption(&EntityId::from("GRP01")).as_deref(), Some("Street lights"));
        assert_eq!(roster.caption(&EntityId::from("GRP02")), None);
        Ok(())
    }

    #[test]
    fn test_unknown_entries() -> Result {
        let roster = Roster::from_toml(ROSTER)?;
        assert!(roster.list_channels(&EntityId::from("NOPE")).is_err());
        assert!(roster.list_group_members(&EntityId::from("NOPE")).is_err());
        Ok(())
    }

    #[test]
    fn test_groups_of() -> Result {
        let roster = Roster::from_toml(ROSTER)?;
        assert_eq!(
            roster.groups_of(&EntityId::from("CDB001")),
            [EntityId::from("GRP02"), EntityId::from("GRP01")],
        );
        assert!(roster.groups_of(&EntityId::from("ECHASP")).is_empty());
        Ok(())
    }

    #[test]
    fn test_empty_roster() -> Result {
        let roster = Roster::from_toml("")?;
        assert!(roster.list_entities().is_empty());
        assert!(roster.list_groups().is_empty());
        Ok(())
    }
}
