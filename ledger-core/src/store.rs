//! Group store
//!
//! Named groups persisted as one JSON document keyed by group name:
//!
//! ```text
//! {
//!   "Ski trip": {
//!     "members": ["Alice", "Bob"],
//!     "expenses": [{ "id": 1, "description": "Cabin", "amount": "300", ... }],
//!     "nextExpenseId": 2,
//!     "savedAt": "2024-02-01T10:00:00Z"
//!   }
//! }
//! ```
//!
//! Every operation reads the document fresh and writes it back whole. Writes
//! go to a sibling temp file first and are renamed into place. An unreadable
//! document reads as an empty store; before the next write it is renamed to
//! `<file>.corrupt` so its contents survive.

use crate::{
    group::Group,
    types::{Expense, ExpenseId, Member},
    Config, Error, Result,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Number of member names shown in a listing preview
const PREVIEW_MEMBERS: usize = 4;

/// Group as persisted
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredGroup {
    members: Vec<Member>,

    #[serde(default)]
    expenses: Vec<Expense>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    next_expense_id: Option<ExpenseId>,

    #[serde(default = "Utc::now")]
    saved_at: DateTime<Utc>,
}

impl From<&Group> for StoredGroup {
    fn from(group: &Group) -> Self {
        Self {
            members: group.members().to_vec(),
            expenses: group.expenses().to_vec(),
            next_expense_id: Some(group.next_expense_id()),
            saved_at: group.saved_at,
        }
    }
}

/// Summary of a stored group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupListing {
    /// Group name
    pub name: String,

    /// Number of members
    pub member_count: usize,

    /// First few member names, `...` appended when there are more
    pub member_preview: String,

    /// Number of expenses
    pub expense_count: usize,

    /// Last save time
    pub saved_at: DateTime<Utc>,
}

/// JSON file store of named groups
#[derive(Debug, Clone)]
pub struct GroupStore {
    path: PathBuf,
}

impl GroupStore {
    /// Open the store configured in `config`
    pub fn open(config: &Config) -> Result<Self> {
        Self::open_path(config.store_path())
    }

    /// Open the store at `path`
    ///
    /// A missing file is an empty store; the file is created on first save.
    pub fn open_path(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if path.is_dir() {
            return Err(Error::Config(format!(
                "store path {} is a directory",
                path.display()
            )));
        }

        tracing::debug!(path = %path.display(), "Opened group store");
        Ok(Self { path })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All stored groups, most recently saved first
    pub fn list(&self) -> Result<Vec<GroupListing>> {
        let mut listings: Vec<GroupListing> = self
            .read_all()?
            .into_iter()
            .map(|(name, stored)| {
                let mut preview = stored
                    .members
                    .iter()
                    .take(PREVIEW_MEMBERS)
                    .map(Member::as_str)
                    .collect::<Vec<_>>()
                    .join(", ");
                if stored.members.len() > PREVIEW_MEMBERS {
                    preview.push_str("...");
                }

                GroupListing {
                    name,
                    member_count: stored.members.len(),
                    member_preview: preview,
                    expense_count: stored.expenses.len(),
                    saved_at: stored.saved_at,
                }
            })
            .collect();

        listings.sort_by(|a, b| b.saved_at.cmp(&a.saved_at).then_with(|| a.name.cmp(&b.name)));
        Ok(listings)
    }

    /// Whether a group with this name is stored
    pub fn contains(&self, name: &str) -> Result<bool> {
        Ok(self.read_all()?.contains_key(name.trim()))
    }

    /// Load a group
    pub fn load(&self, name: &str) -> Result<Group> {
        let name = name.trim();
        let stored = self
            .read_all()?
            .remove(name)
            .ok_or_else(|| Error::GroupNotFound(name.to_string()))?;

        Group::from_parts(
            name,
            stored.members,
            stored.expenses,
            stored.next_expense_id,
            stored.saved_at,
        )
    }

    /// Start a new group under an unused name
    ///
    /// Nothing is written until the group is saved with at least one member.
    pub fn create(&self, name: &str) -> Result<Group> {
        let group = Group::new(name)?;
        if self.read_all()?.contains_key(&group.name) {
            return Err(Error::GroupExists(group.name));
        }
        Ok(group)
    }

    /// Save a group, stamping its save time
    ///
    /// A group without members is removed from the store instead.
    pub fn save(&self, group: &mut Group) -> Result<()> {
        let mut groups = self.read_for_update()?;
        group.touch();

        if group.members().is_empty() {
            if groups.remove(&group.name).is_some() {
                tracing::info!(group = %group.name, "Removed group without members");
            }
        } else {
            groups.insert(group.name.clone(), StoredGroup::from(&*group));
            tracing::info!(
                group = %group.name,
                members = group.members().len(),
                expenses = group.expenses().len(),
                "Saved group"
            );
        }

        self.write_all(&groups)
    }

    /// Delete a stored group
    pub fn delete(&self, name: &str) -> Result<()> {
        let name = name.trim();
        let mut groups = self.read_for_update()?;
        if groups.remove(name).is_none() {
            return Err(Error::GroupNotFound(name.to_string()));
        }

        tracing::info!(group = %name, "Deleted group");
        self.write_all(&groups)
    }

    /// Corrupt file path used when the store cannot be parsed
    pub fn corrupt_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".corrupt");
        PathBuf::from(name)
    }

    fn read_all(&self) -> Result<BTreeMap<String, StoredGroup>> {
        Ok(self.read_stored()?.unwrap_or_default())
    }

    /// Like `read_all`, but moves an unreadable file aside so the next write
    /// cannot destroy it
    fn read_for_update(&self) -> Result<BTreeMap<String, StoredGroup>> {
        match self.read_stored()? {
            Some(groups) => Ok(groups),
            None => {
                let corrupt = self.corrupt_path();
                std::fs::rename(&self.path, &corrupt)?;
                tracing::warn!(
                    path = %self.path.display(),
                    moved_to = %corrupt.display(),
                    "Moved unreadable group store aside"
                );
                Ok(BTreeMap::new())
            }
        }
    }

    /// `None` when the file exists but is not a valid store document
    fn read_stored(&self) -> Result<Option<BTreeMap<String, StoredGroup>>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Some(BTreeMap::new()))
            }
            Err(err) => return Err(err.into()),
        };

        if content.trim().is_empty() {
            return Ok(Some(BTreeMap::new()));
        }

        match serde_json::from_str(&content) {
            Ok(groups) => Ok(Some(groups)),
            Err(err) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %err,
                    "Group store unreadable, treating as empty"
                );
                Ok(None)
            }
        }
    }

    fn write_all(&self, groups: &BTreeMap<String, StoredGroup>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(groups)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;

        tracing::debug!(path = %self.path.display(), groups = groups.len(), "Wrote group store");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NewExpense;
    use rust_decimal_macros::dec;

    fn temp_store() -> (tempfile::TempDir, GroupStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = GroupStore::open_path(dir.path().join("groups.json")).unwrap();
        (dir, store)
    }

    fn trip(store: &GroupStore) -> Group {
        let mut group = store.create("Trip").unwrap();
        group.add_member("Alice").unwrap();
        group.add_member("Bob").unwrap();
        group
            .add_expense(NewExpense {
                description: "Fuel".to_string(),
                amount: dec!(80.40),
                payer: "Bob".to_string(),
                participants: vec!["Alice".to_string(), "Bob".to_string()],
            })
            .unwrap();
        group
    }

    #[test]
    fn test_empty_store() {
        let (_dir, store) = temp_store();
        assert!(store.list().unwrap().is_empty());
        assert!(!store.contains("Trip").unwrap());
        assert!(matches!(store.load("Trip"), Err(Error::GroupNotFound(_))));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let (_dir, store) = temp_store();
        let mut group = trip(&store);
        store.save(&mut group).unwrap();

        let loaded = store.load("Trip").unwrap();
        assert_eq!(loaded.members(), group.members());
        assert_eq!(loaded.expenses(), group.expenses());
        assert_eq!(loaded.next_expense_id(), 2);
        assert_eq!(loaded.expenses()[0].amount, dec!(80.40));
    }

    #[test]
    fn test_create_rejects_existing_name() {
        let (_dir, store) = temp_store();
        let mut group = trip(&store);
        store.save(&mut group).unwrap();

        assert!(matches!(store.create(" Trip "), Err(Error::GroupExists(_))));
        assert!(store.create("Other").is_ok());
    }

    #[test]
    fn test_new_group_not_persisted_until_members() {
        let (_dir, store) = temp_store();
        let mut group = store.create("Empty").unwrap();

        store.save(&mut group).unwrap();
        assert!(!store.contains("Empty").unwrap());

        group.add_member("Solo").unwrap();
        store.save(&mut group).unwrap();
        assert!(store.contains("Empty").unwrap());

        group.remove_member("Solo").unwrap();
        store.save(&mut group).unwrap();
        assert!(!store.contains("Empty").unwrap());
    }

    #[test]
    fn test_delete() {
        let (_dir, store) = temp_store();
        let mut group = trip(&store);
        store.save(&mut group).unwrap();

        store.delete("Trip").unwrap();
        assert!(!store.contains("Trip").unwrap());
        assert!(matches!(store.delete("Trip"), Err(Error::GroupNotFound(_))));
    }

    #[test]
    fn test_listing_preview() {
        let (_dir, store) = temp_store();
        let mut group = store.create("Band").unwrap();
        for name in ["Ann", "Ben", "Cat", "Dan", "Eve"] {
            group.add_member(name).unwrap();
        }
        store.save(&mut group).unwrap();

        let listings = store.list().unwrap();
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].member_count, 5);
        assert_eq!(listings[0].member_preview, "Ann, Ben, Cat, Dan...");
        assert_eq!(listings[0].expense_count, 0);
    }

    #[test]
    fn test_listing_most_recent_first() {
        let (_dir, store) = temp_store();
        let mut older = trip(&store);
        store.save(&mut older).unwrap();

        let mut newer = store.create("Dinner club").unwrap();
        newer.add_member("Zed").unwrap();
        store.save(&mut newer).unwrap();

        let names: Vec<String> = store.list().unwrap().into_iter().map(|l| l.name).collect();
        assert_eq!(names, vec!["Dinner club".to_string(), "Trip".to_string()]);
    }

    #[test]
    fn test_reads_numeric_amounts_and_missing_counter() {
        let (_dir, store) = temp_store();
        let json = r#"{
            "Flat": {
                "members": ["A", "B"],
                "expenses": [
                    {"id": 3, "description": "Rent", "amount": 1200.5, "payer": "A", "participants": ["A", "B"]}
                ],
                "savedAt": "2024-02-01T10:00:00Z"
            }
        }"#;
        std::fs::write(store.path(), json).unwrap();

        let group = store.load("Flat").unwrap();
        assert_eq!(group.expenses()[0].amount, dec!(1200.5));
        assert_eq!(group.next_expense_id(), 4);
    }

    #[test]
    fn test_corrupt_file_treated_as_empty() {
        let (_dir, store) = temp_store();
        std::fs::write(store.path(), "{ not json").unwrap();

        assert!(store.list().unwrap().is_empty());
        assert!(matches!(store.load("Trip"), Err(Error::GroupNotFound(_))));
        assert!(!store.corrupt_path().exists());
    }

    #[test]
    fn test_corrupt_file_kept_aside_on_save() {
        let (_dir, store) = temp_store();
        let damaged = "{ \"Flat\": { \"members\": [\"A\", \"B\"], ";
        std::fs::write(store.path(), damaged).unwrap();

        let mut group = trip(&store);
        store.save(&mut group).unwrap();

        assert_eq!(std::fs::read_to_string(store.corrupt_path()).unwrap(), damaged);
        assert!(store.contains("Trip").unwrap());
        assert!(!store.contains("Flat").unwrap());
    }

    #[test]
    fn test_corrupt_file_kept_aside_on_delete() {
        let (_dir, store) = temp_store();
        std::fs::write(store.path(), "[1, 2").unwrap();

        assert!(matches!(store.delete("Trip"), Err(Error::GroupNotFound(_))));
        assert_eq!(std::fs::read_to_string(store.corrupt_path()).unwrap(), "[1, 2");
    }

    #[test]
    fn test_open_rejects_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(GroupStore::open_path(dir.path()), Err(Error::Config(_))));
    }
}
