//! Durable store for users and the project registry.
//!
//! Sled KV with JSON (Serde) records across three trees:
//! - `users`: user id -> User record
//! - `usernames`: username -> user id; doubles as the uniqueness index, claimed
//!   with compare-and-swap so concurrent signups admit exactly one winner
//! - `projects`: `{owner_id}/{name}` -> Project record; the composite key makes
//!   per-owner listing a prefix scan and (owner, name) uniqueness a single
//!   compare-and-swap insert

use sled::Db;
use std::path::Path;
use uuid::Uuid;

use crate::auth;
use crate::error::StoreError;
use crate::models::{Project, User};
use crate::naming;

#[derive(Clone)] // Clone for sharing across handlers (Sled internals cheap to clone)
pub struct Storage {
    db: Db,
    users: sled::Tree,
    usernames: sled::Tree,
    projects: sled::Tree,
}

impl Storage {
    /// Open or create the Sled database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db = sled::open(path.as_ref())?;
        let users = db.open_tree("users")?;
        let usernames = db.open_tree("usernames")?;
        let projects = db.open_tree("projects")?;
        Ok(Self {
            db,
            users,
            usernames,
            projects,
        })
    }

    /// Flush buffered writes to disk. Short-lived callers (seed script) use
    /// this before exiting.
    pub fn flush(&self) -> Result<(), StoreError> {
        self.db.flush()?;
        Ok(())
    }

    // --- Identity store ---

    /// Create a user. The username must be usable as a directory name (it
    /// becomes one under the projects root) and is claimed atomically: the
    /// compare-and-swap on the `usernames` index is the uniqueness gate, so
    /// two concurrent signups with the same name cannot both succeed.
    pub fn create_user(&self, username: &str, password: &str) -> Result<User, StoreError> {
        if !naming::is_clean_component(username) {
            return Err(StoreError::InvalidUsername(username.to_string()));
        }
        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            credential_hash: auth::hash_password(password)?,
        };
        let claim = self.usernames.compare_and_swap(
            username.as_bytes(),
            None::<&[u8]>,
            Some(user.id.as_bytes()),
        )?;
        if claim.is_err() {
            return Err(StoreError::DuplicateUsername(username.to_string()));
        }
        self.users
            .insert(user.id.as_bytes(), serde_json::to_vec(&user)?)?;
        Ok(user)
    }

    pub fn get_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        match self.users.get(id.as_bytes())? {
            Some(raw) => Ok(Some(serde_json::from_slice(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        match self.usernames.get(username.as_bytes())? {
            Some(raw_id) => self.get_user(Uuid::from_slice(&raw_id)?),
            None => Ok(None),
        }
    }

    /// Look up by username and verify the password against the stored bcrypt
    /// hash. Unknown username and wrong password both report
    /// `InvalidCredentials`.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<User, StoreError> {
        let Some(user) = self.find_user_by_username(username)? else {
            return Err(StoreError::InvalidCredentials);
        };
        if auth::verify_password(password, &user.credential_hash)? {
            Ok(user)
        } else {
            Err(StoreError::InvalidCredentials)
        }
    }

    // --- Project registry ---

    pub fn find_project(&self, owner_id: Uuid, name: &str) -> Result<Option<Project>, StoreError> {
        match self.projects.get(project_key(owner_id, name))? {
            Some(raw) => Ok(Some(serde_json::from_slice(&raw)?)),
            None => Ok(None),
        }
    }

    /// Insert the (owner, name) record if absent and return it; when a record
    /// already exists — including one inserted by a concurrent publish — the
    /// existing record is returned unchanged. Idempotent and race-free: the
    /// compare-and-swap either claims the key or loses to the winner, whose
    /// record the retry loop then reads. Projects are never deleted, so the
    /// loop terminates on the second pass at the latest.
    pub fn register_project(&self, owner_id: Uuid, name: &str) -> Result<Project, StoreError> {
        let key = project_key(owner_id, name);
        loop {
            if let Some(existing) = self.find_project(owner_id, name)? {
                return Ok(existing);
            }
            let project = Project {
                id: Uuid::new_v4(),
                name: name.to_string(),
                owner_id,
            };
            let raw = serde_json::to_vec(&project)?;
            if self
                .projects
                .compare_and_swap(&key, None::<&[u8]>, Some(raw))?
                .is_ok()
            {
                return Ok(project);
            }
        }
    }

    /// All projects of one owner, in key order. Callers must not rely on any
    /// particular ordering.
    pub fn list_projects(&self, owner_id: Uuid) -> Result<Vec<Project>, StoreError> {
        let mut projects = Vec::new();
        for item in self.projects.scan_prefix(owner_prefix(owner_id)) {
            let (_, raw) = item?;
            projects.push(serde_json::from_slice(&raw)?);
        }
        Ok(projects)
    }
}

fn owner_prefix(owner_id: Uuid) -> Vec<u8> {
    let mut prefix = owner_id.as_bytes().to_vec();
    prefix.push(b'/');
    prefix
}

fn project_key(owner_id: Uuid, name: &str) -> Vec<u8> {
    let mut key = owner_prefix(owner_id);
    key.extend_from_slice(name.as_bytes());
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_temp() -> (tempfile::TempDir, Storage) {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = Storage::open(dir.path()).expect("open storage");
        (dir, storage)
    }

    #[test]
    fn create_and_authenticate_user() {
        let (_dir, storage) = open_temp();
        let created = storage.create_user("alice", "wonder").expect("create");
        assert_ne!(created.credential_hash, "wonder");

        let authed = storage.authenticate("alice", "wonder").expect("auth");
        assert_eq!(authed.id, created.id);

        assert!(matches!(
            storage.authenticate("alice", "blunder"),
            Err(StoreError::InvalidCredentials)
        ));
        assert!(matches!(
            storage.authenticate("nobody", "wonder"),
            Err(StoreError::InvalidCredentials)
        ));
    }

    #[test]
    fn duplicate_username_is_rejected() {
        let (_dir, storage) = open_temp();
        storage.create_user("alice", "one").expect("first");
        assert!(matches!(
            storage.create_user("alice", "two"),
            Err(StoreError::DuplicateUsername(_))
        ));
        // The original credential still wins.
        storage.authenticate("alice", "one").expect("auth");
    }

    #[test]
    fn username_must_be_a_clean_path_component() {
        let (_dir, storage) = open_temp();
        for bad in ["", "..", ".hidden", "a/b"] {
            assert!(matches!(
                storage.create_user(bad, "pw"),
                Err(StoreError::InvalidUsername(_))
            ));
        }
    }

    #[test]
    fn register_project_is_idempotent() {
        let (_dir, storage) = open_temp();
        let owner = storage.create_user("alice", "pw").expect("user");

        let first = storage.register_project(owner.id, "Demo").expect("register");
        let second = storage.register_project(owner.id, "Demo").expect("re-register");
        assert_eq!(first.id, second.id);

        let listed = storage.list_projects(owner.id).expect("list");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "Demo");
    }

    #[test]
    fn projects_are_scoped_to_their_owner() {
        let (_dir, storage) = open_temp();
        let alice = storage.create_user("alice", "pw").expect("alice");
        let bob = storage.create_user("bob", "pw").expect("bob");

        storage.register_project(alice.id, "site").expect("alice site");
        storage.register_project(bob.id, "site").expect("bob site");
        storage.register_project(bob.id, "blog").expect("bob blog");

        assert_eq!(storage.list_projects(alice.id).expect("list").len(), 1);
        let mut bob_names: Vec<String> = storage
            .list_projects(bob.id)
            .expect("list")
            .into_iter()
            .map(|p| p.name)
            .collect();
        bob_names.sort();
        assert_eq!(bob_names, vec!["blog", "site"]);

        assert!(storage.find_project(alice.id, "blog").expect("find").is_none());
    }
}
