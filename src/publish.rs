//! Publish pipeline: editor content in, servable artifact set out.
//!
//! A publish validates the project name, upserts the registry record, writes
//! `style.css`, `script.js` and the synthesized `index.html` into a staging
//! directory, and swaps the staging directory into
//! `{root}/{username}/{project}` by rename. Publishes to the same
//! (owner, project) key are serialized by a per-key lock, so the served
//! directory always matches exactly one submission.

use maud::{html, Markup, PreEscaped, DOCTYPE};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::error::PublishError;
use crate::models::User;
use crate::naming;
use crate::storage::Storage;

#[derive(Debug, Clone)]
pub struct PublishResult {
    /// Canonical URL of the deployed project: `/{username}/{project}`.
    pub url: String,
}

pub struct Publisher {
    root: PathBuf,
    /// One async mutex per (owner, project) key. Entries are never dropped;
    /// the table grows with the number of distinct targets, not with traffic.
    locks: Mutex<HashMap<(Uuid, String), Arc<tokio::sync::Mutex<()>>>>,
}

impl Publisher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Root of the on-disk artifact tree, shared read-only with the resolver.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Publish editor content as the artifact set of `(owner, raw_name)`.
    ///
    /// Name validation happens before any registry or filesystem write. The
    /// registry row is written before the files (a crash in between leaves a
    /// registered project without files; directory existence stays the source
    /// of truth for servability). Republishing fully overwrites prior content.
    pub async fn publish(
        &self,
        storage: &Storage,
        owner: &User,
        raw_name: &str,
        html_src: &str,
        css: &str,
        js: &str,
    ) -> Result<PublishResult, PublishError> {
        let name =
            naming::normalize_project_name(raw_name).ok_or(PublishError::EmptyProjectName)?;
        if !naming::is_clean_component(&name) {
            return Err(PublishError::InvalidProjectName(name));
        }

        let lock = self.lock_for(owner.id, &name);
        let _guard = lock.lock().await;

        storage.register_project(owner.id, &name)?;
        self.write_artifacts(&owner.username, &name, html_src, css, js)?;

        tracing::debug!(owner = %owner.username, project = %name, "artifact set swapped in");
        Ok(PublishResult {
            url: format!("/{}/{}", owner.username, name),
        })
    }

    fn lock_for(&self, owner_id: Uuid, name: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self
            .locks
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        locks
            .entry((owner_id, name.to_string()))
            .or_default()
            .clone()
    }

    /// Write the artifact set into a fresh staging directory next to the
    /// target, then swap it into place. On any failure the staging directory
    /// is removed and the previously published set (if any) stays intact.
    fn write_artifacts(
        &self,
        username: &str,
        name: &str,
        html_src: &str,
        css: &str,
        js: &str,
    ) -> Result<(), PublishError> {
        let owner_dir = self.root.join(username);
        fs::create_dir_all(&owner_dir)?;

        let tag = Uuid::new_v4().simple().to_string();
        let stage = owner_dir.join(format!(".stage-{name}-{tag}"));
        let retired = owner_dir.join(format!(".old-{name}-{tag}"));
        let target = owner_dir.join(name);

        let staged = stage_artifacts(&stage, username, name, html_src, css, js)
            .and_then(|()| swap_into_place(&stage, &target, &retired));
        if let Err(err) = staged {
            let _ = fs::remove_dir_all(&stage);
            return Err(PublishError::PublishFailed(err));
        }
        Ok(())
    }
}

fn stage_artifacts(
    stage: &Path,
    username: &str,
    name: &str,
    html_src: &str,
    css: &str,
    js: &str,
) -> std::io::Result<()> {
    fs::create_dir(stage)?;
    fs::write(stage.join("style.css"), css)?;
    fs::write(stage.join("script.js"), js)?;
    fs::write(
        stage.join("index.html"),
        entry_document(username, name, html_src).into_string(),
    )
}

/// A rename cannot land on an existing non-empty directory, so a previous
/// deployment is moved aside first and removed once the new set is live.
fn swap_into_place(stage: &Path, target: &Path, retired: &Path) -> std::io::Result<()> {
    if target.exists() {
        fs::rename(target, retired)?;
    }
    fs::rename(stage, target)?;
    if retired.exists() {
        let _ = fs::remove_dir_all(retired);
    }
    Ok(())
}

/// Fixed document shell around the user's markup. The project name reaches the
/// `<title>` through maud's automatic escaping; only the body payload passes
/// through raw (`PreEscaped`). Styles and script are referenced as
/// project-relative siblings, matching the served layout.
fn entry_document(username: &str, name: &str, body: &str) -> Markup {
    let base = format!("/{username}/{name}");
    html! {
        (DOCTYPE)
        html {
            head {
                title { (name) }
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                link rel="stylesheet" href=(format!("{base}/style.css"));
            }
            body {
                (PreEscaped(body))
                script src=(format!("{base}/script.js")) {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> (tempfile::TempDir, Storage, Publisher, User) {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = Storage::open(dir.path().join("db")).expect("storage");
        let publisher = Publisher::new(dir.path().join("projects"));
        let owner = storage.create_user("alice", "pw").expect("user");
        (dir, storage, publisher, owner)
    }

    #[tokio::test]
    async fn publish_round_trip_writes_all_three_artifacts() {
        let (_dir, storage, publisher, owner) = fixture();
        let result = publisher
            .publish(
                &storage,
                &owner,
                "Demo",
                "<h1>Hi</h1>",
                "body{color:red}",
                "console.log(1)",
            )
            .await
            .expect("publish");
        assert_eq!(result.url, "/alice/Demo");

        let project_dir = publisher.root().join("alice").join("Demo");
        let index = fs::read_to_string(project_dir.join("index.html")).expect("index");
        assert!(index.contains("<h1>Hi</h1>"));
        assert!(index.contains("/alice/Demo/style.css"));
        assert!(index.contains("/alice/Demo/script.js"));
        assert_eq!(
            fs::read_to_string(project_dir.join("style.css")).expect("css"),
            "body{color:red}"
        );
        assert_eq!(
            fs::read_to_string(project_dir.join("script.js")).expect("js"),
            "console.log(1)"
        );
    }

    #[tokio::test]
    async fn publishing_twice_keeps_one_registry_row_and_overwrites_files() {
        let (_dir, storage, publisher, owner) = fixture();
        publisher
            .publish(&storage, &owner, "My Site", "<p>one</p>", "", "")
            .await
            .expect("first");
        publisher
            .publish(&storage, &owner, " My Site ", "<p>two</p>", "", "")
            .await
            .expect("second");

        // Both raw names normalize to the same key.
        assert_eq!(storage.list_projects(owner.id).expect("list").len(), 1);
        assert!(storage.find_project(owner.id, "My-Site").expect("find").is_some());

        let index = fs::read_to_string(
            publisher.root().join("alice").join("My-Site").join("index.html"),
        )
        .expect("index");
        assert!(index.contains("<p>two</p>"));
        assert!(!index.contains("<p>one</p>"));
    }

    #[tokio::test]
    async fn empty_name_fails_before_any_write() {
        let (_dir, storage, publisher, owner) = fixture();
        let err = publisher
            .publish(&storage, &owner, "   ", "<p>x</p>", "", "")
            .await
            .expect_err("must fail");
        assert!(matches!(err, PublishError::EmptyProjectName));

        assert!(storage.list_projects(owner.id).expect("list").is_empty());
        assert!(!publisher.root().join("alice").exists());
    }

    #[tokio::test]
    async fn traversal_shaped_names_are_rejected() {
        let (_dir, storage, publisher, owner) = fixture();
        for raw in ["..", "../evil", "a/b", ".hidden"] {
            let err = publisher
                .publish(&storage, &owner, raw, "", "", "")
                .await
                .expect_err("must fail");
            assert!(matches!(err, PublishError::InvalidProjectName(_)), "{raw}");
        }
        assert!(storage.list_projects(owner.id).expect("list").is_empty());
    }

    #[tokio::test]
    async fn title_is_escaped_body_is_raw() {
        let (_dir, storage, publisher, owner) = fixture();
        publisher
            .publish(
                &storage,
                &owner,
                "<img src=x>",
                "<script>payload()</script>",
                "",
                "",
            )
            .await
            .expect("publish");

        let index = fs::read_to_string(
            publisher
                .root()
                .join("alice")
                .join("<img-src=x>")
                .join("index.html"),
        )
        .expect("index");
        // Title interpolation is escaped...
        assert!(index.contains("<title>&lt;img-src=x&gt;</title>"));
        // ...while the body payload passes through verbatim.
        assert!(index.contains("<script>payload()</script>"));
    }

    #[tokio::test]
    async fn concurrent_publishes_leave_one_coherent_artifact_set() {
        let (_dir, storage, publisher, owner) = fixture();
        let storage = Arc::new(storage);
        let publisher = Arc::new(publisher);

        let submissions = ["one", "two", "three", "four"];
        let tasks = submissions.iter().map(|tag| {
            let storage = Arc::clone(&storage);
            let publisher = Arc::clone(&publisher);
            let owner = owner.clone();
            async move {
                publisher
                    .publish(
                        &storage,
                        &owner,
                        "race",
                        &format!("<p>{tag}</p>"),
                        &format!("/* {tag} */"),
                        &format!("// {tag}"),
                    )
                    .await
            }
        });
        for result in futures::future::join_all(tasks).await {
            result.expect("publish");
        }

        // Exactly one registry row, and all three files from the same submission.
        assert_eq!(storage.list_projects(owner.id).expect("list").len(), 1);
        let dir = publisher.root().join("alice").join("race");
        let index = fs::read_to_string(dir.join("index.html")).expect("index");
        let css = fs::read_to_string(dir.join("style.css")).expect("css");
        let js = fs::read_to_string(dir.join("script.js")).expect("js");
        let winner = submissions
            .iter()
            .find(|tag| index.contains(&format!("<p>{tag}</p>")))
            .expect("index matches a submission");
        assert_eq!(css, format!("/* {winner} */"));
        assert_eq!(js, format!("// {winner}"));

        // No staging or retired directories survive.
        for entry in fs::read_dir(publisher.root().join("alice")).expect("read_dir") {
            let file_name = entry.expect("entry").file_name();
            assert!(!file_name.to_string_lossy().starts_with('.'));
        }
    }
}
