//! Catalog Repository

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::entity::{Addon, Collection, File, Group, Installed, Review, Tag, User, Version};
use crate::activity::argument::{ObjectKind, ObjectRef};
use crate::activity::resolver::{LogObject, ObjectResolver};
use crate::shared::error::{PlatformError, Result};

/// Storage for catalog objects
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn find_addon(&self, id: u64) -> Result<Option<Addon>>;
    async fn find_version(&self, id: u64) -> Result<Option<Version>>;
    async fn find_file(&self, id: u64) -> Result<Option<File>>;
    async fn find_user(&self, id: u64) -> Result<Option<User>>;
    async fn find_review(&self, id: u64) -> Result<Option<Review>>;
    async fn find_collection(&self, id: u64) -> Result<Option<Collection>>;
    async fn find_tag(&self, id: u64) -> Result<Option<Tag>>;
    async fn find_group(&self, id: u64) -> Result<Option<Group>>;
    async fn find_installed(&self, id: u64) -> Result<Option<Installed>>;

    /// Versions of an add-on, oldest first.
    async fn versions_for_addon(&self, addon_id: u64) -> Result<Vec<Version>>;
    async fn files_for_version(&self, version_id: u64) -> Result<Vec<File>>;

    async fn save_addon(&self, addon: &Addon) -> Result<()>;
    /// Remove a version together with its files.
    async fn delete_version(&self, id: u64) -> Result<Version>;
    async fn delete_file(&self, id: u64) -> Result<File>;
}

#[derive(Default)]
struct CatalogState {
    addons: BTreeMap<u64, Addon>,
    versions: BTreeMap<u64, Version>,
    files: BTreeMap<u64, File>,
    users: BTreeMap<u64, User>,
    reviews: BTreeMap<u64, Review>,
    collections: BTreeMap<u64, Collection>,
    tags: BTreeMap<u64, Tag>,
    groups: BTreeMap<u64, Group>,
    installed: BTreeMap<u64, Installed>,
}

/// In-memory catalog for tests and the dev tool
#[derive(Default)]
pub struct InMemoryCatalog {
    state: RwLock<CatalogState>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_addon(&self, addon: Addon) {
        self.state.write().addons.insert(addon.id, addon);
    }

    pub fn insert_version(&self, version: Version) {
        self.state.write().versions.insert(version.id, version);
    }

    pub fn insert_file(&self, file: File) {
        self.state.write().files.insert(file.id, file);
    }

    pub fn insert_user(&self, user: User) {
        self.state.write().users.insert(user.id, user);
    }

    pub fn insert_review(&self, review: Review) {
        self.state.write().reviews.insert(review.id, review);
    }

    pub fn insert_collection(&self, collection: Collection) {
        self.state.write().collections.insert(collection.id, collection);
    }

    pub fn insert_tag(&self, tag: Tag) {
        self.state.write().tags.insert(tag.id, tag);
    }

    pub fn insert_group(&self, group: Group) {
        self.state.write().groups.insert(group.id, group);
    }

    pub fn insert_installed(&self, installed: Installed) {
        self.state.write().installed.insert(installed.id, installed);
    }

    pub fn remove_user(&self, id: u64) -> Option<User> {
        self.state.write().users.remove(&id)
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalog {
    async fn find_addon(&self, id: u64) -> Result<Option<Addon>> {
        Ok(self.state.read().addons.get(&id).cloned())
    }

    async fn find_version(&self, id: u64) -> Result<Option<Version>> {
        Ok(self.state.read().versions.get(&id).cloned())
    }

    async fn find_file(&self, id: u64) -> Result<Option<File>> {
        Ok(self.state.read().files.get(&id).cloned())
    }

    async fn find_user(&self, id: u64) -> Result<Option<User>> {
        Ok(self.state.read().users.get(&id).cloned())
    }

    async fn find_review(&self, id: u64) -> Result<Option<Review>> {
        Ok(self.state.read().reviews.get(&id).cloned())
    }

    async fn find_collection(&self, id: u64) -> Result<Option<Collection>> {
        Ok(self.state.read().collections.get(&id).cloned())
    }

    async fn find_tag(&self, id: u64) -> Result<Option<Tag>> {
        Ok(self.state.read().tags.get(&id).cloned())
    }

    async fn find_group(&self, id: u64) -> Result<Option<Group>> {
        Ok(self.state.read().groups.get(&id).cloned())
    }

    async fn find_installed(&self, id: u64) -> Result<Option<Installed>> {
        Ok(self.state.read().installed.get(&id).cloned())
    }

    async fn versions_for_addon(&self, addon_id: u64) -> Result<Vec<Version>> {
        let state = self.state.read();
        let mut versions: Vec<Version> = state
            .versions
            .values()
            .filter(|version| version.addon_id == addon_id)
            .cloned()
            .collect();
        versions.sort_by(|a, b| a.created.cmp(&b.created).then(a.id.cmp(&b.id)));
        Ok(versions)
    }

    async fn files_for_version(&self, version_id: u64) -> Result<Vec<File>> {
        Ok(self
            .state
            .read()
            .files
            .values()
            .filter(|file| file.version_id == version_id)
            .cloned()
            .collect())
    }

    async fn save_addon(&self, addon: &Addon) -> Result<()> {
        self.state.write().addons.insert(addon.id, addon.clone());
        Ok(())
    }

    async fn delete_version(&self, id: u64) -> Result<Version> {
        let mut state = self.state.write();
        let version = state
            .versions
            .remove(&id)
            .ok_or_else(|| PlatformError::not_found("Version", id))?;
        state.files.retain(|_, file| file.version_id != id);
        Ok(version)
    }

    async fn delete_file(&self, id: u64) -> Result<File> {
        self.state
            .write()
            .files
            .remove(&id)
            .ok_or_else(|| PlatformError::not_found("File", id))
    }
}

/// Resolves activity references against a [`CatalogStore`].
#[derive(Clone)]
pub struct CatalogResolver {
    store: Arc<dyn CatalogStore>,
}

impl CatalogResolver {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ObjectResolver for CatalogResolver {
    async fn resolve(&self, reference: ObjectRef) -> Result<Option<LogObject>> {
        let id = reference.id;
        let object = match reference.kind {
            ObjectKind::Addon => self.store.find_addon(id).await?.map(LogObject::Addon),
            ObjectKind::Version => self.store.find_version(id).await?.map(LogObject::Version),
            ObjectKind::File => self.store.find_file(id).await?.map(LogObject::File),
            ObjectKind::User => self.store.find_user(id).await?.map(LogObject::User),
            ObjectKind::Review => self.store.find_review(id).await?.map(LogObject::Review),
            ObjectKind::Collection => {
                self.store.find_collection(id).await?.map(LogObject::Collection)
            }
            ObjectKind::Tag => self.store.find_tag(id).await?.map(LogObject::Tag),
            ObjectKind::Group => self.store.find_group(id).await?.map(LogObject::Group),
        };
        Ok(object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::AddonStatus;

    #[tokio::test]
    async fn test_delete_version_cascades_files() {
        let catalog = InMemoryCatalog::new();
        catalog.insert_version(Version::new(1, 10, "1.0"));
        catalog.insert_file(File::new(100, 1, "a.xpi", AddonStatus::Public));
        catalog.insert_file(File::new(101, 2, "b.xpi", AddonStatus::Public));

        let removed = catalog.delete_version(1).await.unwrap();
        assert_eq!(removed.version, "1.0");
        assert!(catalog.find_file(100).await.unwrap().is_none());
        assert!(catalog.find_file(101).await.unwrap().is_some());
        assert!(catalog.delete_version(1).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_resolver_round_trip() {
        let catalog = Arc::new(InMemoryCatalog::new());
        catalog.insert_addon(Addon::new(3615, "Delicious Bookmarks", "a3615"));
        let resolver = CatalogResolver::new(catalog);

        let found = resolver
            .resolve(ObjectRef::new(ObjectKind::Addon, 3615))
            .await
            .unwrap();
        assert!(matches!(found, Some(LogObject::Addon(addon)) if addon.id == 3615));

        let missing = resolver
            .resolve(ObjectRef::new(ObjectKind::Addon, 1))
            .await
            .unwrap();
        assert!(missing.is_none());
    }
}
