//! Template-facing name resolution.
//!
//! Templates refer to records by display name. A [`NameResolver`] indexes one
//! folder listing by lowercased name and unlocks records on demand; nothing
//! is cached, so every reference costs one round trip.

use crate::{
    client::XtamClient,
    config::XtamConfig,
    error::{ResolutionError, XtamResult},
    provider::RecordStore,
    records::{FolderEntry, RecordKind},
};
use secrecy::SecretString;
use std::collections::HashMap;
use tracing::{debug, instrument};

/// Case-insensitive index of a folder listing.
#[derive(Debug, Clone, Default)]
pub struct NameIndex {
    secrets: HashMap<String, u64>,
    certificates: HashMap<String, u64>,
    types: HashMap<String, String>,
}

impl NameIndex {
    /// Index `entries`.
    ///
    /// Records of other types are only used to detect collisions.
    ///
    /// # Errors
    ///
    /// Returns [`ResolutionError::DuplicateName`] as soon as two entries
    /// share a name ignoring case, whatever their types.
    pub fn build<I>(entries: I) -> Result<Self, ResolutionError>
    where
        I: IntoIterator<Item = FolderEntry>,
    {
        let mut index = Self::default();

        for entry in entries {
            let key = entry.name.to_lowercase();
            let second = entry.record_type.name().to_string();

            if let Some(first) = index.types.get(&key) {
                return Err(ResolutionError::DuplicateName {
                    name: entry.name,
                    first: first.clone(),
                    second,
                });
            }

            match RecordKind::of(&entry.record_type) {
                Some(RecordKind::Secret) => {
                    index.secrets.insert(key.clone(), entry.id);
                }
                Some(RecordKind::Certificate) => {
                    index.certificates.insert(key.clone(), entry.id);
                }
                None => {}
            }
            index.types.insert(key, second);
        }

        Ok(index)
    }

    /// ID of the record of `kind` named `name`, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns [`ResolutionError::NotFound`] listing every known name of
    /// that kind.
    pub fn lookup(&self, kind: RecordKind, name: &str) -> Result<u64, ResolutionError> {
        let name = name.to_lowercase();
        self.by_kind(kind)
            .get(&name)
            .copied()
            .ok_or_else(|| ResolutionError::NotFound {
                kind,
                name,
                known: self.names(kind),
            })
    }

    /// Known names of `kind`, lowercased and sorted.
    #[must_use]
    pub fn names(&self, kind: RecordKind) -> Vec<String> {
        let mut names: Vec<String> = self.by_kind(kind).keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Number of records of `kind`.
    #[must_use]
    pub fn len(&self, kind: RecordKind) -> usize {
        self.by_kind(kind).len()
    }

    /// Whether the listing had no records at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    fn by_kind(&self, kind: RecordKind) -> &HashMap<String, u64> {
        match kind {
            RecordKind::Secret => &self.secrets,
            RecordKind::Certificate => &self.certificates,
        }
    }
}

/// Resolves names used in templates to secret values and certificates.
#[derive(Debug)]
pub struct NameResolver<S> {
    store: S,
    index: NameIndex,
}

impl NameResolver<XtamClient> {
    /// Authenticate against XTAM with `config` and index its configured folder.
    ///
    /// # Errors
    ///
    /// Fails if the configuration is invalid, the listing cannot be fetched,
    /// or the folder has duplicate names.
    pub async fn from_config(config: &XtamConfig) -> XtamResult<Self> {
        let client = XtamClient::new(config)?;
        Self::new(&config.folder_id, client).await
    }
}

impl<S: RecordStore> NameResolver<S> {
    /// List `container_id` through `store` and index the result.
    ///
    /// # Errors
    ///
    /// Fails if the listing cannot be fetched or has duplicate names.
    #[instrument(skip(store))]
    pub async fn new(container_id: &str, store: S) -> XtamResult<Self> {
        let entries = store.list_container(container_id).await?;
        let resolver = Self::from_entries(entries, store)?;
        debug!(
            secrets = resolver.index.len(RecordKind::Secret),
            certificates = resolver.index.len(RecordKind::Certificate),
            "indexed folder"
        );
        Ok(resolver)
    }

    /// Index an already fetched listing.
    ///
    /// # Errors
    ///
    /// Returns [`ResolutionError::DuplicateName`] on a name collision.
    pub fn from_entries<I>(entries: I, store: S) -> Result<Self, ResolutionError>
    where
        I: IntoIterator<Item = FolderEntry>,
    {
        Ok(Self {
            store,
            index: NameIndex::build(entries)?,
        })
    }

    /// Value of the secret named `name`, ignoring case.
    ///
    /// # Errors
    ///
    /// Fails if no secret has that name or unlocking it fails.
    #[instrument(skip(self))]
    pub async fn secret(&self, name: &str) -> XtamResult<SecretString> {
        let id = self.index.lookup(RecordKind::Secret, name)?;
        self.store.unlock_secret(id).await
    }

    /// PEM bytes of the certificate named `name`, ignoring case.
    ///
    /// # Errors
    ///
    /// Fails if no certificate has that name or unlocking it fails.
    #[instrument(skip(self))]
    pub async fn certificate_pem(&self, name: &str) -> XtamResult<Vec<u8>> {
        let id = self.index.lookup(RecordKind::Certificate, name)?;
        self.store.unlock_certificate_pem(id).await
    }

    /// Known secret names, lowercased and sorted.
    #[must_use]
    pub fn secret_names(&self) -> Vec<String> {
        self.index.names(RecordKind::Secret)
    }

    /// Known certificate names, lowercased and sorted.
    #[must_use]
    pub fn certificate_names(&self) -> Vec<String> {
        self.index.names(RecordKind::Certificate)
    }

    /// The underlying name index.
    #[must_use]
    pub const fn index(&self) -> &NameIndex {
        &self.index
    }

    /// The store records are unlocked from.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }
}
