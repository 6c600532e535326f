//! Zine persistence: metadata plus page and print-sheet images.
//!
//! The pipeline and the compositor only talk to [`ZineStore`]. Page images are
//! addressed by an opaque reference string returned from the store, so a
//! remote store could hand out URLs instead of paths.
//!
//! ## Filesystem layout
//!
//! [`FsStore`] keeps one directory per zine under its root:
//!
//! ```text
//! <root>/
//! ├── config.toml          # optional, see crate::config
//! └── <zine-id>/
//!     ├── zine.json        # Zine metadata (camelCase JSON)
//!     ├── p1.png … p8.png  # current image of each page
//!     └── print.png        # last assembled print sheet
//! ```
//!
//! References handed out by `FsStore` are paths relative to the root, e.g.
//! `3f2c…/p4.png`.

use crate::types::{PAGE_COUNT, PageNumber, Zine};
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Metadata file inside each zine directory.
pub const ZINE_FILENAME: &str = "zine.json";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Zine metadata is corrupt: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Zine not found: {0}")]
    ZineNotFound(String),
    #[error("Invalid zine id: {0:?}")]
    InvalidId(String),
    #[error("Invalid file reference: {0:?}")]
    InvalidReference(String),
    #[error("Expected {PAGE_COUNT} pages, got {found}")]
    IncompletePages { found: usize },
}

/// Storage collaborator for zines and their images.
pub trait ZineStore {
    fn load_zine(&self, id: &str) -> Result<Zine, StoreError>;

    fn save_zine(&self, zine: &Zine) -> Result<(), StoreError>;

    /// Store (or replace) a page image; returns its reference.
    fn save_page_image(&self, id: &str, page: PageNumber, png: &[u8])
    -> Result<String, StoreError>;

    /// Reference a page image would have, whether or not it exists yet.
    fn page_image_path(&self, id: &str, page: PageNumber) -> Result<String, StoreError>;

    /// References of all 8 page images in page order.
    ///
    /// Fails with [`StoreError::IncompletePages`] unless every page exists.
    fn all_page_paths(&self, id: &str) -> Result<Vec<String>, StoreError>;

    fn read_file(&self, reference: &str) -> Result<Vec<u8>, StoreError>;

    /// Whether a file exists at `reference`. Only a missing file is `false`;
    /// any other I/O failure is an error.
    fn file_exists(&self, reference: &str) -> Result<bool, StoreError>;

    /// Store the print sheet; returns its reference.
    fn save_print_layout(&self, id: &str, png: &[u8]) -> Result<String, StoreError>;

    /// All zines, oldest first.
    fn list_zines(&self) -> Result<Vec<Zine>, StoreError>;
}

/// Filesystem-backed store rooted at a directory.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
    layout_filename: String,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            layout_filename: "print.png".to_string(),
        }
    }

    /// Use a different file name for the print sheet.
    pub fn with_layout_filename(mut self, filename: impl Into<String>) -> Self {
        self.layout_filename = filename.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path of a reference.
    pub fn resolve(&self, reference: &str) -> Result<PathBuf, StoreError> {
        let rel = Path::new(reference);
        let safe = !reference.is_empty()
            && rel
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(StoreError::InvalidReference(reference.to_string()));
        }
        Ok(self.root.join(rel))
    }

    fn zine_dir(&self, id: &str) -> Result<PathBuf, StoreError> {
        let valid = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StoreError::InvalidId(id.to_string()));
        }
        Ok(self.root.join(id))
    }

    fn existing_zine_dir(&self, id: &str) -> Result<PathBuf, StoreError> {
        let dir = self.zine_dir(id)?;
        if !dir.join(ZINE_FILENAME).is_file() {
            return Err(StoreError::ZineNotFound(id.to_string()));
        }
        Ok(dir)
    }
}

/// File name of a page image.
pub fn page_filename(page: PageNumber) -> String {
    format!("p{page}.png")
}

impl ZineStore for FsStore {
    fn load_zine(&self, id: &str) -> Result<Zine, StoreError> {
        let path = self.zine_dir(id)?.join(ZINE_FILENAME);
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::ZineNotFound(id.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_str(&content)?)
    }

    fn save_zine(&self, zine: &Zine) -> Result<(), StoreError> {
        let dir = self.zine_dir(&zine.id)?;
        std::fs::create_dir_all(&dir)?;
        let json = serde_json::to_string_pretty(zine)?;
        std::fs::write(dir.join(ZINE_FILENAME), json)?;
        Ok(())
    }

    fn save_page_image(
        &self,
        id: &str,
        page: PageNumber,
        png: &[u8],
    ) -> Result<String, StoreError> {
        let dir = self.existing_zine_dir(id)?;
        std::fs::write(dir.join(page_filename(page)), png)?;
        self.page_image_path(id, page)
    }

    fn page_image_path(&self, id: &str, page: PageNumber) -> Result<String, StoreError> {
        self.zine_dir(id)?;
        Ok(format!("{id}/{}", page_filename(page)))
    }

    fn all_page_paths(&self, id: &str) -> Result<Vec<String>, StoreError> {
        let dir = self.existing_zine_dir(id)?;
        let paths: Vec<String> = PageNumber::all()
            .filter(|&page| dir.join(page_filename(page)).is_file())
            .map(|page| format!("{id}/{}", page_filename(page)))
            .collect();
        if paths.len() != PAGE_COUNT {
            return Err(StoreError::IncompletePages { found: paths.len() });
        }
        Ok(paths)
    }

    fn read_file(&self, reference: &str) -> Result<Vec<u8>, StoreError> {
        Ok(std::fs::read(self.resolve(reference)?)?)
    }

    fn file_exists(&self, reference: &str) -> Result<bool, StoreError> {
        match std::fs::metadata(self.resolve(reference)?) {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn save_print_layout(&self, id: &str, png: &[u8]) -> Result<String, StoreError> {
        let dir = self.existing_zine_dir(id)?;
        std::fs::write(dir.join(&self.layout_filename), png)?;
        Ok(format!("{id}/{}", self.layout_filename))
    }

    fn list_zines(&self) -> Result<Vec<Zine>, StoreError> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }
        let mut zines = Vec::new();
        for entry in WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_dir())
        {
            let meta = entry.path().join(ZINE_FILENAME);
            if !meta.is_file() {
                continue;
            }
            let content = std::fs::read_to_string(&meta)?;
            match serde_json::from_str::<Zine>(&content) {
                Ok(zine) => zines.push(zine),
                Err(e) => tracing::warn!(path = %meta.display(), error = %e, "skipping unreadable zine"),
            }
        }
        zines.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(zines)
    }
}
