//! Persistent tracking of already-downloaded media.

use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Ledger filename inside an account root.
pub const LEDGER_FILE: &str = "loaded.json";

/// Media categories tracked independently in the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaCategory {
    Posts,
    Stories,
    Highlights,
}

impl MediaCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            MediaCategory::Posts => "posts",
            MediaCategory::Stories => "stories",
            MediaCategory::Highlights => "highlights",
        }
    }
}

impl fmt::Display for MediaCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// On-disk shape of the ledger.
#[derive(Debug, Default, Serialize, Deserialize)]
struct LedgerFile {
    #[serde(default)]
    posts: Vec<String>,
    #[serde(default)]
    stories: Vec<String>,
    #[serde(default)]
    highlights: Vec<String>,
}

/// Per-account record of media identifiers already materialized, one set per
/// category.
///
/// The whole file is rewritten after every successful download. A crash
/// between download and rewrite may re-download one item on the next run;
/// that duplicate is tolerated rather than prevented. The ledger only grows
/// for the lifetime of the account directory.
#[derive(Debug)]
pub struct DedupLedger {
    path: PathBuf,
    posts: BTreeSet<String>,
    stories: BTreeSet<String>,
    highlights: BTreeSet<String>,
}

impl DedupLedger {
    /// Load the ledger for an account root. A missing file is a normal first
    /// run and yields an empty ledger.
    pub fn load(account_root: &Path) -> Result<Self> {
        let path = account_root.join(LEDGER_FILE);
        if !path.exists() {
            return Ok(Self::empty(path));
        }

        let raw = fs::read_to_string(&path)?;
        let file: LedgerFile = serde_json::from_str(&raw)?;
        Ok(Self {
            path,
            posts: file.posts.into_iter().collect(),
            stories: file.stories.into_iter().collect(),
            highlights: file.highlights.into_iter().collect(),
        })
    }

    fn empty(path: PathBuf) -> Self {
        Self {
            path,
            posts: BTreeSet::new(),
            stories: BTreeSet::new(),
            highlights: BTreeSet::new(),
        }
    }

    /// Whether `id` was already materialized for `category`.
    pub fn contains(&self, category: MediaCategory, id: &str) -> bool {
        self.set(category).contains(id)
    }

    /// Record a completed download and immediately rewrite the ledger file.
    pub fn mark_downloaded(&mut self, category: MediaCategory, id: impl Into<String>) -> Result<()> {
        self.set_mut(category).insert(id.into());
        self.persist()
    }

    /// Number of recorded identifiers for `category`.
    pub fn len(&self, category: MediaCategory) -> usize {
        self.set(category).len()
    }

    fn set(&self, category: MediaCategory) -> &BTreeSet<String> {
        match category {
            MediaCategory::Posts => &self.posts,
            MediaCategory::Stories => &self.stories,
            MediaCategory::Highlights => &self.highlights,
        }
    }

    fn set_mut(&mut self, category: MediaCategory) -> &mut BTreeSet<String> {
        match category {
            MediaCategory::Posts => &mut self.posts,
            MediaCategory::Stories => &mut self.stories,
            MediaCategory::Highlights => &mut self.highlights,
        }
    }

    fn persist(&self) -> Result<()> {
        let file = LedgerFile {
            posts: self.posts.iter().cloned().collect(),
            stories: self.stories.iter().cloned().collect(),
            highlights: self.highlights.iter().cloned().collect(),
        };
        fs::write(&self.path, serde_json::to_vec(&file)?)?;
        Ok(())
    }
}
