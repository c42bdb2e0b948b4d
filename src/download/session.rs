//! Per-account archiving session.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Local, TimeZone};
use indicatif::{ProgressBar, ProgressStyle};

use crate::api::types::{
    HighlightIndexPayload, PostItem, ProfilePayload, ProfileUser, StoriesPayload, StoryItem,
    UserListExport, UserLookupPayload, UserRef, UserRefExport, UserSummary,
};
use crate::api::ClientPool;
use crate::config::Config;
use crate::dedup::{DedupLedger, MediaCategory};
use crate::download::media::MediaDownloader;
use crate::download::paginate::paginate;
use crate::error::{Error, Result};
use crate::store::{sanitize_segment, LogicalKey, SnapshotStore};

/// Category directories created under the account root and mirrored under
/// `raw/` for snapshots.
const CATEGORY_DIRS: &[&str] = &["posts", "stories", "highlights", "followers", "following"];

/// Capture-time tag used in media directory and file names.
const DATE_FORMAT: &str = "%Y-%m-%d %Hh%Mm%Ss";

/// A highlight reel with its stories resolved.
#[derive(Debug, Clone)]
pub struct Highlight {
    pub id: String,
    pub title: String,
    pub items: Vec<StoryItem>,
}

/// Binds one account to its archive directory, snapshot store, dedup ledger
/// and client pool for the duration of a run.
pub struct AccountSession {
    pool: ClientPool,
    store: SnapshotStore,
    ledger: DedupLedger,
    downloader: MediaDownloader,
    root: PathBuf,
    username: String,
    user_id: u64,
    posts_page_size: usize,
    followers_page_size: usize,
    following_page_size: usize,
}

impl AccountSession {
    /// Resolve `user` (username, or numeric user id) and bind the session to
    /// its archive directory, creating the directory tree on first use.
    pub fn open(config: &Config, user: &str) -> Result<Self> {
        let pool = ClientPool::new(&config.account.tokens, &config.account.user_agent)?;
        let downloader = MediaDownloader::new(&config.account.user_agent)?;

        // Numeric input is a user id; anything else is a username. An id is
        // resolved to its username directly, since the archive directory is
        // named by username and does not exist yet.
        let (id_hint, username) = match user.trim().parse::<u64>() {
            Ok(id) => {
                let profile = pool.pick().fetch_profile(id)?;
                (Some(id), profile.user.username)
            }
            Err(_) => (None, user.trim().to_string()),
        };

        let root = config.output_directory().join(sanitize_segment(&username)?);
        bootstrap_directories(&root)?;

        let store = SnapshotStore::new(root.join("raw"), config.options.save_raw);

        let user_id = match id_hint {
            Some(id) => id,
            None => {
                let key = LogicalKey::new("user_lookup")?;
                let lookup: UserLookupPayload =
                    store.fetch_or_load(&key, false, || pool.pick().lookup_user(&username))?;
                lookup.data.user.id.parse().map_err(|_| {
                    Error::Remote(format!("Unparseable user id '{}'", lookup.data.user.id))
                })?
            }
        };

        let ledger = DedupLedger::load(&root)?;
        tracing::info!(username = %username, user_id, "session opened");

        Ok(Self {
            pool,
            store,
            ledger,
            downloader,
            root,
            username,
            user_id,
            posts_page_size: config.options.posts_page_size,
            followers_page_size: config.options.followers_page_size,
            following_page_size: config.options.following_page_size,
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn user_id(&self) -> u64 {
        self.user_id
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Profile data, cached under `user_info`.
    pub fn profile(&self, update: bool) -> Result<ProfileUser> {
        let key = LogicalKey::new("user_info")?;
        let payload: ProfilePayload = self
            .store
            .fetch_or_load(&key, update, || self.pool.pick().fetch_profile(self.user_id))?;
        Ok(payload.user)
    }

    pub fn is_private(&self, update: bool) -> Result<bool> {
        Ok(self.profile(update)?.is_private)
    }

    /// Write `user_info.txt` and the profile picture to the account root.
    pub fn export_profile(&self, update: bool) -> Result<()> {
        let user = self.profile(update)?;

        let mut summary = String::new();
        let _ = writeln!(summary, "Username: {}", user.username);
        let _ = writeln!(summary, "User ID: {}", user.pk);
        let _ = writeln!(summary, "Full Name: {}", user.full_name);
        let _ = writeln!(summary, "Biography: {}", user.biography);
        let _ = writeln!(summary, "Followers: {}", user.follower_count);
        let _ = writeln!(summary, "Following: {}", user.following_count);
        let _ = writeln!(summary, "Posts: {}", user.media_count);
        fs::write(self.root.join("user_info.txt"), summary)?;

        if let Some(pic) = &user.hd_profile_pic_url_info {
            self.downloader
                .fetch_to(&pic.url, &self.root.join("propic.jpg"))?;
        }

        Ok(())
    }

    /// All posts merged across pages, newest first.
    pub fn posts(&self, limit: Option<usize>, update: bool) -> Result<Vec<PostItem>> {
        paginate(&self.store, "posts", limit, update, |cursor| {
            self.pool
                .pick()
                .fetch_media_page(self.user_id, self.posts_page_size, cursor)
        })
    }

    /// Download post media (and captions) into `posts/post_<date>/`.
    ///
    /// A carousel post expands to sibling files `0..N-1` in its directory.
    /// One failed item does not abort the batch.
    pub fn download_posts(&mut self, limit: Option<usize>, update: bool) -> Result<()> {
        let posts = self.posts(limit, update)?;
        let take = limit.unwrap_or(usize::MAX);
        let shown = posts.len().min(take);
        tracing::info!(count = shown, "downloading posts");

        let progress = batch_progress(shown as u64, "posts");
        for post in posts.iter().take(take) {
            let post_dir = self
                .root
                .join("posts")
                .join(format!("post_{}", format_capture_date(post.taken_at)));
            fs::create_dir_all(&post_dir)?;

            for (index, media) in post.carousel().into_iter().enumerate() {
                match self.downloader.materialize(
                    &mut self.ledger,
                    MediaCategory::Posts,
                    media,
                    &post_dir,
                    &index.to_string(),
                ) {
                    Ok(Some(path)) => tracing::debug!(path = %path.display(), "downloaded"),
                    Ok(None) => {}
                    Err(e) => {
                        tracing::warn!(id = %media.id, "Failed to download post media: {}", e)
                    }
                }
            }

            if let Some(text) = post.caption_text() {
                fs::write(post_dir.join("caption.txt"), text)?;
            }
            progress.inc(1);
        }
        progress.finish_and_clear();

        Ok(())
    }

    /// The live story reel, cached under `stories/stories`.
    pub fn stories(&self, update: bool) -> Result<Vec<StoryItem>> {
        let key = LogicalKey::new("stories")?.child("stories")?;
        let payload: StoriesPayload = self
            .store
            .fetch_or_load(&key, update, || self.pool.pick().fetch_stories(self.user_id))?;
        Ok(payload.reel_items(&self.user_id.to_string()).to_vec())
    }

    /// Download story media into `stories/`.
    pub fn download_stories(&mut self, update: bool) -> Result<()> {
        let stories = self.stories(update)?;
        tracing::info!(count = stories.len(), "downloading stories");

        let dest_dir = self.root.join("stories");
        let progress = batch_progress(stories.len() as u64, "stories");
        for story in &stories {
            let stem = format!("story_{}", format_capture_date(story.taken_at));
            match self.downloader.materialize(
                &mut self.ledger,
                MediaCategory::Stories,
                &story.media,
                &dest_dir,
                &stem,
            ) {
                Ok(_) => {}
                Err(e) => tracing::warn!(id = %story.media.id, "Failed to download story: {}", e),
            }
            progress.inc(1);
        }
        progress.finish_and_clear();

        Ok(())
    }

    /// Highlight reels with their stories, cached under `highlight_index`
    /// and `highlights/<title>`.
    pub fn highlights(&self, update: bool) -> Result<Vec<Highlight>> {
        let index_key = LogicalKey::new("highlight_index")?;
        let index: HighlightIndexPayload = self.store.fetch_or_load(&index_key, update, || {
            self.pool.pick().fetch_highlight_index(self.user_id)
        })?;

        let mut highlights = Vec::new();
        for node in index.nodes() {
            let key = LogicalKey::new("highlights")?.child(&node.title)?;
            let reel: StoriesPayload = self.store.fetch_or_load(&key, update, || {
                self.pool.pick().fetch_highlight_stories(&node.id)
            })?;
            let items = reel
                .reel_items(&format!("highlight:{}", node.id))
                .to_vec();
            highlights.push(Highlight {
                id: node.id.clone(),
                title: node.title.clone(),
                items,
            });
        }

        Ok(highlights)
    }

    /// Download highlight media into `highlights/<title>/`.
    pub fn download_highlights(&mut self, update: bool) -> Result<()> {
        let highlights = self.highlights(update)?;
        tracing::info!(count = highlights.len(), "downloading highlights");

        for highlight in &highlights {
            let dest_dir = self
                .root
                .join("highlights")
                .join(sanitize_segment(&highlight.title)?);
            fs::create_dir_all(&dest_dir)?;

            let progress = batch_progress(highlight.items.len() as u64, &highlight.title);
            for story in &highlight.items {
                let stem = format!("story_{}", format_capture_date(story.taken_at));
                match self.downloader.materialize(
                    &mut self.ledger,
                    MediaCategory::Highlights,
                    &story.media,
                    &dest_dir,
                    &stem,
                ) {
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!(id = %story.media.id, "Failed to download highlight story: {}", e)
                    }
                }
                progress.inc(1);
            }
            progress.finish_and_clear();
        }

        Ok(())
    }

    /// All followers merged across pages.
    pub fn followers(&self, limit: Option<usize>, update: bool) -> Result<Vec<UserSummary>> {
        paginate(&self.store, "followers", limit, update, |cursor| {
            self.pool
                .pick()
                .fetch_followers_page(self.user_id, self.followers_page_size, cursor)
        })
    }

    /// Fetch followers and persist the derived full/short exports.
    pub fn export_followers(&self, limit: Option<usize>, update: bool) -> Result<()> {
        let users = self.followers(limit, update)?;
        self.export_user_list("followers", &users, update)
    }

    /// All followed accounts merged across pages.
    pub fn following(&self, limit: Option<usize>, update: bool) -> Result<Vec<UserSummary>> {
        paginate(&self.store, "following", limit, update, |cursor| {
            self.pool
                .pick()
                .fetch_following_page(self.user_id, self.following_page_size, cursor)
        })
    }

    /// Fetch followed accounts and persist the derived full/short exports.
    pub fn export_following(&self, limit: Option<usize>, update: bool) -> Result<()> {
        let users = self.following(limit, update)?;
        self.export_user_list("following", &users, update)
    }

    fn export_user_list(&self, category: &str, users: &[UserSummary], update: bool) -> Result<()> {
        if !self.store.persist_enabled() {
            return Ok(());
        }

        let full_key = LogicalKey::new(category)?.child(&format!("{}_full", category))?;
        if update || !self.store.exists(&full_key)? {
            self.store.save(&full_key, &UserListExport { users })?;

            let short_key = LogicalKey::new(category)?.child(&format!("{}_short", category))?;
            let refs = UserRefExport {
                users: users
                    .iter()
                    .map(|u| UserRef {
                        username: u.username.clone(),
                        id: u.pk,
                    })
                    .collect(),
            };
            self.store.save(&short_key, &refs)?;
        }

        Ok(())
    }
}

/// Create the account directory tree, including the snapshot mirror.
/// Idempotent.
fn bootstrap_directories(root: &Path) -> Result<()> {
    for dir in CATEGORY_DIRS {
        fs::create_dir_all(root.join(dir))?;
        fs::create_dir_all(root.join("raw").join(dir))?;
    }
    Ok(())
}

/// Human-readable tag for a capture timestamp (seconds since epoch).
fn format_capture_date(taken_at: i64) -> String {
    Local
        .timestamp_opt(taken_at, 0)
        .single()
        .map(|dt| dt.format(DATE_FORMAT).to_string())
        .unwrap_or_else(|| taken_at.to_string())
}

fn batch_progress(len: u64, label: &str) -> ProgressBar {
    let bar = ProgressBar::new(len);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );
    bar.set_message(label.to_string());
    bar
}
