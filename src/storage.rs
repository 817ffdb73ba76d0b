use crate::error::StoreError;
use crate::models::{NewScreenshot, NewUser, Screenshot, ScreenshotFilter, ScreenshotPatch, User};
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;

pub type SharedStorage = Arc<Mutex<MemStorage>>;

/// In-process catalog of screenshots and users.
///
/// Records are keyed by id in a `BTreeMap`; ids only ever grow, so key
/// order is insertion order and listings are deterministic.
#[derive(Debug)]
pub struct MemStorage {
    screenshots: BTreeMap<i64, Screenshot>,
    users: BTreeMap<i64, User>,
    next_screenshot_id: i64,
    next_user_id: i64,
}

impl Default for MemStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemStorage {
    pub fn new() -> Self {
        Self {
            screenshots: BTreeMap::new(),
            users: BTreeMap::new(),
            next_screenshot_id: 1,
            next_user_id: 1,
        }
    }

    /// A store preloaded with the two sample screenshots backed by placeholder assets.
    pub fn with_samples() -> Self {
        let mut storage = Self::new();
        for (data, ai_tags) in sample_screenshots() {
            storage.create_screenshot(data, ai_tags);
        }
        storage
    }

    pub fn into_shared(self) -> SharedStorage {
        Arc::new(Mutex::new(self))
    }

    pub fn create_screenshot(&mut self, data: NewScreenshot, ai_tags: Vec<String>) -> Screenshot {
        let id = self.next_screenshot_id;
        self.next_screenshot_id += 1;

        let screenshot = Screenshot {
            id,
            title: data.title,
            image_path: data.image_path,
            description: normalize_description(data.description),
            app: data.app,
            genre: data.genre,
            screen_task: data.screen_task,
            ui_elements: data.ui_elements,
            tags: data.tags,
            ai_tags,
            uploaded_at: Utc::now(),
        };
        self.screenshots.insert(id, screenshot.clone());
        screenshot
    }

    pub fn get_screenshot(&self, id: i64) -> Option<&Screenshot> {
        self.screenshots.get(&id)
    }

    pub fn get_all_screenshots(&self) -> Vec<Screenshot> {
        self.screenshots.values().cloned().collect()
    }

    pub fn update_screenshot(
        &mut self,
        id: i64,
        patch: ScreenshotPatch,
    ) -> Result<Screenshot, StoreError> {
        let screenshot = self
            .screenshots
            .get_mut(&id)
            .ok_or(StoreError::ScreenshotNotFound(id))?;

        if let Some(title) = patch.title {
            screenshot.title = title;
        }
        if let Some(image_path) = patch.image_path {
            screenshot.image_path = image_path;
        }
        if let Some(description) = patch.description {
            screenshot.description = normalize_description(Some(description));
        }
        if let Some(app) = patch.app {
            screenshot.app = app;
        }
        if let Some(genre) = patch.genre {
            screenshot.genre = genre;
        }
        if let Some(screen_task) = patch.screen_task {
            screenshot.screen_task = screen_task;
        }
        if let Some(ui_elements) = patch.ui_elements {
            screenshot.ui_elements = ui_elements;
        }
        if let Some(tags) = patch.tags {
            screenshot.tags = tags;
        }

        Ok(screenshot.clone())
    }

    /// Removes the record and hands it back so the caller can clean up its image.
    pub fn delete_screenshot(&mut self, id: i64) -> Result<Screenshot, StoreError> {
        self.screenshots
            .remove(&id)
            .ok_or(StoreError::ScreenshotNotFound(id))
    }

    /// Case-insensitive substring match over title, description, app, tags and AI tags.
    pub fn search_screenshots(&self, query: &str) -> Vec<Screenshot> {
        let query = query.to_lowercase();
        let contains = |text: &str| text.to_lowercase().contains(&query);

        self.screenshots
            .values()
            .filter(|s| {
                contains(s.title.as_str())
                    || s.description.as_deref().is_some_and(contains)
                    || contains(s.app.as_str())
                    || s.tags.iter().any(|tag| contains(tag.as_str()))
                    || s.ai_tags.iter().any(|tag| contains(tag.as_str()))
            })
            .cloned()
            .collect()
    }

    /// Every provided dimension must hold. `app`, `genre` and `screen_task`
    /// compare exactly; `ui_elements` and `tags` require all listed values.
    pub fn filter_screenshots(&self, filters: &ScreenshotFilter) -> Vec<Screenshot> {
        self.screenshots
            .values()
            .filter(|s| matches_filter(s, filters))
            .cloned()
            .collect()
    }

    pub fn create_user(&mut self, user: NewUser<'_>) -> User {
        let id = self.next_user_id;
        self.next_user_id += 1;

        let user = User {
            id,
            username: user.username.to_string(),
            password_hash: user.password_hash.to_string(),
            is_admin: user.is_admin,
            created_at: Utc::now(),
        };
        self.users.insert(id, user.clone());
        user
    }

    pub fn get_user(&self, id: i64) -> Option<&User> {
        self.users.get(&id)
    }

    pub fn get_user_by_username(&self, username: &str) -> Option<&User> {
        self.users.values().find(|u| u.username == username)
    }
}

fn normalize_description(description: Option<String>) -> Option<String> {
    description.filter(|d| !d.is_empty())
}

fn matches_filter(screenshot: &Screenshot, filters: &ScreenshotFilter) -> bool {
    let exact = |wanted: &Option<String>, actual: &str| {
        wanted.as_deref().map_or(true, |w| w.is_empty() || w == actual)
    };
    let contains_all = |wanted: &Option<Vec<String>>, actual: &[String]| {
        wanted
            .as_deref()
            .map_or(true, |w| w.iter().all(|item| actual.contains(item)))
    };

    exact(&filters.app, screenshot.app.as_str())
        && exact(&filters.genre, screenshot.genre.as_str())
        && exact(&filters.screen_task, screenshot.screen_task.as_str())
        && contains_all(&filters.ui_elements, screenshot.ui_elements.as_slice())
        && contains_all(&filters.tags, screenshot.tags.as_slice())
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn sample_screenshots() -> Vec<(NewScreenshot, Vec<String>)> {
    vec![
        (
            NewScreenshot {
                title: "Minimalist Dashboard".into(),
                image_path: "/placeholder-dashboard.svg".into(),
                description: Some("Clean dashboard interface with charts and stats".into()),
                app: "Analytics Pro".into(),
                genre: "Business".into(),
                screen_task: "Dashboard".into(),
                ui_elements: strings(&["Chart", "Card", "Navigation"]),
                tags: strings(&["minimal", "dashboard", "analytics"]),
            },
            strings(&["data-visualization", "metrics", "business-intelligence"]),
        ),
        (
            NewScreenshot {
                title: "Social Feed".into(),
                image_path: "/placeholder-feed.svg".into(),
                description: Some("Modern social media feed layout".into()),
                app: "SocialConnect".into(),
                genre: "Social".into(),
                screen_task: "Navigation".into(),
                ui_elements: strings(&["Card", "List"]),
                tags: strings(&["social", "feed", "modern"]),
            },
            strings(&["social-media", "content-feed", "user-engagement"]),
        ),
    ]
}
