use chrono::{DateTime, Utc};
use serde::Serialize;

pub const GENRES: &[&str] = &[
    "Business",
    "Social",
    "E-commerce",
    "Finance",
    "Entertainment",
    "Productivity",
];

pub const SCREEN_TASKS: &[&str] = &[
    "Onboarding",
    "Authentication",
    "Dashboard",
    "Settings",
    "Profile",
    "Search",
    "Navigation",
];

pub const UI_ELEMENTS: &[&str] = &[
    "Button",
    "Card",
    "Form",
    "Modal",
    "Navigation",
    "Chart",
    "Table",
    "List",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Screenshot {
    pub id: i64,
    pub title: String,
    pub image_path: String,
    pub description: Option<String>,
    pub app: String,
    pub genre: String,
    pub screen_task: String,
    pub ui_elements: Vec<String>,
    pub tags: Vec<String>,
    pub ai_tags: Vec<String>,
    pub uploaded_at: DateTime<Utc>,
}

/// Validated insert payload. The store assigns `id` and `uploaded_at`;
/// AI tags travel separately because they are produced after validation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewScreenshot {
    pub title: String,
    pub image_path: String,
    pub description: Option<String>,
    pub app: String,
    pub genre: String,
    pub screen_task: String,
    pub ui_elements: Vec<String>,
    pub tags: Vec<String>,
}

/// Partial update. `None` keeps the stored value; list fields replace wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScreenshotPatch {
    pub title: Option<String>,
    pub image_path: Option<String>,
    pub description: Option<String>,
    pub app: Option<String>,
    pub genre: Option<String>,
    pub screen_task: Option<String>,
    pub ui_elements: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScreenshotFilter {
    pub app: Option<String>,
    pub genre: Option<String>,
    pub screen_task: Option<String>,
    pub ui_elements: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub password_hash: &'a str,
    pub is_admin: bool,
}

/// What the client sees of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: i64,
    pub username: String,
    pub is_admin: bool,
}

impl SessionUser {
    /// Stand-in user reported while authentication is disabled.
    pub fn guest_admin() -> Self {
        Self {
            id: 1,
            username: "user".to_string(),
            is_admin: true,
        }
    }
}

impl From<&User> for SessionUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            is_admin: user.is_admin,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogOptions {
    pub genres: &'static [&'static str],
    pub screen_tasks: &'static [&'static str],
    pub ui_elements: &'static [&'static str],
}

impl Default for CatalogOptions {
    fn default() -> Self {
        Self {
            genres: GENRES,
            screen_tasks: SCREEN_TASKS,
            ui_elements: UI_ELEMENTS,
        }
    }
}
