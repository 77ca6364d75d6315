use serde::{Deserialize, Serialize};

use crate::{Timestamp, Validate, double_option};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: u32,
    pub username: String,
    pub email: String,
    pub name: String,
    pub bio: Option<String>,
    pub avatar: Option<String>,
    pub created_at: Timestamp,
}

impl User {
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            name: self.name.clone(),
            avatar: self.avatar.clone(),
        }
    }
}

/// Author details attached to a review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: u32,
    pub name: String,
    pub avatar: Option<String>,
}

impl UserSummary {
    /// Placeholder for a review whose author record is gone.
    pub fn unknown() -> Self {
        Self {
            id: 0,
            name: "Unknown User".to_string(),
            avatar: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
}

impl NewUser {
    pub fn into_user(self, id: u32, created_at: Timestamp) -> User {
        User {
            id,
            username: self.username,
            email: self.email,
            name: self.name,
            bio: self.bio,
            avatar: self.avatar,
            created_at,
        }
    }
}

impl Validate for NewUser {}

/// Partial profile edit. `bio` and `avatar` accept an explicit `null` to clear them.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub bio: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub avatar: Option<Option<String>>,
}

impl UserUpdate {
    pub fn apply(self, user: &mut User) {
        if let Some(username) = self.username {
            user.username = username;
        }
        if let Some(email) = self.email {
            user.email = email;
        }
        if let Some(name) = self.name {
            user.name = name;
        }
        if let Some(bio) = self.bio {
            user.bio = bio;
        }
        if let Some(avatar) = self.avatar {
            user.avatar = avatar;
        }
    }
}

impl Validate for UserUpdate {}
