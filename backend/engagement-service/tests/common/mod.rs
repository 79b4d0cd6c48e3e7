//! Shared builders for the integration tests

#![allow(dead_code)]

use chrono::{DateTime, Duration, Utc};
use engagement_service::domain::models::{Comment, Post, User, Video};
use uuid::Uuid;

pub fn at(minutes: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap() + Duration::minutes(minutes)
}

pub fn user(username: &str) -> User {
    User {
        id: Uuid::new_v4(),
        username: username.to_string(),
        full_name: format!("{} full", username),
        avatar: format!("https://cdn.test/{}.png", username),
        email: format!("{}@example.com", username),
        cover_image: None,
        created_at: at(0),
    }
}

pub fn video(owner_id: Uuid, title: &str, minutes: i64) -> Video {
    Video {
        id: Uuid::new_v4(),
        owner_id,
        title: title.to_string(),
        description: format!("about {}", title),
        video_file: format!("https://cdn.test/{}.mp4", title),
        thumbnail: format!("https://cdn.test/{}.jpg", title),
        duration: 42.0,
        views: 0,
        is_published: true,
        created_at: at(minutes),
        updated_at: at(minutes),
    }
}

pub fn comment(video_id: Uuid, owner_id: Uuid, minutes: i64) -> Comment {
    Comment {
        id: Uuid::new_v4(),
        video_id,
        owner_id,
        content: format!("comment {}", minutes),
        created_at: at(minutes),
        updated_at: at(minutes),
    }
}

pub fn post(owner_id: Uuid, minutes: i64) -> Post {
    Post {
        id: Uuid::new_v4(),
        owner_id,
        content: format!("post {}", minutes),
        created_at: at(minutes),
        updated_at: at(minutes),
    }
}
