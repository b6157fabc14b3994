//! DashMap-backed implementation of the record store

use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

use crate::store::{GenerationRecord, NewGeneration, NewUser, Store, User};

/// In-memory store; no persistence across restarts, no eviction
#[derive(Default)]
pub struct MemStore {
    generations: DashMap<Uuid, GenerationRecord>,
    users: DashMap<Uuid, User>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemStore {
    fn create_generation(&self, new: NewGeneration) -> GenerationRecord {
        let record = GenerationRecord {
            id: Uuid::new_v4(),
            main_photo: new.main_photo,
            prop1: new.prop1,
            prop2: new.prop2,
            prompt: new.prompt,
            num_variations: new.num_variations,
            aspect_ratio: new.aspect_ratio,
            generated_images: Vec::new(),
            created_at: Utc::now(),
        };
        self.generations.insert(record.id, record.clone());
        record
    }

    fn get_generation(&self, id: Uuid) -> Option<GenerationRecord> {
        self.generations.get(&id).map(|r| r.clone())
    }

    fn update_results(&self, id: Uuid, generated_images: Vec<String>) -> Option<GenerationRecord> {
        let mut record = self.generations.get_mut(&id)?;
        record.generated_images = generated_images;
        Some(record.clone())
    }

    fn create_user(&self, new: NewUser) -> User {
        let user = User {
            id: Uuid::new_v4(),
            username: new.username,
            password: new.password,
        };
        self.users.insert(user.id, user.clone());
        user
    }

    fn get_user(&self, id: Uuid) -> Option<User> {
        self.users.get(&id).map(|u| u.clone())
    }

    fn get_user_by_username(&self, username: &str) -> Option<User> {
        self.users
            .iter()
            .find(|u| u.username == username)
            .map(|u| u.clone())
    }
}
