//! Test models shared by the unit tests.

use std::sync::Mutex;

use crate::handle::Handle;
use crate::model::Model;

#[derive(Debug, Default)]
pub(crate) struct Author {
    pub id: i64,
    pub name: String,
    display_name: Mutex<Option<String>>,
    pub handle: Handle,
}

impl Author {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn rename(&self, display_name: &str) {
        *self.display_name.lock().unwrap() = Some(display_name.to_string());
    }

    pub fn current_name(&self) -> String {
        self.display_name
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| self.name.clone())
    }
}

impl Clone for Author {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            name: self.name.clone(),
            display_name: Mutex::new(self.display_name.lock().unwrap().clone()),
            handle: self.handle.clone(),
        }
    }
}

impl Model for Author {
    fn handle(&self) -> &Handle {
        &self.handle
    }
}

#[derive(Debug, Default)]
pub(crate) struct Book {
    pub id: i64,
    pub author_id: Option<i64>,
    pub title: String,
    pub handle: Handle,
}

impl Book {
    pub fn new(id: i64, author_id: i64, title: impl Into<String>) -> Self {
        Self {
            id,
            author_id: Some(author_id),
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn orphan(id: i64, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            ..Default::default()
        }
    }
}

impl Model for Book {
    fn handle(&self) -> &Handle {
        &self.handle
    }
}
