use std::{cell::RefCell, collections::HashMap, rc::Rc};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::{prelude::*, source::Fetch};

/// In-memory data root which records every fetch and can hold fetches until released.
#[derive(Default)]
pub struct FakeSource {
    files: RefCell<HashMap<String, String>>,
    fetched: RefCell<Vec<String>>,
    gate: Option<Rc<Notify>>,
}

impl FakeSource {
    pub fn with_file(self, path: &str, text: &str) -> Self {
        self.put(path, text);
        self
    }

    /// Make every fetch wait for [`Notify::notify_one`] on the gate.
    pub fn with_gate(mut self, gate: Rc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn put(&self, path: &str, text: &str) {
        self.files.borrow_mut().insert(path.to_owned(), text.to_owned());
    }

    pub fn remove(&self, path: &str) {
        self.files.borrow_mut().remove(path);
    }

    pub fn n_fetches(&self, path: &str) -> usize {
        self.fetched.borrow().iter().filter(|fetched| *fetched == path).count()
    }
}

#[async_trait(?Send)]
impl Fetch for FakeSource {
    async fn fetch_text(&self, path: &str) -> Result<String> {
        self.fetched.borrow_mut().push(path.to_owned());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.files.borrow().get(path).cloned().with_context(|| format!("`{path}` is not found"))
    }
}

#[async_trait(?Send)]
impl Fetch for Rc<FakeSource> {
    async fn fetch_text(&self, path: &str) -> Result<String> {
        self.as_ref().fetch_text(path).await
    }
}
