use std::ops::Deref;
use std::path::PathBuf;

use uuid::Uuid;

use crate::app::{App, CreateCollection, CreateEvent, CreateTask};
use crate::domain::CollectionType;

/// A journal backed by a throwaway SQLite file, removed on drop.
pub(crate) struct TempJournal {
    app: Option<App>,
    root: PathBuf,
}

impl TempJournal {
    pub(crate) fn new() -> Self {
        let root = std::env::temp_dir().join(format!("jrnl-test-{}", Uuid::now_v7()));
        std::fs::create_dir_all(&root).expect("temp dir should be creatable");
        let db_path = root.join("journal.sqlite");
        let app = App::open(&db_path.to_string_lossy()).expect("app should open");
        Self {
            app: Some(app),
            root,
        }
    }

    pub(crate) fn db_path(&self) -> String {
        self.root.join("journal.sqlite").display().to_string()
    }

    pub(crate) fn seed_task(&self, title: &str) -> i64 {
        self.create_task(&CreateTask {
            title: title.to_string(),
            ..Default::default()
        })
        .expect("seed task should be created")
        .id
    }

    pub(crate) fn seed_event(&self, title: &str) -> i64 {
        self.create_event(&CreateEvent {
            title: title.to_string(),
            ..Default::default()
        })
        .expect("seed event should be created")
        .id
    }

    pub(crate) fn seed_collection(&self, title: &str) -> i64 {
        self.create_collection(&CreateCollection {
            title: title.to_string(),
            collection_type: CollectionType::Project,
            ..Default::default()
        })
        .expect("seed collection should be created")
        .id
    }
}

impl Deref for TempJournal {
    type Target = App;

    fn deref(&self) -> &App {
        self.app.as_ref().expect("app is present until drop")
    }
}

impl Drop for TempJournal {
    fn drop(&mut self) {
        drop(self.app.take());
        let _ = std::fs::remove_dir_all(&self.root);
    }
}
