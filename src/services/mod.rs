pub mod autosave;
pub mod editor;
pub mod history;
pub mod layout;
pub mod notice;
pub mod preview;
pub mod publisher;
pub mod studio;
