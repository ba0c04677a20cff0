//! Working set of attachments for the task being composed or edited.

use crate::error::{Error, Result};
use crate::task::Attachment;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttachmentStaging {
    items: Vec<Attachment>,
}

impl AttachmentStaging {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `file` unless an entry with the same (name, size) is staged.
    pub fn add(&mut self, file: Attachment) -> Result<()> {
        if self.items.iter().any(|existing| existing.same_file(&file)) {
            return Err(Error::DuplicateAttachment {
                name: file.name,
                size: file.size,
            });
        }
        self.items.push(file);
        Ok(())
    }

    pub fn remove(&mut self, position: usize) -> Result<Attachment> {
        if position >= self.items.len() {
            return Err(Error::IndexOutOfRange {
                index: position,
                len: self.items.len(),
            });
        }
        Ok(self.items.remove(position))
    }

    /// Remove every staged entry called `name`; returns how many went.
    pub fn remove_named(&mut self, name: &str) -> usize {
        let before = self.items.len();
        self.items.retain(|item| item.name != name);
        before - self.items.len()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Replace the working set wholesale, e.g. when an edit begins.
    pub fn seed(&mut self, existing: &[Attachment]) {
        self.items = existing.to_vec();
    }

    /// Copy handed to the store on a successful submission
    pub fn snapshot(&self) -> Vec<Attachment> {
        self.items.clone()
    }

    pub fn items(&self) -> &[Attachment] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_name_and_size_rejected() {
        let mut staging = AttachmentStaging::new();
        staging.add(Attachment::new("a.txt", 10)).unwrap();

        let err = staging.add(Attachment::new("a.txt", 10)).unwrap_err();
        assert!(matches!(err, Error::DuplicateAttachment { ref name, size: 10 } if name == "a.txt"));
        assert_eq!(staging.len(), 1);

        // same name, different size is a different file
        staging.add(Attachment::new("a.txt", 11)).unwrap();
        staging.add(Attachment::new("b.txt", 10)).unwrap();
        assert_eq!(staging.len(), 3);
    }

    #[test]
    fn remove_by_position() {
        let mut staging = AttachmentStaging::new();
        staging.add(Attachment::new("a", 1)).unwrap();
        staging.add(Attachment::new("b", 2)).unwrap();

        let removed = staging.remove(0).unwrap();
        assert_eq!(removed.name, "a");
        assert_eq!(staging.items()[0].name, "b");

        let err = staging.remove(5).unwrap_err();
        assert!(matches!(err, Error::IndexOutOfRange { index: 5, len: 1 }));
    }

    #[test]
    fn snapshot_is_decoupled() {
        let mut staging = AttachmentStaging::new();
        staging.add(Attachment::new("a", 1)).unwrap();
        let saved = staging.snapshot();

        staging.clear();
        assert!(staging.is_empty());
        assert_eq!(saved.len(), 1);
    }

    #[test]
    fn seed_replaces_and_remove_named() {
        let mut staging = AttachmentStaging::new();
        staging.add(Attachment::new("old", 1)).unwrap();
        staging.seed(&[Attachment::new("x", 1), Attachment::new("y", 2)]);
        assert_eq!(staging.len(), 2);

        assert_eq!(staging.remove_named("x"), 1);
        assert_eq!(staging.remove_named("x"), 0);
        assert_eq!(staging.items(), &[Attachment::new("y", 2)]);
    }
}
