//! Shared traits for records held in the document store.

/// Exposes the store-assigned identifier for persisted entities.
///
/// The identifier is absent until the record has been written once.
pub trait Identifiable {
    fn id(&self) -> Option<&str>;
}

/// Associates a record with its owning user.
pub trait OwnedByUser {
    fn user_id(&self) -> &str;
}

/// Converts an entity into a user-facing display label.
pub trait Displayable {
    fn display_label(&self) -> String;
}
