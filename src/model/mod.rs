//! Domain records as the API exposes them
//!
//! Storage adapters convert to and from these; handlers never see a
//! database document.

pub mod application;
pub mod collaboration;
pub mod collaborator;
pub mod essay;
pub mod history;
pub mod invitation;

pub use application::{Application, ApplicationPatch, ApplicationView, NewApplication};
pub use collaboration::{Collaboration, CollaborationFilter};
pub use collaborator::{Collaborator, CollaboratorPatch, NewCollaborator, Relationship};
pub use essay::{Essay, EssayPatch, NewEssay};
pub use history::HistoryEntry;
pub use invitation::{DeliveryStatus, Invitation};

use serde::{Deserialize, Deserializer};

/// Fresh record id (ObjectId hex, so MongoDB can index it natively)
pub fn new_id() -> String {
    bson::oid::ObjectId::new().to_hex()
}

/// Deserialize a patch field so that an absent key stays `None` while an
/// explicit `null` becomes `Some(None)`.
///
/// Use together with `#[serde(default)]`.
pub fn present<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "present")]
        notes: Option<Option<String>>,
    }

    #[test]
    fn test_present_distinguishes_null_from_absent() {
        let absent: Patch = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.notes, None);

        let null: Patch = serde_json::from_str(r#"{"notes": null}"#).unwrap();
        assert_eq!(null.notes, Some(None));

        let set: Patch = serde_json::from_str(r#"{"notes": "hi"}"#).unwrap();
        assert_eq!(set.notes, Some(Some("hi".to_string())));
    }

    #[test]
    fn test_new_id_is_object_id_hex() {
        let id = new_id();
        assert_eq!(id.len(), 24);
        assert!(bson::oid::ObjectId::parse_str(&id).is_ok());
    }
}
