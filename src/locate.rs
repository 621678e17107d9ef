use crate::session::{ObjectKind, WorldObject, CONTROLLED_ID};

/// Finds the object instance of interest in one snapshot object list.
///
/// The player lookup pins the reserved controlled id so that other player
/// entities in the same list never shadow the analyzed client. Any other kind
/// resolves to the first instance in list order. Absence is a normal outcome,
/// not an error.
pub fn locate(objects: &[WorldObject], kind: ObjectKind) -> Option<&WorldObject> {
    match kind {
        ObjectKind::Player => objects
            .iter()
            .find(|o| o.kind == ObjectKind::Player && o.id == CONTROLLED_ID),
        other => objects.iter().find(|o| o.kind == other),
    }
}
