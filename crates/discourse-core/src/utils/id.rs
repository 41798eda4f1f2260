/// Generate a short URL-friendly id for canvas shapes and in-memory documents.
///
/// Returns a 21-character string from the nanoid default alphabet.
pub fn generate_id() -> String {
    nanoid::nanoid!()
}

/// Generate a node instance id (written to frontmatter of new node documents)
pub fn generate_instance_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
