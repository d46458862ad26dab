//! Timer id generation

use uuid::Uuid;

/// Prefix shared by every generated timer id
pub const ID_PREFIX: &str = "tm-";

const ID_SUFFIX_LEN: usize = 6;

/// Generate a short, random timer id such as `tm-3f9a1c`.
///
/// Ids are not guaranteed unique; the record store rejects collisions.
pub fn generate_unique_id() -> String {
    let raw = Uuid::new_v4().simple().to_string();
    format!("{}{}", ID_PREFIX, &raw[..ID_SUFFIX_LEN])
}
