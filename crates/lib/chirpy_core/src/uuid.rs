// Helper for generating UUIDv7 (timestamp-sortable UUIDs).
//
// Session rows get app-side UUIDv7 ids so they sort by creation time.
// Users keep PG's gen_random_uuid() (v4); their order carries no meaning.

use uuid::Uuid;

/// Generate a new UUIDv7 (timestamp-sortable).
pub fn uuidv7() -> Uuid {
    Uuid::now_v7()
}
