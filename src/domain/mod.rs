// ============================================================================
// Domain Layer
// ============================================================================
//
// Pure, I/O-free logic: rebuilding customer snapshots from record images,
// diffing their channel claims and describing the differences as events.
//
// ============================================================================

pub mod customer;
