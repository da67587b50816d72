/// The board engine
///
/// This module owns every write that assigns a position:
///
/// - `ordering`: create issues, move them between status columns, and apply
///   full-column reorders, preserving the per-column position invariant
/// - `subtasks`: one-level parent/child hierarchy with sibling-scoped
///   positions, progress roll-up, and cascading delete
///
/// Writers serialize per project by taking a row lock on the project record
/// inside their transaction, so two concurrent reorders of the same column
/// apply one after the other and never interleave position updates.
pub mod ordering;
pub mod subtasks;
