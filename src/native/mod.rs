/// Implementations of the core traits on top of real processes, the OS
/// process table and the filesystem.
pub mod builder;
pub mod prerequisites;
pub mod process_tree;
pub mod supervisor;
