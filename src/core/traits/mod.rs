pub mod builder;
pub mod process_tree;
pub mod supervisor;
