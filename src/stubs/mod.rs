pub mod process_tree;
