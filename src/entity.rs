pub mod friendship;
