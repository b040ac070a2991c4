pub mod open_library;
