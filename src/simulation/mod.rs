pub mod book_generator;
