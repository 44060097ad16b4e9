#![forbid(unsafe_code)]

pub mod catalog;
pub mod cli;
pub mod covers;
pub mod generate;
pub mod google_books;
pub mod http;
pub mod logging;
pub mod openai;
pub mod retag;
