pub mod bookmark_parser;
