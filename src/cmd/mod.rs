pub mod locate;
pub mod match_title;
pub mod output;
pub mod resolve;
pub mod streams;
