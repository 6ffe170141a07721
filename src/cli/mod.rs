pub mod command;
pub mod decode;
pub mod dsd;
pub mod info;
