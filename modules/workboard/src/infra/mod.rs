pub mod mail;
pub mod password;
pub mod storage;
