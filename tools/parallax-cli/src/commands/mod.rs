pub mod check;
pub mod info;
pub mod replay;
pub mod serve;
pub mod upload;
