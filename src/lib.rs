pub mod adapter;
pub mod buffer;
pub mod capture;
pub mod config;
pub mod decode;
pub mod defrag;
pub mod dump;
pub mod error;
pub mod flow;
pub mod packet;
pub mod replay;
pub mod session;
