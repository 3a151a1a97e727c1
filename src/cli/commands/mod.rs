pub mod get;
pub mod init;
pub mod keygen;
pub mod list;
pub mod mode;
pub mod repair;
pub mod rotate;
pub mod set_mode;
pub mod status;
pub mod store;
