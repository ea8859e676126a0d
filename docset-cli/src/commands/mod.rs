//! CLI command implementations.

pub mod build;
pub mod dev;
pub mod doc;
pub mod init;
pub mod verify;

pub use build::build_site;
pub use dev::dev_server;
pub use doc::show_doc;
pub use init::init_project;
pub use verify::verify_site;
