pub mod archive;
pub mod assembly;
pub mod dispatcher;
pub mod error;
pub mod loader;
pub mod lookup;
pub mod server;
pub mod site;

pub use archive::ArchiveBuilder;
pub use dispatcher::Dispatcher;
pub use error::RouterError;
pub use loader::load_site_content;
pub use lookup::{ContentLookup, MemoryStore};
pub use server::Server;
pub use site::Site;
