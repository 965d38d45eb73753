pub mod config;
pub mod contract;
pub mod types;

pub use config::{Config, HomepageMode, Settings, SettingsProvider};
pub use contract::{DataContract, Fragment, Pagination, SiteFragment};
pub use types::{
    Author, ContentRecord, ContentStatus, ContentType, ListFilter, Media, SortOrder, TaxonomyKind, Term,
    TermCount,
};
