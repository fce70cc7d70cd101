pub mod fix_imports;
pub mod migrate;
pub mod report;

pub use fix_imports::fix_imports;
pub use migrate::migrate;
pub use report::report;
