mod change;
mod locales;
mod names;
mod tree;

pub use change::Change;
pub use locales::parse_locales;
pub use names::Locale;
pub use names::TreeName;
pub use tree::Tree;
pub use tree::TreeBranches;
