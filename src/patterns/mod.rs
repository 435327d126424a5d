mod key;
pub use key::*;

mod record;
pub use record::*;
