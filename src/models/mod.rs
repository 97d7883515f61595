pub mod notification;
pub mod product;

pub use notification::*;
pub use product::*;
