//! Section renderers for the storefront home page.

mod category_cards;
mod error_page;
mod featured_products;
mod footer;
mod hero;
mod newsletter;
mod preloader;

pub use category_cards::*;
pub use error_page::*;
pub use featured_products::*;
pub use footer::*;
pub use hero::*;
pub use newsletter::*;
pub use preloader::*;
