pub mod affiliate;
pub mod client;
pub mod error;
pub mod normalize;
pub mod parse;
pub mod types;

pub use affiliate::{affiliate_link, AffiliateLink, AffiliateSettings};
pub use client::AliExpressClient;
pub use error::SupplierError;
pub use normalize::normalize_product;
pub use types::{ProductDetailEnvelope, RawSupplierProduct, SupplierProductEntry};
