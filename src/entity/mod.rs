pub mod cart_items;
pub mod cart_merges;
pub mod order_items;
pub mod orders;
pub mod products;
pub mod types;
pub mod users;

pub use cart_items::Entity as CartItems;
pub use cart_merges::Entity as CartMerges;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use products::Entity as Products;
pub use users::Entity as Users;
