pub mod health;
pub use self::health::health;

pub mod select_bank;
pub use self::select_bank::select_bank;

pub mod retrieve_tokens;
pub use self::retrieve_tokens::retrieve_tokens;

pub mod restricted_items;
pub use self::restricted_items::restricted_items;

pub mod set_cart_id;
pub use self::set_cart_id::set_cart_id;
