mod order_number;

pub use order_number::{OrderNumberGenerator, DEFAULT_ORDER_PREFIX};
