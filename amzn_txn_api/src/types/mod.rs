mod order;
pub use self::order::{
    orders_from_json, orders_to_json, OrderDetails, OrderItem, OrderLink, ScrapedOrder,
};
