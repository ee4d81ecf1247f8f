//! Unit tests, one module per engine area.

mod limit_order_test;
mod tick_bitmap_test;
mod tick_test;
