mod round_trip_test;
mod save_failure_test;
mod write_order_test;
