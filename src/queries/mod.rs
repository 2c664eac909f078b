pub mod work_order_queries;
