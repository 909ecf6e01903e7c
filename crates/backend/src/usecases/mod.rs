pub mod u508_fill_order_template;
