pub mod cron;
pub mod products;
