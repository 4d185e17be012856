pub mod review_logs;
