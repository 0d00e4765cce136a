mod common;
mod concurrency;
mod projection;
