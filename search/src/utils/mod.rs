pub mod see;
