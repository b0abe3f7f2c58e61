pub mod mock;

mod api_tests;
mod transform_tests;
