mod abstention_tests;
mod engine_tests;
mod support;
